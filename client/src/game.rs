//! Client-side state reconciliation and visual interpolation
//!
//! The client never simulates physics. Each incoming snapshot updates a
//! per-entity interpolation target; each render frame moves the displayed
//! position a fixed fraction of the remaining distance toward that target.
//! Large divergences (dropped snapshot runs, teleports) are snapped instead
//! of smoothed.

use log::debug;
use shared::{Ball, Player, Scores, LERP_FACTOR, SNAP_THRESHOLD};
use std::collections::HashMap;

/// Interpolation state of a remotely-owned entity. `Uninitialized` means no
/// authoritative position has been seen yet, so the first one is adopted
/// verbatim instead of slid into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Uninitialized,
    Tracking { x: f32, y: f32 },
}

/// Notifications raised toward the presentation layer; the engine never
/// blocks on their handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEvent {
    /// The authoritative scores changed; show the goal banner, play the horn.
    Goal,
}

#[derive(Debug, Clone)]
pub struct ViewPlayer {
    pub player: Player,
    pub target: Target,
}

#[derive(Debug, Clone)]
pub struct ViewBall {
    pub ball: Ball,
    pub target: Target,
}

/// The client's local, smoothed copy of the match state.
pub struct ClientView {
    pub players: HashMap<String, ViewPlayer>,
    pub ball: ViewBall,
    pub scores: Scores,
}

impl ClientView {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            ball: ViewBall {
                ball: Ball::default(),
                target: Target::Uninitialized,
            },
            scores: Scores::default(),
        }
    }

    /// Merges one authoritative snapshot into the local view.
    ///
    /// Ids known locally but absent from the snapshot are left in place;
    /// departure is signalled through [`ClientView::remove_player`] by the
    /// roster layer, never inferred from snapshot absence.
    pub fn apply_snapshot(
        &mut self,
        players: HashMap<String, Player>,
        ball: Ball,
        scores: Scores,
    ) -> Vec<ViewEvent> {
        let mut events = Vec::new();

        if scores != self.scores {
            self.scores = scores;
            events.push(ViewEvent::Goal);
        }

        // First snapshot adopts the ball position outright; afterwards only
        // the target moves and the render loop eases toward it.
        if self.ball.target == Target::Uninitialized {
            self.ball.ball = ball;
        }
        self.ball.target = Target::Tracking {
            x: ball.x,
            y: ball.y,
        };

        for (id, incoming) in players {
            match self.players.get_mut(&id) {
                None => {
                    // Unseen player: insert verbatim, no slide-in.
                    let x = incoming.x;
                    let y = incoming.y;
                    self.players.insert(
                        id,
                        ViewPlayer {
                            player: incoming,
                            target: Target::Tracking { x, y },
                        },
                    );
                }
                Some(view) => {
                    let p = &mut view.player;
                    if (p.x - incoming.x).abs() > SNAP_THRESHOLD
                        || (p.y - incoming.y).abs() > SNAP_THRESHOLD
                    {
                        debug!(
                            "Snapping player {} from ({:.1}, {:.1}) to ({:.1}, {:.1})",
                            id, p.x, p.y, incoming.x, incoming.y
                        );
                        p.x = incoming.x;
                        p.y = incoming.y;
                    }
                    view.target = Target::Tracking {
                        x: incoming.x,
                        y: incoming.y,
                    };
                    p.name = incoming.name;
                    p.inputs = incoming.inputs;
                    p.team = incoming.team;
                    p.can_shoot = incoming.can_shoot;
                }
            }
        }

        events
    }

    /// Explicit departure notification from the roster layer.
    pub fn remove_player(&mut self, id: &str) {
        self.players.remove(id);
    }

    /// One render frame worth of exponential smoothing: every tracked entity
    /// closes a fixed fraction of the gap to its target. Runs per display
    /// refresh, independent of snapshot arrival rate.
    pub fn interpolate(&mut self) {
        for view in self.players.values_mut() {
            if let Target::Tracking { x, y } = view.target {
                view.player.x += (x - view.player.x) * LERP_FACTOR;
                view.player.y += (y - view.player.y) * LERP_FACTOR;
            }
        }
        if let Target::Tracking { x, y } = self.ball.target {
            self.ball.ball.x += (x - self.ball.ball.x) * LERP_FACTOR;
            self.ball.ball.y += (y - self.ball.ball.y) * LERP_FACTOR;
        }
    }
}

impl Default for ClientView {
    fn default() -> Self {
        Self::new()
    }
}
