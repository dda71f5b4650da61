//! Authoritative session state and the fixed-tick physics step
//!
//! The host owns the canonical players, ball and scores. `Session::step`
//! advances the whole simulation exactly one 1/60 s tick: input-driven
//! acceleration, drag, integration, boundary clamping, kicks, ball/player
//! collision, ball movement and goal detection. Clients never run this code;
//! they only interpolate toward the snapshots it produces.

use log::info;
use shared::{
    Ball, InputFlags, Player, Scores, Team, BALL_FRICTION, FIELD_HEIGHT, FIELD_WIDTH, KICK_REACH,
    PLAYER_ACCEL, PLAYER_DRAG, PLAYER_RADIUS, SHOOT_COOLDOWN_MS, SHOOT_FORCE, TOUCH_FORCE,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One-way notifications raised by the physics step, consumed by the
/// broadcast loop (goals force an out-of-cadence snapshot) and by whatever
/// presentation layer cares about sound triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// The ball was kicked or firmly touched; "play kick sound".
    Kick,
    /// A team scored. The session has already been reset when this is seen.
    Goal { team: Team },
}

/// The root aggregate owned by the host process.
///
/// Shot cooldowns are kept as `(player_id, deadline)` pairs checked once per
/// tick rather than as detached timers, so a deadline for a player that has
/// since disconnected is simply skipped.
#[derive(Debug)]
pub struct Session {
    pub players: HashMap<String, Player>,
    pub ball: Ball,
    pub scores: Scores,
    cooldowns: Vec<(String, Instant)>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            ball: Ball::default(),
            scores: Scores::default(),
            cooldowns: Vec::new(),
        }
    }

    /// Inserts a player at their team's spawn point. Inserting an id that is
    /// already present overwrites the existing entity in place.
    pub fn add_player(&mut self, id: &str, name: &str, team: Team) {
        let player = Player::new(id, name, team);
        info!(
            "Added player {} ({:?}) at ({}, {})",
            id, team, player.x, player.y
        );
        self.players.insert(id.to_string(), player);
    }

    pub fn remove_player(&mut self, id: &str) {
        if self.players.remove(id).is_some() {
            info!("Removed player {}", id);
        }
    }

    pub fn set_player_name(&mut self, id: &str, name: &str) {
        if let Some(player) = self.players.get_mut(id) {
            player.name = name.to_string();
        }
    }

    /// Overwrites a player's held-input snapshot. Last write wins; input for
    /// an unknown id is dropped without error.
    pub fn apply_input(&mut self, id: &str, flags: InputFlags) {
        if let Some(player) = self.players.get_mut(id) {
            player.inputs = flags;
        }
    }

    /// Picks the team with fewer members for a joining player.
    pub fn assign_team(&self) -> Team {
        let reds = self
            .players
            .values()
            .filter(|p| p.team == Team::Red)
            .count();
        let blues = self.players.len() - reds;
        if reds <= blues {
            Team::Red
        } else {
            Team::Blue
        }
    }

    /// Advances the simulation by exactly one tick. `now` is only consulted
    /// for shot-cooldown deadlines; the step size itself is fixed.
    pub fn step(&mut self, now: Instant) -> Vec<SimEvent> {
        let mut events = Vec::new();

        self.release_cooldowns(now);

        // Work on a local copy of the ball so each player borrow stays
        // disjoint from it; written back before wall handling below.
        let mut ball = self.ball;

        for player in self.players.values_mut() {
            // Opposing flags both held cancel out; each is applied unconditionally.
            if player.inputs.up {
                player.vy -= PLAYER_ACCEL;
            }
            if player.inputs.down {
                player.vy += PLAYER_ACCEL;
            }
            if player.inputs.left {
                player.vx -= PLAYER_ACCEL;
            }
            if player.inputs.right {
                player.vx += PLAYER_ACCEL;
            }

            player.vx *= PLAYER_DRAG;
            player.vy *= PLAYER_DRAG;
            player.x += player.vx;
            player.y += player.vy;

            // Walls clamp position only; velocity bleeds off through drag.
            player.x = player.x.clamp(PLAYER_RADIUS, FIELD_WIDTH - PLAYER_RADIUS);
            player.y = player.y.clamp(PLAYER_RADIUS, FIELD_HEIGHT - PLAYER_RADIUS);

            let dx = ball.x - player.x;
            let dy = ball.y - player.y;
            let dist = (dx * dx + dy * dy).sqrt();

            if player.inputs.action
                && player.can_shoot
                && dist < PLAYER_RADIUS + ball.radius + KICK_REACH
            {
                let angle = dy.atan2(dx);
                ball.vx += angle.cos() * SHOOT_FORCE;
                ball.vy += angle.sin() * SHOOT_FORCE;

                player.can_shoot = false;
                self.cooldowns.push((
                    player.id.clone(),
                    now + Duration::from_millis(SHOOT_COOLDOWN_MS),
                ));
                events.push(SimEvent::Kick);
            }

            // Touch collision is checked independently of the shot above, so
            // a kick and a push-out can both land in the same tick.
            if dist < PLAYER_RADIUS + ball.radius {
                let angle = dy.atan2(dx);
                let overlap = (PLAYER_RADIUS + ball.radius) - dist;
                ball.x += angle.cos() * overlap;
                ball.y += angle.sin() * overlap;
                ball.vx += angle.cos() * TOUCH_FORCE;
                ball.vy += angle.sin() * TOUCH_FORCE;

                // Soft contact noise on roughly one touch in five.
                if rand::random::<f32>() > 0.8 {
                    events.push(SimEvent::Kick);
                }
            }
        }

        ball.x += ball.vx;
        ball.y += ball.vy;
        ball.vx *= BALL_FRICTION;
        ball.vy *= BALL_FRICTION;

        if ball.y < ball.radius || ball.y > FIELD_HEIGHT - ball.radius {
            ball.vy = -ball.vy;
            ball.y = ball.y.clamp(ball.radius, FIELD_HEIGHT - ball.radius);
        }

        let mut goal = None;
        if ball.x < ball.radius + 2.0 {
            if Ball::in_goal_mouth(ball.y) {
                goal = Some(Team::Blue);
            } else {
                ball.vx = -ball.vx;
                ball.x = ball.radius + 2.0;
            }
        } else if ball.x > FIELD_WIDTH - ball.radius - 2.0 {
            if Ball::in_goal_mouth(ball.y) {
                goal = Some(Team::Red);
            } else {
                ball.vx = -ball.vx;
                ball.x = FIELD_WIDTH - ball.radius - 2.0;
            }
        }

        self.ball = ball;

        if let Some(team) = goal {
            self.score(team);
            events.push(SimEvent::Goal { team });
        }

        events
    }

    fn release_cooldowns(&mut self, now: Instant) {
        let mut expired = Vec::new();
        self.cooldowns.retain(|(id, deadline)| {
            if *deadline <= now {
                expired.push(id.clone());
                false
            } else {
                true
            }
        });
        for id in expired {
            if let Some(player) = self.players.get_mut(&id) {
                player.can_shoot = true;
            }
        }
    }

    fn score(&mut self, team: Team) {
        self.scores.award(team);
        info!(
            "Goal for {:?}! Score is now {} - {}",
            team, self.scores.red, self.scores.blue
        );
        self.reset_positions();
    }

    /// New round: ball to the center spot, every player back on their spawn
    /// with zero velocity and a cleared shot cooldown.
    fn reset_positions(&mut self) {
        self.ball.reset();
        for player in self.players.values_mut() {
            player.reset();
        }
        self.cooldowns.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::InputFlags;

    fn held(up: bool, down: bool, left: bool, right: bool, action: bool) -> InputFlags {
        InputFlags {
            up,
            down,
            left,
            right,
            action,
        }
    }

    #[test]
    fn test_add_and_remove_player() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        assert_eq!(session.players.len(), 1);
        assert_eq!(session.players["peer_1"].x, Team::Red.spawn_x());

        session.remove_player("peer_1");
        assert!(session.players.is_empty());
        // Removing an absent id is a no-op.
        session.remove_player("peer_1");
    }

    #[test]
    fn test_duplicate_id_insert_overwrites() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        session.players.get_mut("peer_1").unwrap().x = 333.0;

        session.add_player("peer_1", "grace", Team::Blue);
        assert_eq!(session.players.len(), 1);
        assert_eq!(session.players["peer_1"].name, "grace");
        assert_eq!(session.players["peer_1"].x, Team::Blue.spawn_x());
    }

    #[test]
    fn test_unknown_id_input_is_dropped() {
        let mut session = Session::new();
        session.apply_input("peer_404", held(true, false, false, false, false));
        assert!(session.players.is_empty());
    }

    #[test]
    fn test_team_assignment_balances_rosters() {
        let mut session = Session::new();
        assert_eq!(session.assign_team(), Team::Red);

        session.add_player("peer_1", "a", Team::Red);
        assert_eq!(session.assign_team(), Team::Blue);

        session.add_player("peer_2", "b", Team::Blue);
        assert_eq!(session.assign_team(), Team::Red);
    }

    #[test]
    fn test_single_tick_acceleration_and_drag() {
        // One tick of "right" held produces vx = 0.45 * 0.88.
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        // Park the player away from the ball so no interaction occurs.
        {
            let p = session.players.get_mut("peer_1").unwrap();
            p.x = 385.0;
            p.y = 100.0;
        }
        session.apply_input("peer_1", held(false, false, false, true, false));

        session.step(Instant::now());

        let p = &session.players["peer_1"];
        assert_approx_eq!(p.vx, 0.45 * 0.88, 1e-6);
        assert_approx_eq!(p.x, 385.0 + 0.45 * 0.88, 1e-4);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_opposing_flags_cancel() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        session.apply_input("peer_1", held(true, true, true, true, false));

        session.step(Instant::now());

        let p = &session.players["peer_1"];
        assert_eq!(p.vx, 0.0);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn test_player_clamped_to_field() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        {
            let p = session.players.get_mut("peer_1").unwrap();
            p.x = PLAYER_RADIUS + 0.5;
            p.y = PLAYER_RADIUS + 0.5;
        }
        session.apply_input("peer_1", held(true, false, true, false, false));

        for _ in 0..120 {
            session.step(Instant::now());
            let p = &session.players["peer_1"];
            assert!(p.x >= PLAYER_RADIUS);
            assert!(p.x <= FIELD_WIDTH - PLAYER_RADIUS);
            assert!(p.y >= PLAYER_RADIUS);
            assert!(p.y <= FIELD_HEIGHT - PLAYER_RADIUS);
        }

        // Pressed into the corner the player sits exactly on the clamp line.
        let p = &session.players["peer_1"];
        assert_eq!(p.x, PLAYER_RADIUS);
        assert_eq!(p.y, PLAYER_RADIUS);
    }

    #[test]
    fn test_shot_applies_impulse_and_gates_cooldown() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        {
            let p = session.players.get_mut("peer_1").unwrap();
            p.x = session.ball.x - (PLAYER_RADIUS + session.ball.radius + 5.0);
            p.y = session.ball.y;
        }
        session.apply_input("peer_1", held(false, false, false, false, true));

        let start = Instant::now();
        let events = session.step(start);

        assert!(events.contains(&SimEvent::Kick));
        assert!(!session.players["peer_1"].can_shoot);
        // Kick force points from player toward ball, here straight right.
        assert!(session.ball.vx > SHOOT_FORCE * BALL_FRICTION * 0.9);

        // Held action inside the window must not fire a second impulse.
        let vx_after_first = session.ball.vx;
        session.step(start + Duration::from_millis(100));
        assert!(session.ball.vx <= vx_after_first);
        assert!(!session.players["peer_1"].can_shoot);

        // After 300ms the gate reopens; the ball has long since left reach,
        // so the held action flag cannot refire this tick.
        session.step(start + Duration::from_millis(301));
        assert!(session.players["peer_1"].can_shoot);
    }

    #[test]
    fn test_cooldown_reverts_after_deadline() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        // Move the ball out of reach so the reopened gate cannot refire.
        session.ball.x = 700.0;
        session.ball.y = 100.0;

        let start = Instant::now();
        session.players.get_mut("peer_1").unwrap().can_shoot = false;
        session
            .cooldowns
            .push(("peer_1".to_string(), start + Duration::from_millis(300)));

        session.step(start + Duration::from_millis(299));
        assert!(!session.players["peer_1"].can_shoot);

        session.step(start + Duration::from_millis(300));
        assert!(session.players["peer_1"].can_shoot);
    }

    #[test]
    fn test_cooldown_for_removed_player_is_noop() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        let start = Instant::now();
        session
            .cooldowns
            .push(("peer_1".to_string(), start + Duration::from_millis(300)));
        session.remove_player("peer_1");

        // Must not panic or resurrect the player.
        session.step(start + Duration::from_secs(1));
        assert!(session.players.is_empty());
        assert!(session.cooldowns.is_empty());
    }

    #[test]
    fn test_touch_collision_pushes_ball_out() {
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        {
            let p = session.players.get_mut("peer_1").unwrap();
            p.x = session.ball.x - 10.0;
            p.y = session.ball.y;
        }

        session.step(Instant::now());

        let p = &session.players["peer_1"];
        let dist = p.distance_to(session.ball.x, session.ball.y);
        // Positional correction resolves the overlap within the tick.
        assert!(dist >= PLAYER_RADIUS + session.ball.radius - 1.0);
        assert!(session.ball.vx > 0.0);
    }

    #[test]
    fn test_ball_reflects_off_horizontal_walls() {
        let mut session = Session::new();
        session.ball.y = session.ball.radius + 1.0;
        session.ball.vy = -5.0;

        session.step(Instant::now());

        assert!(session.ball.vy > 0.0);
        assert!(session.ball.y >= session.ball.radius);
    }

    #[test]
    fn test_side_wall_rigid_outside_goal_mouth() {
        let mut session = Session::new();
        session.ball.x = 15.0;
        session.ball.y = 100.0; // outside the 170..310 band
        session.ball.vx = -8.0;

        let events = session.step(Instant::now());

        assert!(events.is_empty());
        assert_eq!(session.scores, Scores::default());
        assert!(session.ball.vx > 0.0);
        assert_eq!(session.ball.x, session.ball.radius + 2.0);
    }

    #[test]
    fn test_goal_scores_and_resets_round() {
        // Ball just inside the left goal mouth, moving left.
        let mut session = Session::new();
        session.add_player("peer_1", "ada", Team::Red);
        session.add_player("peer_2", "bob", Team::Blue);
        {
            let p = session.players.get_mut("peer_1").unwrap();
            p.x = 300.0;
            p.vx = 3.0;
        }
        session.ball.x = 9.0;
        session.ball.y = 240.0;
        session.ball.vx = -2.0;

        let events = session.step(Instant::now());

        assert!(events.contains(&SimEvent::Goal { team: Team::Blue }));
        assert_eq!(session.scores.blue, 1);
        assert_eq!(session.scores.red, 0);
        assert_eq!(session.ball.x, FIELD_WIDTH / 2.0);
        assert_eq!(session.ball.y, FIELD_HEIGHT / 2.0);
        assert_eq!(session.ball.vx, 0.0);
        assert_eq!(session.ball.vy, 0.0);
        for player in session.players.values() {
            assert_eq!(player.x, player.team.spawn_x());
            assert_eq!(player.vx, 0.0);
            assert!(player.can_shoot);
        }
    }

    #[test]
    fn test_right_goal_awards_red() {
        let mut session = Session::new();
        session.ball.x = FIELD_WIDTH - 9.0;
        session.ball.y = 200.0;
        session.ball.vx = 2.0;

        let events = session.step(Instant::now());

        assert!(events.contains(&SimEvent::Goal { team: Team::Red }));
        assert_eq!(session.scores.red, 1);
    }

    #[test]
    fn test_scores_never_decrease() {
        let mut session = Session::new();
        let mut last = Scores::default();
        for i in 0..5 {
            session.ball.x = 9.0;
            session.ball.y = 240.0;
            session.ball.vx = -2.0;
            session.step(Instant::now());
            assert!(session.scores.blue >= last.blue);
            assert!(session.scores.red >= last.red);
            assert_eq!(session.scores.blue, i + 1);
            last = session.scores;
        }
    }
}
