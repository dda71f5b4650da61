use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 480.0;
pub const PLAYER_RADIUS: f32 = 15.0;
pub const BALL_RADIUS: f32 = 10.0;
pub const PLAYER_ACCEL: f32 = 0.45;
pub const PLAYER_DRAG: f32 = 0.88;
pub const BALL_FRICTION: f32 = 0.98;
pub const SHOOT_FORCE: f32 = 12.0;
pub const TOUCH_FORCE: f32 = 3.5;
pub const KICK_REACH: f32 = 10.0;
pub const GOAL_TOP: f32 = 170.0;
pub const GOAL_BOTTOM: f32 = 310.0;
pub const SPAWN_OFFSET: f32 = 100.0;
pub const SHOOT_COOLDOWN_MS: u64 = 300;
pub const TICK_RATE: u32 = 60;
pub const BROADCAST_INTERVAL_MS: u64 = 20;
pub const LERP_FACTOR: f32 = 0.12;
pub const SNAP_THRESHOLD: f32 = 100.0;

/// Reserved id for the player controlled by the host process itself.
pub const HOST_PLAYER_ID: &str = "peer_host";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Connect {
        name: String,
    },
    Input {
        flags: InputFlags,
    },
    Disconnect,

    Connected {
        player_id: String,
        team: Team,
    },
    Snapshot {
        players: HashMap<String, Player>,
        ball: Ball,
        scores: Scores,
    },
    Disconnected {
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(&self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    /// Spawn x-coordinate: 100 units in front of the team's own goal line.
    pub fn spawn_x(&self) -> f32 {
        match self {
            Team::Red => SPAWN_OFFSET,
            Team::Blue => FIELD_WIDTH - SPAWN_OFFSET,
        }
    }
}

/// One sampled input frame: five held-key flags, no sequencing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub action: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub team: Team,
    pub inputs: InputFlags,
    pub can_shoot: bool,
}

impl Player {
    pub fn new(id: &str, name: &str, team: Team) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            x: team.spawn_x(),
            y: FIELD_HEIGHT / 2.0,
            vx: 0.0,
            vy: 0.0,
            team,
            inputs: InputFlags::default(),
            can_shoot: true,
        }
    }

    /// Puts the player back on its spawn point with zero velocity and a
    /// cleared shot cooldown. Used after every goal.
    pub fn reset(&mut self) {
        self.x = self.team.spawn_x();
        self.y = FIELD_HEIGHT / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
        self.can_shoot = true;
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.x;
        let dy = y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
}

impl Default for Ball {
    fn default() -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
            y: FIELD_HEIGHT / 2.0,
            vx: 0.0,
            vy: 0.0,
            radius: BALL_RADIUS,
        }
    }
}

impl Ball {
    /// Back to the center spot, dead still.
    pub fn reset(&mut self) {
        self.x = FIELD_WIDTH / 2.0;
        self.y = FIELD_HEIGHT / 2.0;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    /// True when the given y lies inside the goal-mouth band. Outside the
    /// band the side walls are rigid.
    pub fn in_goal_mouth(y: f32) -> bool {
        y > GOAL_TOP && y < GOAL_BOTTOM
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub red: u32,
    pub blue: u32,
}

impl Scores {
    pub fn award(&mut self, team: Team) {
        match team {
            Team::Red => self.red += 1,
            Team::Blue => self.blue += 1,
        }
    }

    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_spawns_in_front_of_own_goal() {
        let red = Player::new("peer_1", "ada", Team::Red);
        assert_eq!(red.x, SPAWN_OFFSET);
        assert_eq!(red.y, FIELD_HEIGHT / 2.0);
        assert_eq!(red.vx, 0.0);
        assert_eq!(red.vy, 0.0);
        assert!(red.can_shoot);

        let blue = Player::new("peer_2", "bob", Team::Blue);
        assert_eq!(blue.x, FIELD_WIDTH - SPAWN_OFFSET);
    }

    #[test]
    fn test_player_reset() {
        let mut player = Player::new("peer_1", "ada", Team::Blue);
        player.x = 321.0;
        player.y = 12.0;
        player.vx = -4.0;
        player.vy = 2.5;
        player.can_shoot = false;

        player.reset();

        assert_eq!(player.x, Team::Blue.spawn_x());
        assert_eq!(player.y, FIELD_HEIGHT / 2.0);
        assert_eq!(player.vx, 0.0);
        assert_eq!(player.vy, 0.0);
        assert!(player.can_shoot);
    }

    #[test]
    fn test_team_opponent() {
        assert_eq!(Team::Red.opponent(), Team::Blue);
        assert_eq!(Team::Blue.opponent(), Team::Red);
    }

    #[test]
    fn test_ball_defaults_to_center_spot() {
        let ball = Ball::default();
        assert_eq!(ball.x, FIELD_WIDTH / 2.0);
        assert_eq!(ball.y, FIELD_HEIGHT / 2.0);
        assert_eq!(ball.radius, BALL_RADIUS);
    }

    #[test]
    fn test_goal_mouth_band() {
        assert!(Ball::in_goal_mouth(240.0));
        assert!(!Ball::in_goal_mouth(GOAL_TOP));
        assert!(!Ball::in_goal_mouth(GOAL_BOTTOM));
        assert!(!Ball::in_goal_mouth(100.0));
        assert!(!Ball::in_goal_mouth(400.0));
    }

    #[test]
    fn test_scores_award() {
        let mut scores = Scores::default();
        scores.award(Team::Blue);
        scores.award(Team::Blue);
        scores.award(Team::Red);
        assert_eq!(scores.blue, 2);
        assert_eq!(scores.red, 1);
        assert_eq!(scores.get(Team::Blue), 2);
        assert_eq!(scores.get(Team::Red), 1);
    }

    #[test]
    fn test_packet_serialization_connect() {
        let packet = Packet::Connect {
            name: "ada".to_string(),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Connect { name } => assert_eq!(name, "ada"),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_input() {
        let packet = Packet::Input {
            flags: InputFlags {
                up: true,
                down: false,
                left: false,
                right: true,
                action: true,
            },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Input { flags } => {
                assert!(flags.up);
                assert!(!flags.down);
                assert!(!flags.left);
                assert!(flags.right);
                assert!(flags.action);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let mut players = HashMap::new();
        players.insert(
            "peer_1".to_string(),
            Player::new("peer_1", "ada", Team::Red),
        );
        players.insert(
            "peer_2".to_string(),
            Player::new("peer_2", "bob", Team::Blue),
        );

        let packet = Packet::Snapshot {
            players,
            ball: Ball::default(),
            scores: Scores { red: 2, blue: 1 },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Snapshot {
                players,
                ball,
                scores,
            } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players["peer_1"].team, Team::Red);
                assert_eq!(players["peer_2"].name, "bob");
                assert_eq!(ball.x, FIELD_WIDTH / 2.0);
                assert_eq!(scores.red, 2);
                assert_eq!(scores.blue, 1);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_distance_to() {
        let player = Player::new("peer_1", "ada", Team::Red);
        let d = player.distance_to(player.x + 3.0, player.y + 4.0);
        assert!((d - 5.0).abs() < f32::EPSILON);
    }
}
