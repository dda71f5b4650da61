use crate::game::ClientView;
use macroquad::prelude::*;
use shared::{Player, Team, FIELD_HEIGHT, FIELD_WIDTH, GOAL_BOTTOM, GOAL_TOP, PLAYER_RADIUS};

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub player_id: Option<String>,
    pub snapshot_age_ms: u64,
    /// Show the goal banner this frame.
    pub goal_banner: bool,
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            width: FIELD_WIDTH,
            height: FIELD_HEIGHT,
        }
    }

    pub fn is_open(&self) -> bool {
        !is_quit_requested()
    }

    pub fn render(&mut self, view: &ClientView, config: &RenderConfig) {
        self.draw_pitch();

        for (id, entry) in &view.players {
            let is_local = config.player_id.as_deref() == Some(id.as_str());
            self.draw_player(&entry.player, is_local);
        }

        self.draw_ball(view.ball.ball.x, view.ball.ball.y, view.ball.ball.radius);
        self.draw_scoreboard(view.scores.red, view.scores.blue, config.snapshot_age_ms);

        if config.goal_banner {
            self.draw_goal_banner();
        }
    }

    fn draw_pitch(&mut self) {
        clear_background(Color::from_rgba(52, 94, 42, 255));

        // Alternating mowing stripes.
        for i in 0..(self.width as i32 / 80) {
            if i % 2 == 0 {
                draw_rectangle(
                    i as f32 * 80.0,
                    0.0,
                    40.0,
                    self.height,
                    Color::from_rgba(0, 0, 0, 15),
                );
            }
        }

        let line = Color::from_rgba(255, 255, 255, 204);
        draw_rectangle_lines(10.0, 10.0, self.width - 20.0, self.height - 20.0, 4.0, line);
        draw_line(
            self.width / 2.0,
            10.0,
            self.width / 2.0,
            self.height - 10.0,
            4.0,
            line,
        );
        draw_circle_lines(self.width / 2.0, self.height / 2.0, 70.0, 4.0, line);

        // Goal mouths on both side walls.
        let mouth_height = GOAL_BOTTOM - GOAL_TOP;
        draw_rectangle_lines(-5.0, GOAL_TOP, 20.0, mouth_height, 6.0, line);
        draw_rectangle_lines(self.width - 15.0, GOAL_TOP, 20.0, mouth_height, 6.0, line);
    }

    fn draw_player(&mut self, player: &Player, is_local: bool) {
        // Shadow under the disc.
        draw_circle(
            player.x,
            player.y + 4.0,
            PLAYER_RADIUS,
            Color::from_rgba(0, 0, 0, 77),
        );

        // Kick glow while the action flag is held.
        if player.inputs.action {
            draw_circle(
                player.x,
                player.y,
                PLAYER_RADIUS + 5.0,
                Color::from_rgba(255, 255, 255, 102),
            );
        }

        let body = match player.team {
            Team::Red => Color::from_rgba(255, 77, 77, 255),
            Team::Blue => Color::from_rgba(77, 148, 255, 255),
        };
        draw_circle(player.x, player.y, PLAYER_RADIUS, body);
        let outline = if is_local { YELLOW } else { WHITE };
        draw_circle_lines(player.x, player.y, PLAYER_RADIUS, 3.0, outline);

        let label_width = measure_text(&player.name, None, 13, 1.0).width;
        draw_text(
            &player.name,
            player.x - label_width / 2.0,
            player.y - 28.0,
            13.0,
            WHITE,
        );
    }

    fn draw_ball(&mut self, x: f32, y: f32, radius: f32) {
        draw_circle(x, y, radius, WHITE);
        draw_circle_lines(x, y, radius, 2.0, Color::from_rgba(51, 51, 51, 255));
        draw_circle(x, y, 4.0, Color::from_rgba(51, 51, 51, 255));
    }

    fn draw_scoreboard(&mut self, red: u32, blue: u32, snapshot_age_ms: u64) {
        let score = format!("{} - {}", red, blue);
        let size = measure_text(&score, None, 32, 1.0);
        draw_text(
            &score,
            self.width / 2.0 - size.width / 2.0,
            40.0,
            32.0,
            WHITE,
        );

        draw_text(&format!("{}ms", snapshot_age_ms), 14.0, self.height - 14.0, 14.0, GRAY);
    }

    fn draw_goal_banner(&mut self) {
        let text = "GOAL!";
        let size = measure_text(text, None, 72, 1.0);
        draw_text(
            text,
            self.width / 2.0 - size.width / 2.0,
            self.height / 2.0 - 60.0,
            72.0,
            GOLD,
        );
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
