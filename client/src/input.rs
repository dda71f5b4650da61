//! Client input sampling with change detection and keep-alive resend

use macroquad::prelude::*;
use shared::InputFlags;
use std::time::{Duration, Instant};

/// Samples the keyboard into held-input snapshots for the host. There is no
/// sequencing on the wire; the host applies whatever arrived last.
pub struct InputManager {
    current_input: InputFlags,
    last_input_sent: Instant,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            current_input: InputFlags::default(),
            last_input_sent: Instant::now(),
        }
    }

    /// Samples the keys and returns a snapshot to send, either because a
    /// flag changed or as a periodic keep-alive against lost packets.
    pub fn update(&mut self) -> Option<InputFlags> {
        // WASD plus arrow keys, space to kick.
        let flags = InputFlags {
            up: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            down: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            action: is_key_down(KeyCode::Space),
        };

        let input_changed = flags != self.current_input;
        let time_to_send = self.last_input_sent.elapsed() >= Duration::from_millis(16);

        if input_changed || time_to_send {
            self.current_input = flags;
            self.last_input_sent = Instant::now();
            Some(flags)
        } else {
            None
        }
    }

    /// Returns the most recently sampled input state
    pub fn get_current_input(&self) -> &InputFlags {
        &self.current_input
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
