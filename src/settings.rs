//! Game settings and preferences
//!
//! Persisted separately from game saves.

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BOARD_SIZE, DEFAULT_TURN_LENGTH, MAX_BOARD_SIZE, MAX_TURN_LENGTH, MIN_BOARD_SIZE,
    MIN_TURN_LENGTH,
};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Grid side length (9 - 12)
    pub board_size: usize,

    // === Turn timer ===
    /// End the turn automatically when the limit runs out
    pub turn_time_enabled: bool,
    /// Seconds per turn (5 - 60)
    pub turn_time_limit: u32,

    // === Hints ===
    /// Show the colors of the next spawn
    pub show_incoming_colors: bool,
    /// Mark where the next spawn lands
    pub show_incoming_positions: bool,
    /// Highlight reachable cells of the selected token
    pub highlight_enabled: bool,

    /// Name prefilled for leaderboard entries; `None` keeps the login name
    pub player_name: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,

            turn_time_enabled: false,
            turn_time_limit: DEFAULT_TURN_LENGTH,

            // Hints - all on by default
            show_incoming_colors: true,
            show_incoming_positions: true,
            highlight_enabled: true,

            player_name: None,
        }
    }
}

impl Settings {
    /// Storage key for serialized settings
    pub const STORAGE_KEY: &'static str = "lines_settings";

    /// Copy with every value forced into its allowed range
    pub fn clamped(&self) -> Self {
        let player_name = self
            .player_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Self {
            board_size: self.board_size.clamp(MIN_BOARD_SIZE, MAX_BOARD_SIZE),
            turn_time_limit: self.turn_time_limit.clamp(MIN_TURN_LENGTH, MAX_TURN_LENGTH),
            player_name,
            ..self.clone()
        }
    }

    pub fn set_board_size(&mut self, size: usize) {
        self.board_size = size.clamp(MIN_BOARD_SIZE, MAX_BOARD_SIZE);
    }

    pub fn set_turn_time_limit(&mut self, secs: u32) {
        self.turn_time_limit = secs.clamp(MIN_TURN_LENGTH, MAX_TURN_LENGTH);
    }

    /// Parse settings from JSON, falling back to defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings.clamped()
            }
            Err(err) => {
                log::warn!("Invalid settings ({}), using defaults", err);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self)
            .map_err(|err| log::warn!("Failed to encode settings: {}", err))
            .ok()
    }
}
