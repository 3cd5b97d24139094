//! Lines - a turn-based color-matching puzzle
//!
//! Core modules:
//! - `game`: Deterministic rule engine (grid, reachability, run detection, turns)
//! - `leaderboard`: Capacity-bounded, sorted score board
//! - `settings`: Player-facing configuration
//! - `persistence`: Snapshot store for grid, session and leaderboard
//! - `clock`: Injectable time source

pub mod clock;
pub mod game;
pub mod leaderboard;
pub mod persistence;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use game::{EngineConfig, Grid, Pos, RunScanner, SessionMeta, Token, TurnEngine};
pub use leaderboard::{Leaderboard, ScoreEntry};
pub use settings::Settings;

/// Game rule constants
pub mod consts {
    /// Tokens spawned onto the grid each turn
    pub const TOKENS_PER_TURN: usize = 3;
    /// Shortest run that gets popped
    pub const MIN_RUN_LENGTH: usize = 5;

    /// Grid side length bounds
    pub const DEFAULT_BOARD_SIZE: usize = 9;
    pub const MIN_BOARD_SIZE: usize = 9;
    pub const MAX_BOARD_SIZE: usize = 12;

    /// Turn time limit bounds (seconds)
    pub const DEFAULT_TURN_LENGTH: u32 = 30;
    pub const MIN_TURN_LENGTH: u32 = 5;
    pub const MAX_TURN_LENGTH: u32 = 60;

    /// Maximum number of leaderboard entries
    pub const LEADERBOARD_CAPACITY: usize = 10;

    /// Interval of the external timer refresh (twice a second)
    pub const TICK_INTERVAL_MS: u64 = 500;
}

/// Format milliseconds as `HH:MM:SS`
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a unix timestamp (ms) as a `YYYY-MM-DD` date
pub fn format_date(timestamp_ms: u64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
