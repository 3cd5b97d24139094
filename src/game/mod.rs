//! Deterministic rule engine
//!
//! All gameplay logic lives here. This module must stay deterministic:
//! - Seeded RNG only, owned by the engine
//! - Time comes from an injected clock
//! - Stable row-major iteration order
//! - No presentation or platform dependencies

pub mod cell;
pub mod grid;
pub mod scanner;
pub mod scoring;
pub mod session;
pub mod token;
pub mod turn;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BOARD_SIZE, LEADERBOARD_CAPACITY, MIN_RUN_LENGTH, TOKENS_PER_TURN};

pub use cell::{Cell, Pos};
pub use grid::Grid;
pub use scanner::{Direction, RunScanner};
pub use scoring::calculate_score;
pub use session::{RngState, SessionMeta};
pub use token::Token;
pub use turn::{ClickOutcome, PendingScore, TurnEngine};

/// Rule parameters fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub board_size: usize,
    pub tokens_per_turn: usize,
    pub min_run_length: usize,
    pub leaderboard_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            tokens_per_turn: TOKENS_PER_TURN,
            min_run_length: MIN_RUN_LENGTH,
            leaderboard_capacity: LEADERBOARD_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Default rules on the board size chosen in `settings`
    pub fn from_settings(settings: &crate::settings::Settings) -> Self {
        Self {
            board_size: settings.clamped().board_size,
            ..Self::default()
        }
    }
}
