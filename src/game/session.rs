//! Session-scoped state
//!
//! Everything about the running game that is not the grid itself: score,
//! selection, timers, display toggles and the preview of the next spawn.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cell::Pos;
use super::token::Token;
use crate::consts::DEFAULT_TURN_LENGTH;

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    /// Shared with the grid snapshot to detect desynchronized saves
    pub instance_id: u64,
    /// Seed the session's RNG was created from
    pub rng_state: RngState,
    /// No user turn has completed since the game began
    pub fresh: bool,
    /// False only briefly while a game is being set up
    pub game_in_progress: bool,
    pub score: u32,
    pub player_name: String,

    // === Display toggles ===
    /// Show the colors of the next spawn
    pub show_incoming_colors: bool,
    /// Hint the positions of the next spawn on the grid
    pub show_incoming_positions: bool,
    /// Highlight reachable cells while a token is selected
    pub highlight_enabled: bool,

    /// Colors of the next spawn
    pub incoming: Vec<Token>,
    /// Cell whose token the player intends to move
    selection: Option<Pos>,

    // === Timers (unix ms / ms) ===
    pub game_start_ms: u64,
    pub session_start_ms: u64,
    /// Accumulated time of earlier sessions of this game
    pub previous_session_ms: u64,
    pub current_session_ms: u64,
    pub turn_start_ms: u64,
    pub turn_time_enabled: bool,
    /// Seconds per turn
    pub turn_time_limit: u32,
}

impl SessionMeta {
    pub fn new(instance_id: u64, seed: u64, slots: usize, now_ms: u64) -> Self {
        Self {
            instance_id,
            rng_state: RngState { seed },
            fresh: true,
            game_in_progress: false,
            score: 0,
            player_name: default_player_name(),
            show_incoming_colors: true,
            show_incoming_positions: true,
            highlight_enabled: true,
            incoming: vec![Token::Blue; slots],
            selection: None,
            game_start_ms: now_ms,
            session_start_ms: now_ms,
            previous_session_ms: 0,
            current_session_ms: 0,
            turn_start_ms: now_ms,
            turn_time_enabled: false,
            turn_time_limit: DEFAULT_TURN_LENGTH,
        }
    }

    /// Reset score, selection and timers for a new game
    pub fn reset_game(&mut self, now_ms: u64) {
        self.score = 0;
        self.cancel_turn();
        self.game_start_ms = now_ms;
        self.session_start_ms = now_ms;
        self.previous_session_ms = 0;
        self.current_session_ms = 0;
        self.game_in_progress = true;
    }

    /// Draw new colors for the next spawn
    pub fn roll_incoming<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for token in &mut self.incoming {
            *token = Token::random(rng);
        }
    }

    pub fn add_score(&mut self, delta: u32) {
        self.score = self.score.saturating_add(delta);
    }

    pub fn selection(&self) -> Option<Pos> {
        self.selection
    }

    /// A turn is in progress exactly while a cell is selected
    pub fn is_turn_in_progress(&self) -> bool {
        self.selection.is_some()
    }

    pub fn select(&mut self, pos: Pos) {
        self.selection = Some(pos);
    }

    pub fn cancel_turn(&mut self) {
        self.selection = None;
    }

    pub fn reset_turn_time(&mut self, now_ms: u64) {
        self.turn_start_ms = now_ms;
    }

    /// Milliseconds spent in the current turn
    pub fn turn_time(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.turn_start_ms)
    }

    /// Previous sessions plus the current one
    pub fn total_game_time(&self) -> u64 {
        self.previous_session_ms + self.current_session_ms
    }

    /// Refresh the current-session counter
    pub fn update_session_time(&mut self, now_ms: u64) {
        self.current_session_ms = now_ms.saturating_sub(self.session_start_ms);
    }

    /// Fold the last session into the running total after a restore
    pub fn resume_session(&mut self, now_ms: u64) {
        self.previous_session_ms += self.current_session_ms;
        self.session_start_ms = now_ms;
        self.current_session_ms = 0;
        self.turn_start_ms = now_ms;
    }

    /// Whether the turn limit is enabled and used up
    pub fn turn_time_exceeded(&self, now_ms: u64) -> bool {
        self.turn_time_enabled && self.turn_time(now_ms) >= u64::from(self.turn_time_limit) * 1000
    }
}

/// Login name of the current user, if the environment has one
pub fn default_player_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "Player".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_flag_follows_selection() {
        let mut meta = SessionMeta::new(1, 0, 3, 0);
        assert!(!meta.is_turn_in_progress());
        meta.select(Pos::new(1, 1));
        assert!(meta.is_turn_in_progress());
        meta.cancel_turn();
        assert!(!meta.is_turn_in_progress());
        assert_eq!(meta.selection(), None);
    }

    #[test]
    fn test_session_times_merge_on_resume() {
        let mut meta = SessionMeta::new(1, 0, 3, 1_000);
        meta.update_session_time(61_000);
        assert_eq!(meta.total_game_time(), 60_000);

        meta.resume_session(100_000);
        assert_eq!(meta.previous_session_ms, 60_000);
        assert_eq!(meta.current_session_ms, 0);
        meta.update_session_time(105_000);
        assert_eq!(meta.total_game_time(), 65_000);
    }

    #[test]
    fn test_turn_limit() {
        let mut meta = SessionMeta::new(1, 0, 3, 0);
        meta.turn_time_limit = 5;
        assert!(!meta.turn_time_exceeded(10_000));

        meta.turn_time_enabled = true;
        assert!(!meta.turn_time_exceeded(4_999));
        assert!(meta.turn_time_exceeded(5_000));
    }

    #[test]
    fn test_reset_game() {
        let mut meta = SessionMeta::new(1, 0, 3, 0);
        meta.add_score(40);
        meta.select(Pos::new(0, 0));
        meta.previous_session_ms = 500;
        meta.reset_game(9_000);
        assert_eq!(meta.score, 0);
        assert_eq!(meta.selection(), None);
        assert_eq!(meta.total_game_time(), 0);
        assert_eq!(meta.game_start_ms, 9_000);
        assert!(meta.game_in_progress);
    }
}
