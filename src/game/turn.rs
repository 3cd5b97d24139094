//! Turn and session state machine
//!
//! A turn is idle until the player clicks a token, which selects it and
//! computes reachability from it. Clicking a reachable empty cell moves the
//! token there; lines are popped and scored, and if nothing popped the
//! previewed tokens spawn. A full grid ends the game and starts a new one.
//!
//! Every operation runs to completion. The external timer and the click
//! stream must be serialized by the caller (e.g. `Arc<Mutex<TurnEngine>>`).

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::cell::Pos;
use super::grid::Grid;
use super::scanner::RunScanner;
use super::scoring::calculate_score;
use super::session::{RngState, SessionMeta};
use super::EngineConfig;
use crate::clock::Clock;
use crate::consts::{MAX_BOARD_SIZE, MIN_BOARD_SIZE};
use crate::leaderboard::{Leaderboard, ScoreEntry};
use crate::persistence::{Snapshot, SnapshotKind, SnapshotStore};
use crate::settings::Settings;
use crate::{format_date, format_duration};

/// What a click did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Out of bounds, or an empty cell with nothing selected
    Ignored,
    /// A token was selected
    Selected,
    /// The selected token was clicked again
    Deselected,
    /// Another token replaced the selection
    Reselected,
    /// No empty path to the clicked cell
    Blocked,
    /// The selected token moved
    Moved { from: Pos, to: Pos, popped: usize },
}

/// Result of a finished game that may go onto the leaderboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingScore {
    pub score: u32,
    pub grid_size: usize,
    pub turn_time_limit: Option<u32>,
    pub total_time_ms: u64,
    pub game_start_ms: u64,
}

pub struct TurnEngine {
    config: EngineConfig,
    grid: Grid,
    scanner: RunScanner,
    meta: SessionMeta,
    leaderboard: Leaderboard,
    pending: Option<PendingScore>,
    rng: Pcg32,
    clock: Box<dyn Clock>,
}

impl TurnEngine {
    /// Create an engine and start the first game
    pub fn new(config: EngineConfig, seed: u64, clock: impl Clock + 'static) -> Self {
        let leaderboard = Leaderboard::new(config.leaderboard_capacity);
        let mut engine = Self::fresh(config, seed, Box::new(clock), leaderboard);
        engine.start_new_game();
        engine
    }

    /// Grid and session under a new instance id, not yet seeded with tokens
    fn fresh(
        config: EngineConfig,
        seed: u64,
        clock: Box<dyn Clock>,
        leaderboard: Leaderboard,
    ) -> Self {
        let now = clock.now_ms();
        let instance_id = now;
        log::info!("Creating game instance {} (seed {})", instance_id, seed);
        Self {
            config,
            grid: Grid::new(config.board_size, config.tokens_per_turn, instance_id),
            scanner: RunScanner::new(config.board_size, config.min_run_length),
            meta: SessionMeta::new(instance_id, seed, config.tokens_per_turn, now),
            leaderboard,
            pending: None,
            rng: Pcg32::seed_from_u64(seed),
            clock,
        }
    }

    fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn meta(&self) -> &SessionMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut SessionMeta {
        &mut self.meta
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn score(&self) -> u32 {
        self.meta.score
    }

    // === Clicks ===

    /// Feed a click on `pos` into the state machine
    pub fn handle_cell_click(&mut self, pos: Pos) -> ClickOutcome {
        let Some(cell) = self.grid.cell(pos) else {
            return ClickOutcome::Ignored;
        };
        let occupied = !cell.is_empty();

        match self.meta.selection() {
            None if occupied => {
                self.select(pos);
                ClickOutcome::Selected
            }
            None => ClickOutcome::Ignored,
            Some(from) if from == pos => {
                self.cancel_turn();
                ClickOutcome::Deselected
            }
            Some(from) if occupied => {
                self.grid.set_active(from, false);
                self.select(pos);
                ClickOutcome::Reselected
            }
            Some(from) if self.grid.is_reachable(pos) => self.move_token(from, pos),
            Some(_) => {
                log::debug!("No path to {}", pos);
                ClickOutcome::Blocked
            }
        }
    }

    fn select(&mut self, pos: Pos) {
        self.grid.set_active(pos, true);
        self.meta.select(pos);
        self.grid.compute_reachability(pos);
    }

    fn move_token(&mut self, from: Pos, to: Pos) -> ClickOutcome {
        if let Some(token) = self.grid.take(from) {
            self.grid.place(to, token);
            log::debug!("Moved {} {} -> {}", token, from, to);
        }
        self.grid.set_active(from, false);

        // A successful pop keeps the next spawn back
        let popped = self.pop_and_score();
        self.start_new_turn(popped == 0);
        self.meta.cancel_turn();

        ClickOutcome::Moved { from, to, popped }
    }

    /// Deselect the active token, if any
    pub fn cancel_turn(&mut self) {
        if let Some(pos) = self.meta.selection() {
            self.grid.set_active(pos, false);
        }
        self.meta.cancel_turn();
    }

    fn pop_and_score(&mut self) -> usize {
        let popped = self.scanner.pop_lines(&mut self.grid);
        let delta = calculate_score(popped, self.scanner.min_len());
        if delta > 0 {
            self.meta.add_score(delta);
            log::debug!("Popped {} for {} points (score {})", popped, delta, self.meta.score);
        }
        popped
    }

    // === Turns and games ===

    /// End the current turn, optionally spawning the previewed tokens.
    ///
    /// Starts a new game instead if the grid ends up full.
    pub fn start_new_turn(&mut self, spawn: bool) {
        let now = self.now();
        self.meta.fresh = false;
        self.meta.reset_turn_time(now);

        if !self.grid.incoming_positions_available() {
            self.grid.recalculate_incoming_positions(&mut self.rng);
        }

        if spawn {
            self.spawn_incoming();
        }

        if self.grid.is_full() {
            log::info!("Grid is full, final score {}", self.meta.score);
            self.start_new_game();
            return;
        }

        // Spawned tokens may complete lines on their own
        self.pop_and_score();

        if spawn {
            self.meta.roll_incoming(&mut self.rng);
            self.grid.calculate_incoming_positions(&mut self.rng);
        }

        // A slot cell that was filled and popped again lost its preview
        self.grid.preview_incoming(&self.meta.incoming);
        self.cancel_turn();
    }

    fn spawn_incoming(&mut self) {
        let slots = self.grid.incoming_positions().to_vec();
        for (slot, token) in slots.into_iter().zip(self.meta.incoming.clone()) {
            if self.grid.is_full() {
                log::debug!("No empty cell left to spawn into");
                return;
            }
            match slot {
                Some(pos) if self.grid.is_empty_at(pos) => {
                    self.grid.place(pos, token);
                }
                _ => log::debug!("Skipping unavailable spawn slot"),
            }
        }
    }

    /// Finish the current game and set up a fresh one.
    ///
    /// A positive score that qualifies for the leaderboard is kept as a
    /// [`PendingScore`] until [`commit_score_entry`](Self::commit_score_entry).
    pub fn start_new_game(&mut self) {
        self.capture_pending_score();
        self.begin_game();
    }

    fn begin_game(&mut self) {
        let now = self.now();
        self.meta.reset_game(now);
        self.meta.roll_incoming(&mut self.rng);

        self.grid.clear();
        self.grid.calculate_incoming_positions(&mut self.rng);
        self.grid.preview_incoming(&self.meta.incoming);

        // Opening layout
        self.start_new_turn(true);

        self.meta.game_in_progress = true;
        self.meta.fresh = true;
        log::info!("New game on a {0}x{0} grid", self.grid.size());
    }

    /// Advance timers; ends the turn when its time limit ran out.
    /// Returns true if a new turn was started.
    pub fn tick(&mut self) -> bool {
        let now = self.now();
        self.meta.update_session_time(now);
        if self.meta.turn_time_exceeded(now) {
            log::debug!("Turn time limit reached");
            self.start_new_turn(true);
            return true;
        }
        false
    }

    // === Leaderboard ===

    pub fn is_score_eligible(&self, score: u32, grid_size: usize) -> bool {
        self.leaderboard.is_eligible(score, grid_size)
    }

    fn capture_pending_score(&mut self) {
        let score = self.meta.score;
        let grid_size = self.grid.size();
        if score == 0 || !self.is_score_eligible(score, grid_size) {
            return;
        }
        self.meta.update_session_time(self.now());
        log::info!("Score {} qualifies for the leaderboard", score);
        if self.pending.is_some() {
            let name = self.meta.player_name.clone();
            log::info!("Recording uncommitted score under {}", name);
            self.commit_score_entry(&name);
        }
        self.pending = Some(PendingScore {
            score,
            grid_size,
            turn_time_limit: self.meta.turn_time_enabled.then_some(self.meta.turn_time_limit),
            total_time_ms: self.meta.total_game_time(),
            game_start_ms: self.meta.game_start_ms,
        });
    }

    /// The finished game waiting for a player name, if any
    pub fn pending_score(&self) -> Option<&PendingScore> {
        self.pending.as_ref()
    }

    /// Record the pending score under `name`. Returns the rank achieved.
    pub fn commit_score_entry(&mut self, name: &str) -> Option<usize> {
        let pending = self.pending.take()?;
        let name = name.trim();
        if !name.is_empty() {
            self.meta.player_name = name.to_string();
        }
        let entry = ScoreEntry {
            player: self.meta.player_name.clone(),
            score: pending.score,
            grid_size: pending.grid_size,
            turn_time_limit: pending.turn_time_limit,
            total_time: format_duration(pending.total_time_ms),
            date: format_date(pending.game_start_ms),
        };
        self.leaderboard.add_entry(entry)
    }

    pub fn discard_pending_score(&mut self) {
        self.pending = None;
    }

    pub fn reset_leaderboard(&mut self) {
        self.leaderboard.reset();
    }

    // === Settings ===

    /// Apply player settings. A board size change starts a new game.
    pub fn apply_settings(&mut self, settings: &Settings) {
        let settings = settings.clamped();
        self.meta.show_incoming_colors = settings.show_incoming_colors;
        self.meta.show_incoming_positions = settings.show_incoming_positions;
        self.meta.highlight_enabled = settings.highlight_enabled;
        self.meta.turn_time_enabled = settings.turn_time_enabled;
        self.meta.turn_time_limit = settings.turn_time_limit;
        if let Some(name) = &settings.player_name {
            self.meta.player_name = name.clone();
        }

        if settings.board_size != self.grid.size() {
            self.capture_pending_score();
            self.config.board_size = settings.board_size;
            self.grid.set_size(settings.board_size);
            self.scanner.resize(settings.board_size);
            self.begin_game();
        }
    }

    // === Persistence ===

    /// Rebuild an engine from saved snapshots.
    ///
    /// Grid and session must both load and share an instance id, otherwise
    /// both are discarded and a new game starts.
    pub fn restore(
        store: &dyn SnapshotStore,
        config: EngineConfig,
        seed: u64,
        clock: impl Clock + 'static,
    ) -> Self {
        let leaderboard = match store.load(SnapshotKind::Leaderboard) {
            Some(Snapshot::Leaderboard(mut board)) => {
                board.set_capacity(config.leaderboard_capacity);
                board
            }
            _ => Leaderboard::new(config.leaderboard_capacity),
        };
        let grid = match store.load(SnapshotKind::Grid) {
            Some(Snapshot::Grid(grid))
                if grid.is_consistent()
                    && (MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&grid.size()) =>
            {
                Some(grid)
            }
            Some(_) => {
                log::warn!("Saved grid is malformed, discarding it");
                None
            }
            None => None,
        };
        let meta = match store.load(SnapshotKind::Session) {
            Some(Snapshot::Session(meta)) => Some(meta),
            _ => None,
        };

        let (grid, mut meta) = match (grid, meta) {
            (Some(grid), Some(meta)) if grid.instance_id() == meta.instance_id => (grid, meta),
            (Some(grid), Some(meta)) => {
                log::warn!(
                    "Saved game out of sync (grid {}, session {}), starting over",
                    grid.instance_id(),
                    meta.instance_id
                );
                return Self::restart(config, seed, clock, leaderboard);
            }
            _ => {
                log::info!("No saved game, starting over");
                return Self::restart(config, seed, clock, leaderboard);
            }
        };

        let now = clock.now_ms();
        meta.resume_session(now);
        meta.rng_state = RngState { seed };
        meta.game_in_progress = true;

        let config = EngineConfig {
            board_size: grid.size(),
            tokens_per_turn: grid.incoming_positions().len(),
            ..config
        };
        let mut engine = Self {
            config,
            scanner: RunScanner::new(grid.size(), config.min_run_length),
            grid,
            meta,
            leaderboard,
            pending: None,
            rng: Pcg32::seed_from_u64(seed),
            clock: Box::new(clock),
        };

        // Reachability is not persisted
        match engine.meta.selection() {
            Some(pos) if !engine.grid.is_empty_at(pos) => engine.grid.compute_reachability(pos),
            Some(_) => engine.cancel_turn(),
            None => {}
        }
        log::info!("Restored game instance {}", engine.grid.instance_id());
        engine
    }

    fn restart(
        config: EngineConfig,
        seed: u64,
        clock: impl Clock + 'static,
        leaderboard: Leaderboard,
    ) -> Self {
        let mut engine = Self::fresh(config, seed, Box::new(clock), leaderboard);
        engine.begin_game();
        engine
    }

    /// Save grid, session and leaderboard. True if every snapshot was written.
    pub fn save(&self, store: &mut dyn SnapshotStore) -> bool {
        let snapshots = [
            Snapshot::Grid(self.grid.clone()),
            Snapshot::Session(self.meta.clone()),
            Snapshot::Leaderboard(self.leaderboard.clone()),
        ];
        snapshots
            .iter()
            .fold(true, |ok, snapshot| store.save(snapshot) && ok)
    }
}
