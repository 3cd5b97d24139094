//! Leaderboard
//!
//! Capacity-bounded and always sorted best-first. A smaller grid always ranks
//! above a larger one; on equal grids the higher score wins.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::LEADERBOARD_CAPACITY;

/// A single finished game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player: String,
    pub score: u32,
    pub grid_size: usize,
    /// Turn time limit in seconds, `None` when the limit was off
    pub turn_time_limit: Option<u32>,
    /// Total elapsed game time, `HH:MM:SS`
    pub total_time: String,
    /// Game start date, `YYYY-MM-DD`
    pub date: String,
}

impl ScoreEntry {
    /// `Greater` means `self` ranks above `other`
    pub fn compare(&self, other: &ScoreEntry) -> Ordering {
        other
            .grid_size
            .cmp(&self.grid_size)
            .then_with(|| self.score.cmp(&other.score))
    }

    pub fn turn_time_label(&self) -> String {
        match self.turn_time_limit {
            Some(secs) => secs.to_string(),
            None => "N/A".to_string(),
        }
    }
}

impl fmt::Display for ScoreEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}x{}, turn {}, {}, {})",
            self.player,
            self.score,
            self.grid_size,
            self.grid_size,
            self.turn_time_label(),
            self.total_time,
            self.date
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    capacity: usize,
    entries: Vec<ScoreEntry>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(LEADERBOARD_CAPACITY)
    }
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the lowest entries that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn top(&self) -> Option<&ScoreEntry> {
        self.entries.first()
    }

    /// Whether a finished game would make it onto the board.
    ///
    /// Always true while the board has room; otherwise the candidate must
    /// beat the score of some entry on the same or a larger grid.
    pub fn is_eligible(&self, score: u32, grid_size: usize) -> bool {
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries
            .iter()
            .any(|e| e.score < score && e.grid_size >= grid_size)
    }

    /// Rank (1-indexed) a score would get, `None` if not eligible
    pub fn potential_rank(&self, score: u32, grid_size: usize) -> Option<usize> {
        if !self.is_eligible(score, grid_size) {
            return None;
        }
        let ahead = self
            .entries
            .iter()
            .filter(|e| {
                e.grid_size < grid_size || (e.grid_size == grid_size && e.score >= score)
            })
            .count();
        Some(ahead + 1)
    }

    /// Insert, re-sort best-first and trim to capacity.
    /// Returns the rank achieved (1-indexed) or `None` if trimmed off.
    pub fn add_entry(&mut self, entry: ScoreEntry) -> Option<usize> {
        let position = self
            .entries
            .iter()
            .filter(|e| e.compare(&entry) != Ordering::Less)
            .count();

        log::info!("Leaderboard entry: {}", entry);
        self.entries.push(entry);
        self.entries.sort_by(|a, b| b.compare(a));
        self.entries.truncate(self.capacity);

        (position < self.capacity).then_some(position + 1)
    }

    /// Remove every entry
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entry(score: u32, grid_size: usize) -> ScoreEntry {
        ScoreEntry {
            player: format!("p{}", score),
            score,
            grid_size,
            turn_time_limit: None,
            total_time: "00:01:00".to_string(),
            date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_compare_same_size_by_score() {
        assert_eq!(entry(15, 9).compare(&entry(155, 9)), Ordering::Less);
        assert_eq!(entry(155, 9).compare(&entry(15, 9)), Ordering::Greater);
        assert_eq!(entry(15, 9).compare(&entry(15, 9)), Ordering::Equal);
    }

    #[test]
    fn test_compare_smaller_grid_wins() {
        assert_eq!(entry(5, 12).compare(&entry(5, 9)), Ordering::Less);
        assert_eq!(entry(1, 9).compare(&entry(1000, 12)), Ordering::Greater);
    }

    #[test]
    fn test_add_sorts_best_first() {
        let mut board = Leaderboard::default();
        board.add_entry(entry(1000, 12));
        board.add_entry(entry(15, 9));
        board.add_entry(entry(155, 9));
        board.add_entry(entry(1, 9));

        let order: Vec<(u32, usize)> = board
            .entries()
            .iter()
            .map(|e| (e.score, e.grid_size))
            .collect();
        assert_eq!(order, vec![(155, 9), (15, 9), (1, 9), (1000, 12)]);
        assert_eq!(board.top().map(|e| e.score), Some(155));
    }

    #[test]
    fn test_trim_drops_lowest() {
        let mut board = Leaderboard::new(10);
        for score in 1..=10 {
            board.add_entry(entry(score * 10, 9));
        }
        assert!(board.is_full());

        // The 11th entry outranks the 10-point entry only
        assert_eq!(board.add_entry(entry(15, 9)), Some(10));
        assert_eq!(board.len(), 10);
        assert!(board.entries().iter().all(|e| e.score != 10));
        assert_eq!(board.entries().last().map(|e| e.score), Some(15));
    }

    #[test]
    fn test_add_below_full_board_is_dropped() {
        let mut board = Leaderboard::new(2);
        board.add_entry(entry(50, 9));
        board.add_entry(entry(40, 9));
        assert_eq!(board.add_entry(entry(10, 9)), None);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_eligibility() {
        let mut board = Leaderboard::new(3);
        assert!(board.is_eligible(0, 12));

        board.add_entry(entry(20, 9));
        board.add_entry(entry(30, 10));
        board.add_entry(entry(40, 12));
        assert!(board.is_full());

        // Beats the 12-grid entry on a smaller grid
        assert!(board.is_eligible(41, 11));
        // Higher than everything but on a bigger grid than all of them
        assert!(!board.is_eligible(1000, 13));
        // Must be strictly higher
        assert!(!board.is_eligible(20, 9));
        assert!(board.is_eligible(21, 9));
    }

    #[test]
    fn test_potential_rank() {
        let mut board = Leaderboard::new(3);
        board.add_entry(entry(20, 9));
        board.add_entry(entry(50, 9));
        assert_eq!(board.potential_rank(30, 9), Some(2));
        assert_eq!(board.potential_rank(5, 12), Some(3));
        board.add_entry(entry(10, 9));
        assert_eq!(board.potential_rank(5, 9), None);
    }

    #[test]
    fn test_set_capacity_trims() {
        let mut board = Leaderboard::new(5);
        for score in 1..=5 {
            board.add_entry(entry(score, 9));
        }
        board.set_capacity(3);
        assert_eq!(board.capacity(), 3);
        let scores: Vec<u32> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![5, 4, 3]);
        assert!(board.is_full());
    }

    #[test]
    fn test_reset() {
        let mut board = Leaderboard::default();
        board.add_entry(entry(10, 9));
        board.reset();
        assert!(board.is_empty());
    }

    proptest! {
        #[test]
        fn prop_sorted_and_bounded(adds in prop::collection::vec((0u32..500, 9usize..=12), 0..40)) {
            let mut board = Leaderboard::new(10);
            for (score, size) in adds.iter().copied() {
                board.add_entry(entry(score, size));
            }
            prop_assert_eq!(board.len(), adds.len().min(10));
            for pair in board.entries().windows(2) {
                prop_assert_ne!(pair[0].compare(&pair[1]), Ordering::Less);
            }
        }
    }
}
