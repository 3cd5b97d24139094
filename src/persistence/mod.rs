//! Snapshot persistence
//!
//! The grid, the session and the leaderboard are saved as separate snapshots.
//! Grid and session share an instance id so a half-written save is detected
//! on restore. Stores swallow their errors: a failed load reads as "nothing
//! saved" and a failed save returns false.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{Grid, SessionMeta};
use crate::leaderboard::Leaderboard;

/// Which snapshot a store slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapshotKind {
    Grid,
    Session,
    Leaderboard,
}

impl SnapshotKind {
    pub const ALL: [SnapshotKind; 3] = [
        SnapshotKind::Grid,
        SnapshotKind::Session,
        SnapshotKind::Leaderboard,
    ];

    /// Storage key for this kind
    pub fn storage_key(self) -> &'static str {
        match self {
            SnapshotKind::Grid => "lines_grid",
            SnapshotKind::Session => "lines_session",
            SnapshotKind::Leaderboard => "lines_leaderboard",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A persisted entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Snapshot {
    Grid(Grid),
    Session(SessionMeta),
    Leaderboard(Leaderboard),
}

impl Snapshot {
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Snapshot::Grid(_) => SnapshotKind::Grid,
            Snapshot::Session(_) => SnapshotKind::Session,
            Snapshot::Leaderboard(_) => SnapshotKind::Leaderboard,
        }
    }
}

/// Errors that can occur while encoding or decoding snapshots
#[derive(Debug, Error)]
pub enum StoreError {
    /// The snapshot could not be serialized
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The stored data is not a valid snapshot
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),

    /// The stored snapshot is of a different kind than its slot
    #[error("Expected a {expected} snapshot, found {found}")]
    KindMismatch {
        expected: SnapshotKind,
        found: SnapshotKind,
    },
}

/// Load/save collaborator of the engine
pub trait SnapshotStore {
    /// The saved snapshot of `kind`, `None` if absent or unreadable
    fn load(&self, kind: SnapshotKind) -> Option<Snapshot>;

    /// Persist a snapshot, replacing the previous one of its kind
    fn save(&mut self, snapshot: &Snapshot) -> bool;
}

pub fn encode(snapshot: &Snapshot) -> Result<String, StoreError> {
    serde_json::to_string(snapshot).map_err(StoreError::Encode)
}

pub fn decode(kind: SnapshotKind, json: &str) -> Result<Snapshot, StoreError> {
    let snapshot: Snapshot = serde_json::from_str(json).map_err(StoreError::Decode)?;
    if snapshot.kind() != kind {
        return Err(StoreError::KindMismatch {
            expected: kind,
            found: snapshot.kind(),
        });
    }
    Ok(snapshot)
}

/// In-memory store of JSON snapshots, one per kind
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<&'static str, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON stored for `kind`
    pub fn raw(&self, kind: SnapshotKind) -> Option<&str> {
        self.slots.get(kind.storage_key()).map(String::as_str)
    }

    /// Overwrite the raw JSON for `kind`
    pub fn set_raw(&mut self, kind: SnapshotKind, json: impl Into<String>) {
        self.slots.insert(kind.storage_key(), json.into());
    }

    pub fn remove(&mut self, kind: SnapshotKind) -> bool {
        self.slots.remove(kind.storage_key()).is_some()
    }

    pub fn try_load(&self, kind: SnapshotKind) -> Result<Option<Snapshot>, StoreError> {
        self.raw(kind).map(|json| decode(kind, json)).transpose()
    }

    pub fn try_save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = encode(snapshot)?;
        self.set_raw(snapshot.kind(), json);
        Ok(())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, kind: SnapshotKind) -> Option<Snapshot> {
        match self.try_load(kind) {
            Ok(Some(snapshot)) => {
                log::info!("Loaded {} snapshot", kind);
                Some(snapshot)
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("Discarding {} snapshot: {}", kind, err);
                None
            }
        }
    }

    fn save(&mut self, snapshot: &Snapshot) -> bool {
        match self.try_save(snapshot) {
            Ok(()) => {
                log::debug!("Saved {} snapshot", snapshot.kind());
                true
            }
            Err(err) => {
                log::warn!("Failed to save {} snapshot: {}", snapshot.kind(), err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Pos, Token};
    use crate::leaderboard::ScoreEntry;

    #[test]
    fn test_missing_snapshot() {
        let store = MemoryStore::new();
        for kind in SnapshotKind::ALL {
            assert!(store.load(kind).is_none());
        }
    }

    #[test]
    fn test_grid_snapshot_keeps_tokens() {
        let mut grid = Grid::new(9, 3, 42);
        grid.place(Pos::new(3, 4), Token::Orange);
        let mut store = MemoryStore::new();
        assert!(store.save(&Snapshot::Grid(grid)));

        let Some(Snapshot::Grid(loaded)) = store.load(SnapshotKind::Grid) else {
            panic!("grid snapshot missing");
        };
        assert_eq!(loaded.instance_id(), 42);
        assert_eq!(loaded.occupant(Pos::new(3, 4)), Some(Token::Orange));
        // Reachability is rebuilt, not stored
        assert!(!loaded.is_reachable(Pos::new(0, 0)));
    }

    #[test]
    fn test_session_snapshot_keeps_selection() {
        let mut meta = SessionMeta::new(7, 1, 3, 1_000);
        meta.select(Pos::new(2, 2));
        meta.score = 99;
        let mut store = MemoryStore::new();
        assert!(store.save(&Snapshot::Session(meta)));

        let Some(Snapshot::Session(loaded)) = store.load(SnapshotKind::Session) else {
            panic!("session snapshot missing");
        };
        assert_eq!(loaded.instance_id, 7);
        assert_eq!(loaded.score, 99);
        assert_eq!(loaded.selection(), Some(Pos::new(2, 2)));
    }

    #[test]
    fn test_leaderboard_snapshot() {
        let mut board = Leaderboard::default();
        board.add_entry(ScoreEntry {
            player: "Ada".to_string(),
            score: 12,
            grid_size: 9,
            turn_time_limit: Some(30),
            total_time: "00:02:00".to_string(),
            date: "2024-03-01".to_string(),
        });
        let mut store = MemoryStore::new();
        assert!(store.save(&Snapshot::Leaderboard(board)));

        let Some(Snapshot::Leaderboard(loaded)) = store.load(SnapshotKind::Leaderboard) else {
            panic!("leaderboard snapshot missing");
        };
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.top().map(|e| e.turn_time_label()), Some("30".to_string()));
    }

    #[test]
    fn test_corrupt_snapshot_reads_as_missing() {
        let mut store = MemoryStore::new();
        store.set_raw(SnapshotKind::Grid, "{ not json");
        assert!(matches!(
            store.try_load(SnapshotKind::Grid),
            Err(StoreError::Decode(_))
        ));
        assert!(store.load(SnapshotKind::Grid).is_none());
    }

    #[test]
    fn test_kind_mismatch() {
        let mut store = MemoryStore::new();
        let json = encode(&Snapshot::Leaderboard(Leaderboard::default())).unwrap();
        store.set_raw(SnapshotKind::Session, json);
        assert!(matches!(
            store.try_load(SnapshotKind::Session),
            Err(StoreError::KindMismatch {
                expected: SnapshotKind::Session,
                found: SnapshotKind::Leaderboard,
            })
        ));
        assert!(store.load(SnapshotKind::Session).is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        assert!(store.save(&Snapshot::Leaderboard(Leaderboard::default())));
        assert!(store.remove(SnapshotKind::Leaderboard));
        assert!(!store.remove(SnapshotKind::Leaderboard));
        assert!(store.raw(SnapshotKind::Leaderboard).is_none());
    }
}
