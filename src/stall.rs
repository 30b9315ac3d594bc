//! Single-slot snapshot cache for the stall deployment variant
//!
//! One snapshot for the entire process, last write wins, no history. Readers
//! observe either the previous or the new snapshot, never a mix of bytes from
//! one and timestamp from the other.

use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

/// The most recent stall result
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    /// Unix seconds; never decreases across snapshots
    pub timestamp: i64,
}

/// Atomically-replaceable cell holding the latest snapshot
pub struct SnapshotCache {
    slot: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Replace the snapshot wholesale, returning the recorded timestamp.
    pub fn store(&self, bytes: Vec<u8>) -> i64 {
        let mut slot = self.slot.write();
        let previous = slot.as_ref().map(|s| s.timestamp).unwrap_or(0);
        let timestamp = Utc::now().timestamp().max(previous);
        *slot = Some(Arc::new(Snapshot { bytes, timestamp }));
        timestamp
    }

    /// The current snapshot, if one has ever been written
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.slot.read().clone()
    }

    /// Timestamp of the current snapshot, 0 if none exists
    pub fn timestamp(&self) -> i64 {
        self.slot.read().as_ref().map(|s| s.timestamp).unwrap_or(0)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
