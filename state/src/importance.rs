//! Rolling importance snapshots for an account.

use ember_types::{Importance, ImportanceHeight};
use serde::{Deserialize, Serialize};

/// Number of snapshots retained (current plus history).
const SNAPSHOT_CAPACITY: usize = 3;

/// A single importance value recorded at a recalculation height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceSnapshot {
    pub importance: Importance,
    pub height: ImportanceHeight,
}

/// The current importance of an account together with a short history,
/// newest first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceSnapshots {
    snapshots: Vec<ImportanceSnapshot>,
}

impl ImportanceSnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current importance, zero when no snapshot was ever recorded.
    pub fn current(&self) -> Importance {
        self.snapshots
            .first()
            .map(|snapshot| snapshot.importance)
            .unwrap_or(Importance::ZERO)
    }

    /// The recalculation height of the current snapshot.
    pub fn height(&self) -> ImportanceHeight {
        self.snapshots
            .first()
            .map(|snapshot| snapshot.height)
            .unwrap_or(ImportanceHeight::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Record a new snapshot.
    ///
    /// # Panics
    /// Panics if `height` is not strictly greater than the current snapshot
    /// height; recalculations always move forward, so a non-increasing
    /// height indicates observer-ordering corruption.
    pub fn set(&mut self, importance: Importance, height: ImportanceHeight) {
        assert!(
            self.snapshots.is_empty() || self.height() < height,
            "importance snapshot height {} must exceed current height {}",
            height,
            self.height()
        );

        self.snapshots.insert(0, ImportanceSnapshot { importance, height });
        self.snapshots.truncate(SNAPSHOT_CAPACITY);
    }

    /// Remove the current snapshot, reverting to the previous one. Used when
    /// a block that carried a recalculation is rolled back.
    pub fn pop(&mut self) {
        if !self.snapshots.is_empty() {
            self.snapshots.remove(0);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportanceSnapshot> {
        self.snapshots.iter()
    }
}
