use std::collections::VecDeque;

use crate::model::Snapshot;

/// Maximum number of snapshots retained; the oldest entry is evicted once
/// the buffer is full.
pub const HISTORY_CAPACITY: usize = 100;

/// Insertion-ordered rolling buffer of snapshots.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    snapshots: VecDeque<Snapshot>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            snapshots: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > HISTORY_CAPACITY {
            self.snapshots.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// The last `min(days, len)` snapshots, oldest first.
    pub fn tail(&self, days: usize) -> impl Iterator<Item = &Snapshot> {
        let skip = self.snapshots.len().saturating_sub(days);
        self.snapshots.iter().skip(skip)
    }

    /// Owned copies of the whole buffer, oldest first.
    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.snapshots.iter().cloned().collect()
    }
}
