//! Bounded history of monitoring cycles.

use std::collections::VecDeque;
use vigil_core::{HistoryEntry, Time};

/// Default number of retained entries.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// FIFO ring buffer of past snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryRecorder {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRecorder {
    /// Create a recorder holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting and returning the oldest one when full.
    pub fn record(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    /// Copy of all entries, oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Timestamp of the oldest retained entry.
    pub fn earliest_timestamp(&self) -> Option<Time> {
        self.entries.front().map(|e| e.timestamp)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries were recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
