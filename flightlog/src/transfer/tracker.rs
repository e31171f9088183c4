//! Received-chunk bookkeeping for the in-flight download.

use std::collections::BTreeSet;

/// Set of chunk indices received so far.
///
/// Inserting an index twice is a no-op, so retransmitted chunks never
/// inflate the count used by the completion test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTracker {
    received: BTreeSet<u32>,
}

impl ChunkTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received chunk. Returns `false` if it was already present.
    pub fn insert(&mut self, index: u32) -> bool {
        self.received.insert(index)
    }

    /// Check whether a chunk has been received.
    pub fn contains(&self, index: u32) -> bool {
        self.received.contains(&index)
    }

    /// Number of distinct chunks received.
    pub fn len(&self) -> usize {
        self.received.len()
    }

    /// Check if no chunk has been received.
    pub fn is_empty(&self) -> bool {
        self.received.is_empty()
    }

    /// Highest chunk index received, if any.
    pub fn highest(&self) -> Option<u32> {
        self.received.last().copied()
    }

    /// Forget every received chunk.
    pub fn clear(&mut self) {
        self.received.clear();
    }

    /// Indices strictly below the highest received chunk that are missing.
    pub fn missing(&self) -> Vec<u32> {
        let Some(highest) = self.highest() else {
            return Vec::new();
        };
        (0..highest).filter(|i| !self.contains(*i)).collect()
    }

    /// Number of missing indices below the highest received chunk.
    pub fn missing_count(&self) -> usize {
        match self.highest() {
            // Every received index other than the highest lies below it.
            Some(highest) => highest as usize + 1 - self.received.len(),
            None => 0,
        }
    }

    /// Missing indices coalesced into maximal inclusive runs, lowest first.
    pub fn missing_runs(&self) -> Vec<(u32, u32)> {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for index in self.missing() {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == index => *end = index,
                _ => runs.push((index, index)),
            }
        }
        runs
    }
}
