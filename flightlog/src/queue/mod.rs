//! Queue of logs waiting to be downloaded.
//!
//! # Design
//!
//! - Pure synchronous state (no I/O); the engine applies the skip rule and
//!   starts transfers
//! - Each bulk enqueue replaces the whole queue
//! - Ids are served from the back of the stored list
//!
//! # Service Order
//!
//! - `enqueue_all` / `enqueue_from`: most recent log first
//! - `enqueue_range`: ascending id, `first` before `last`

use crate::catalog::{Catalog, LogId};
use crate::engine::{EngineError, EngineResult};

/// Pending log ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadQueue {
    // Served from the end.
    pending: Vec<LogId>,
}

impl DownloadQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every catalog entry, newest served first.
    pub fn enqueue_all(&mut self, catalog: &Catalog) -> EngineResult<()> {
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        self.pending = catalog.ids_sorted_by_time();
        Ok(())
    }

    /// Queue the inclusive id range `first..=last`, served in ascending order.
    ///
    /// `first > last` leaves the queue empty.
    pub fn enqueue_range(&mut self, first: LogId, last: LogId) {
        self.pending = (first..=last).rev().collect();
    }

    /// Queue the catalog entries after skipping the `start_index` oldest.
    ///
    /// `start_index` is a position in the time-sorted list, not a log id.
    /// Service order is newest first, as with [`enqueue_all`](Self::enqueue_all).
    pub fn enqueue_from(&mut self, catalog: &Catalog, start_index: usize) -> EngineResult<()> {
        if catalog.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }
        let sorted = catalog.ids_sorted_by_time();
        self.pending = sorted.into_iter().skip(start_index).collect();
        Ok(())
    }

    /// Pop the next id to serve.
    pub fn advance(&mut self) -> Option<LogId> {
        self.pending.pop()
    }

    /// Ids still waiting, in service order.
    pub fn pending(&self) -> Vec<LogId> {
        self.pending.iter().rev().copied().collect()
    }

    /// Number of ids waiting.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every pending id.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
