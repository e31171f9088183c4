//! Catalog of logs known to be stored on the remote.
//!
//! The catalog is filled by a listing exchange: the engine sends a list
//! request and the remote answers with one entry per stored log. Entries are
//! keyed by id and a repeated entry for the same id overwrites the old one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::DateTime;

/// Identifier of a log on the remote.
pub type LogId = u16;

/// One log stored on the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Stable handle used in all requests.
    pub id: LogId,
    /// Number of logs the remote reports in total.
    pub total_count: u16,
    /// Highest id known to the remote.
    pub last_id: LogId,
    /// Log size in bytes.
    pub size_bytes: u32,
    /// Creation time as seconds since the Unix epoch, 0 when unknown.
    pub time_utc: u32,
}

impl CatalogEntry {
    /// Creation time rendered like `ctime(3)` in UTC, or `None` when unknown.
    pub fn time_string(&self) -> Option<String> {
        if self.time_utc == 0 {
            return None;
        }
        DateTime::from_timestamp(i64::from(self.time_utc), 0)
            .map(|t| t.format("%a %b %e %H:%M:%S %Y").to_string())
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {}  numLogs {} lastLog {} size {} {}",
            self.id,
            self.total_count,
            self.last_id,
            self.size_bytes,
            self.time_string().unwrap_or_default()
        )
    }
}

/// What happened when an entry was offered to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The entry was inserted or replaced an older one.
    Recorded,
    /// The remote reports that it stores no logs; nothing was recorded.
    NoLogs,
}

/// Known remote logs, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<LogId, CatalogEntry>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Insert or overwrite an entry.
    pub fn record(&mut self, entry: CatalogEntry) -> RecordOutcome {
        if entry.total_count == 0 {
            return RecordOutcome::NoLogs;
        }
        self.entries.insert(entry.id, entry);
        RecordOutcome::Recorded
    }

    /// Look up an entry.
    pub fn get(&self, id: LogId) -> Option<&CatalogEntry> {
        self.entries.get(&id)
    }

    /// Declared size of a log, if it is known.
    pub fn size_of(&self, id: LogId) -> Option<u64> {
        self.get(id).map(|e| u64::from(e.size_bytes))
    }

    /// Number of known logs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no logs are known.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in id order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    /// Ids ordered by creation time, oldest first; equal times by id.
    pub fn ids_sorted_by_time(&self) -> Vec<LogId> {
        let mut ids: Vec<LogId> = self.entries.keys().copied().collect();
        // Keys come out in id order and the sort is stable, so ties keep it.
        ids.sort_by_key(|id| self.entries[id].time_utc);
        ids
    }

    /// Id of the most recently created log.
    pub fn latest_id(&self) -> Option<LogId> {
        self.ids_sorted_by_time().last().copied()
    }
}
