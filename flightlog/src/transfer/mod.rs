//! Chunked log transfer over a lossy link.
//!
//! This module provides the pieces of a single in-flight download:
//! - Received-chunk bookkeeping (`tracker`)
//! - Gap detection and re-request planning (`repair`)
//! - The active download with its destination file (`session`)
//! - Progress and completion reporting (`progress`)
//! - Rate limiting of progress reports (`throttle`)
//!
//! # Architecture
//!
//! ```text
//! TransferSession
//!         │
//!         ├── File (destination, closed when the session is dropped)
//!         │
//!         ├── ChunkTracker (received chunk indices)
//!         │
//!         └── plan_repair() ──► RepairPlan ──► data requests
//! ```
//!
//! The remote delivers logs in fixed [`CHUNK_SIZE`] pieces addressed by byte
//! offset. A chunk shorter than [`CHUNK_SIZE`] or an empty payload marks the
//! end of the file.

mod error;
mod progress;
mod repair;
mod session;
mod throttle;
mod tracker;

pub use error::{TransferError, TransferResult};
pub use progress::{CompletionSummary, ProgressReport};
pub use repair::{plan_repair, ByteRange, RepairPlan};
pub use session::{DataOutcome, TransferSession};
pub use throttle::StatusThrottle;
pub use tracker::ChunkTracker;

use std::time::Duration;

/// Size of one data chunk in bytes.
pub const CHUNK_SIZE: u32 = 90;

/// Request length meaning "everything from the offset to end of file".
pub const FULL_RANGE: u32 = 0xFFFF_FFFF;

/// Silence after which gap repair runs.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(700);

/// Minimum interval between progress reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(500);

/// Maximum number of re-requests issued by one repair pass.
pub const DEFAULT_MAX_REPAIR_REQUESTS: usize = 20;

/// Chunk index that contains the given byte offset.
pub fn chunk_index(offset: u32) -> u32 {
    offset / CHUNK_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_index() {
        assert_eq!(chunk_index(0), 0);
        assert_eq!(chunk_index(89), 0);
        assert_eq!(chunk_index(90), 1);
        assert_eq!(chunk_index(180), 2);
    }
}
