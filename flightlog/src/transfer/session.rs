//! The single active log download.
//!
//! A `TransferSession` exists only while a download is active. It owns the
//! destination file, so dropping the session (on completion, cancellation or
//! replacement) always closes the file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use super::error::{TransferError, TransferResult};
use super::progress::{kilobytes_per_second, CompletionSummary, ProgressReport};
use super::repair::{plan_repair, ByteRange};
use super::tracker::ChunkTracker;
use super::{chunk_index, CHUNK_SIZE};
use crate::catalog::LogId;

/// Result of ingesting one data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOutcome {
    /// More data is expected.
    InProgress,
    /// The remote signalled end of file and every chunk has arrived.
    Complete,
}

/// State of the active download.
#[derive(Debug)]
pub struct TransferSession {
    log_id: LogId,
    path: PathBuf,
    file: File,
    write_cursor: u32,
    bytes_on_disk: u64,
    tracker: ChunkTracker,
    started_at: Instant,
    last_data_at: Instant,
    retry_count: u32,
}

impl TransferSession {
    /// Start a download of `log_id` into `path`, truncating any existing file.
    ///
    /// The caller is responsible for sending the initial full-range request.
    pub fn start(log_id: LogId, path: impl Into<PathBuf>, now: Instant) -> TransferResult<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| TransferError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            log_id,
            path,
            file,
            write_cursor: 0,
            bytes_on_disk: 0,
            tracker: ChunkTracker::new(),
            started_at: now,
            last_data_at: now,
            retry_count: 0,
        })
    }

    /// Ingest one data packet.
    ///
    /// The sender's offset is trusted over the local cursor, so reordered and
    /// retransmitted chunks land where they belong. Any packet, even an empty
    /// one, resets the idle clock.
    pub fn on_data(
        &mut self,
        offset: u32,
        payload: &[u8],
        now: Instant,
    ) -> TransferResult<DataOutcome> {
        if offset != self.write_cursor {
            self.file
                .seek(SeekFrom::Start(u64::from(offset)))
                .map_err(|source| TransferError::Seek {
                    path: self.path.clone(),
                    offset,
                    source,
                })?;
            self.write_cursor = offset;
        }

        if !payload.is_empty() {
            self.file
                .write_all(payload)
                .map_err(|source| TransferError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            self.tracker.insert(chunk_index(offset));
            let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
            self.write_cursor = self.write_cursor.saturating_add(len);
            self.bytes_on_disk = self
                .bytes_on_disk
                .max(u64::from(offset) + payload.len() as u64);
        }

        self.last_data_at = now;

        if self.is_final_packet(offset, payload) {
            Ok(DataOutcome::Complete)
        } else {
            Ok(DataOutcome::InProgress)
        }
    }

    /// Completion test: an explicit empty end-of-file packet, or a short
    /// chunk with every chunk up to and including it received.
    fn is_final_packet(&self, offset: u32, payload: &[u8]) -> bool {
        if payload.is_empty() {
            return true;
        }
        payload.len() < CHUNK_SIZE as usize
            && self.tracker.len() == 1 + chunk_index(offset) as usize
    }

    /// Run gap repair if the link has been silent for longer than `timeout`.
    ///
    /// Returns the byte ranges to re-request; empty when the link is not yet
    /// considered silent or nothing has been received.
    pub fn on_idle_tick(
        &mut self,
        now: Instant,
        timeout: Duration,
        max_requests: usize,
    ) -> Vec<ByteRange> {
        if now.saturating_duration_since(self.last_data_at) <= timeout {
            return Vec::new();
        }
        self.last_data_at = now;

        let requests = plan_repair(&self.tracker, max_requests).requests();
        let issued = u32::try_from(requests.len()).unwrap_or(u32::MAX);
        self.retry_count = self.retry_count.saturating_add(issued);

        if !requests.is_empty() {
            debug!(
                log_id = self.log_id,
                requests = requests.len(),
                retries = self.retry_count,
                "Re-requesting missing log data"
            );
        }
        requests
    }

    /// Snapshot the download without side effects.
    ///
    /// `declared_size` is the catalog size for this log, if known.
    pub fn progress(&self, declared_size: Option<u64>, now: Instant) -> ProgressReport {
        let elapsed = now.saturating_duration_since(self.started_at);
        ProgressReport {
            log_id: self.log_id,
            path: self.path.clone(),
            bytes_written: self.bytes_on_disk,
            total_size: declared_size.unwrap_or(0),
            percent: ProgressReport::percent_of(self.bytes_on_disk, declared_size),
            elapsed,
            throughput_kb_per_s: kilobytes_per_second(self.bytes_on_disk, elapsed),
            retry_count: self.retry_count,
            missing_chunk_count: self.tracker.missing_count(),
        }
    }

    /// Close the destination and summarise the finished download.
    pub fn finish(mut self, now: Instant) -> TransferResult<CompletionSummary> {
        self.file.flush().map_err(|source| TransferError::Close {
            path: self.path.clone(),
            source,
        })?;
        let elapsed = now.saturating_duration_since(self.started_at);
        Ok(CompletionSummary {
            log_id: self.log_id,
            path: self.path,
            size: self.bytes_on_disk,
            elapsed,
            throughput_kb_per_s: kilobytes_per_second(self.bytes_on_disk, elapsed),
            retry_count: self.retry_count,
        })
    }

    /// Abandon the download, closing the destination as it stands.
    pub fn cancel(self) -> (LogId, PathBuf) {
        (self.log_id, self.path)
    }

    /// Log being downloaded.
    pub fn log_id(&self) -> LogId {
        self.log_id
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next byte offset the session expects.
    pub fn write_cursor(&self) -> u32 {
        self.write_cursor
    }

    /// Received chunks.
    pub fn tracker(&self) -> &ChunkTracker {
        &self.tracker
    }

    /// Re-requests issued so far.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Bytes present in the destination.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_on_disk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_REPAIR_REQUESTS};
    use tempfile::TempDir;

    fn source_bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn chunk(data: &[u8], index: usize) -> &[u8] {
        let start = index * CHUNK_SIZE as usize;
        let end = (start + CHUNK_SIZE as usize).min(data.len());
        &data[start..end]
    }

    fn start_session(dir: &TempDir, now: Instant) -> TransferSession {
        TransferSession::start(3, dir.path().join("log3.bin"), now).unwrap()
    }

    #[test]
    fn test_start_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log3.bin");
        std::fs::write(&path, b"stale contents").unwrap();

        let session = TransferSession::start(3, &path, Instant::now()).unwrap();
        assert_eq!(session.write_cursor(), 0);
        assert_eq!(session.retry_count(), 0);
        assert!(session.tracker().is_empty());
        drop(session);

        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_start_fails_for_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = TransferSession::start(1, dir.path().join("nope/log1.bin"), Instant::now());
        assert!(matches!(result, Err(TransferError::Open { .. })));
    }

    #[test]
    fn test_in_order_delivery_completes_once() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(185);
        let mut session = start_session(&dir, now);

        assert_eq!(
            session.on_data(0, chunk(&data, 0), now).unwrap(),
            DataOutcome::InProgress
        );
        assert_eq!(
            session.on_data(90, chunk(&data, 1), now).unwrap(),
            DataOutcome::InProgress
        );
        assert_eq!(
            session.on_data(180, chunk(&data, 2), now).unwrap(),
            DataOutcome::Complete
        );

        let summary = session.finish(now).unwrap();
        assert_eq!(summary.size, 185);
        assert_eq!(std::fs::read(dir.path().join("log3.bin")).unwrap(), data);
    }

    #[test]
    fn test_short_chunk_with_gap_does_not_complete() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(185);
        let mut session = start_session(&dir, now);

        session.on_data(0, chunk(&data, 0), now).unwrap();
        let outcome = session.on_data(180, chunk(&data, 2), now).unwrap();
        assert_eq!(outcome, DataOutcome::InProgress);
        assert_eq!(session.tracker().missing(), vec![1]);

        // The hole is filled out of order; the short chunk already arrived,
        // so a full-size chunk does not end the transfer by itself.
        let outcome = session.on_data(90, chunk(&data, 1), now).unwrap();
        assert_eq!(outcome, DataOutcome::InProgress);
        assert_eq!(session.write_cursor(), 180);

        // Retransmission of the final chunk completes it.
        let outcome = session.on_data(180, chunk(&data, 2), now).unwrap();
        assert_eq!(outcome, DataOutcome::Complete);
        session.finish(now).unwrap();
        assert_eq!(std::fs::read(dir.path().join("log3.bin")).unwrap(), data);
    }

    #[test]
    fn test_empty_payload_marks_end_of_file() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(180);
        let mut session = start_session(&dir, now);

        session.on_data(0, chunk(&data, 0), now).unwrap();
        session.on_data(90, chunk(&data, 1), now).unwrap();
        assert_eq!(
            session.on_data(180, &[], now).unwrap(),
            DataOutcome::Complete
        );
        assert_eq!(session.write_cursor(), 180);
        assert_eq!(session.tracker().len(), 2);
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(270);
        let mut session = start_session(&dir, now);

        session.on_data(0, chunk(&data, 0), now).unwrap();
        session.on_data(90, chunk(&data, 1), now).unwrap();
        let cursor = session.write_cursor();
        let count = session.tracker().len();

        session.on_data(90, chunk(&data, 1), now).unwrap();
        assert_eq!(session.write_cursor(), cursor);
        assert_eq!(session.tracker().len(), count);
        assert_eq!(session.bytes_written(), 180);

        session.on_data(180, chunk(&data, 2), now).unwrap();
        session.on_data(270, &[], now).unwrap();
        session.finish(now).unwrap();
        assert_eq!(std::fs::read(dir.path().join("log3.bin")).unwrap(), data);
    }

    #[test]
    fn test_idle_tick_waits_for_silence() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(185);
        let mut session = start_session(&dir, now);
        session.on_data(0, chunk(&data, 0), now).unwrap();
        session.on_data(180, chunk(&data, 2), now).unwrap();

        let early = now + Duration::from_millis(700);
        assert!(session
            .on_idle_tick(early, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_REPAIR_REQUESTS)
            .is_empty());
        assert_eq!(session.retry_count(), 0);

        let late = now + Duration::from_millis(701);
        let requests =
            session.on_idle_tick(late, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_REPAIR_REQUESTS);
        assert_eq!(
            requests,
            vec![ByteRange {
                offset: 90,
                length: 90
            }]
        );
        assert_eq!(session.retry_count(), 1);

        // The idle clock restarted at the repair.
        assert!(session
            .on_idle_tick(late + Duration::from_millis(100), DEFAULT_IDLE_TIMEOUT, 20)
            .is_empty());
    }

    #[test]
    fn test_idle_tick_with_nothing_received_issues_no_requests() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let mut session = start_session(&dir, now);

        let requests = session.on_idle_tick(now + Duration::from_secs(2), DEFAULT_IDLE_TIMEOUT, 20);
        assert!(requests.is_empty());
        assert_eq!(session.retry_count(), 0);
    }

    #[test]
    fn test_progress_is_side_effect_free() {
        let dir = TempDir::new().unwrap();
        let now = Instant::now();
        let data = source_bytes(185);
        let mut session = start_session(&dir, now);
        session.on_data(0, chunk(&data, 0), now).unwrap();
        session.on_data(180, chunk(&data, 2), now).unwrap();

        let later = now + Duration::from_secs(1);
        let first = session.progress(Some(185), later);
        let second = session.progress(Some(185), later);
        assert_eq!(first, second);
        assert_eq!(first.bytes_written, 185);
        assert_eq!(first.total_size, 185);
        assert_eq!(first.missing_chunk_count, 1);
        assert_eq!(first.retry_count, 0);

        let unknown = session.progress(None, later);
        assert_eq!(unknown.total_size, 0);
        assert_eq!(unknown.percent, 0.0);
    }
}
