//! Progress and completion reports for a log download.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::LogId;

/// Throughput in kilobytes (1000 bytes) per second.
///
/// Returns 0 when no time has elapsed.
pub fn kilobytes_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        0.0
    } else {
        bytes as f64 / (1000.0 * secs)
    }
}

/// Snapshot of the active download.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// Log being downloaded.
    pub log_id: LogId,
    /// Destination file.
    pub path: PathBuf,
    /// Bytes present in the destination so far.
    pub bytes_written: u64,
    /// Size declared by the catalog, 0 when unknown.
    pub total_size: u64,
    /// Completion percentage.
    pub percent: f64,
    /// Time since the download started.
    pub elapsed: Duration,
    /// Average throughput so far.
    pub throughput_kb_per_s: f64,
    /// Re-requests issued by gap repair.
    pub retry_count: u32,
    /// Chunks missing below the highest received chunk.
    pub missing_chunk_count: usize,
}

impl ProgressReport {
    /// Percentage complete.
    ///
    /// With no catalog entry the size is unknown and the download reads 0%.
    /// A catalog entry that declares size 0 reads 100%.
    pub fn percent_of(bytes_written: u64, declared_size: Option<u64>) -> f64 {
        match declared_size {
            None => 0.0,
            Some(0) => 100.0,
            Some(size) => 100.0 * bytes_written as f64 / size as f64,
        }
    }

    /// Elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloading {} - {}/{} bytes {:.1}% {:.1} kbyte/s ({} retries {} missing)",
            self.path.display(),
            self.bytes_written,
            self.total_size,
            self.percent,
            self.throughput_kb_per_s,
            self.retry_count,
            self.missing_chunk_count
        )
    }
}

/// Summary of a finished download.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    /// Log that was downloaded.
    pub log_id: LogId,
    /// Destination file.
    pub path: PathBuf,
    /// Final size of the destination.
    pub size: u64,
    /// Total transfer time.
    pub elapsed: Duration,
    /// Average throughput.
    pub throughput_kb_per_s: f64,
    /// Re-requests issued by gap repair.
    pub retry_count: u32,
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Finished downloading {} ({} bytes {:.1} seconds, {:.1} kbyte/sec {} retries)",
            self.path.display(),
            self.size,
            self.elapsed.as_secs_f64(),
            self.throughput_kb_per_s,
            self.retry_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_unknown_entry() {
        assert_eq!(ProgressReport::percent_of(500, None), 0.0);
    }

    #[test]
    fn test_percent_zero_declared_size() {
        assert_eq!(ProgressReport::percent_of(0, Some(0)), 100.0);
        assert_eq!(ProgressReport::percent_of(42, Some(0)), 100.0);
    }

    #[test]
    fn test_percent_by_bytes() {
        assert_eq!(ProgressReport::percent_of(50, Some(200)), 25.0);
    }

    #[test]
    fn test_throughput() {
        assert_eq!(kilobytes_per_second(2000, Duration::from_secs(2)), 1.0);
        assert_eq!(kilobytes_per_second(2000, Duration::ZERO), 0.0);
    }

    #[test]
    fn test_progress_display() {
        let report = ProgressReport {
            log_id: 3,
            path: PathBuf::from("log3.bin"),
            bytes_written: 90,
            total_size: 185,
            percent: ProgressReport::percent_of(90, Some(185)),
            elapsed: Duration::from_secs(1),
            throughput_kb_per_s: 0.09,
            retry_count: 2,
            missing_chunk_count: 1,
        };
        assert_eq!(
            report.to_string(),
            "Downloading log3.bin - 90/185 bytes 48.6% 0.1 kbyte/s (2 retries 1 missing)"
        );
    }

    #[test]
    fn test_completion_display() {
        let summary = CompletionSummary {
            log_id: 3,
            path: PathBuf::from("log3.bin"),
            size: 185,
            elapsed: Duration::from_millis(500),
            throughput_kb_per_s: 0.37,
            retry_count: 0,
        };
        assert_eq!(
            summary.to_string(),
            "Finished downloading log3.bin (185 bytes 0.5 seconds, 0.4 kbyte/sec 0 retries)"
        );
    }
}
