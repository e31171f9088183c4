//! Notifications produced by the engine for whoever displays status.

use std::fmt;
use std::path::PathBuf;

use crate::catalog::{CatalogEntry, LogId};
use crate::transfer::{CompletionSummary, ProgressReport};

/// Something the host may want to show the user.
///
/// Each event renders as one status line via `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A list request was sent.
    ListRequested,
    /// The remote described one stored log.
    EntryListed(CatalogEntry),
    /// The remote reports that it stores no logs.
    NoLogs,
    /// A download started.
    DownloadStarted { log_id: LogId, path: PathBuf },
    /// A queued log already exists locally at full size.
    SkippedExisting { log_id: LogId, path: PathBuf },
    /// Periodic or requested progress of the active download.
    Progress(ProgressReport),
    /// Status was requested while nothing is downloading.
    NoDownload,
    /// A download finished.
    Completed(CompletionSummary),
    /// A download was abandoned, either by cancel or by a new download.
    Cancelled { log_id: LogId, path: PathBuf },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::ListRequested => write!(f, "Requesting log list"),
            EngineEvent::EntryListed(entry) => write!(f, "{}", entry),
            EngineEvent::NoLogs => write!(f, "No logs"),
            EngineEvent::DownloadStarted { log_id, path } => {
                write!(f, "Downloading log {} as {}", log_id, path.display())
            }
            EngineEvent::SkippedExisting { path, .. } => {
                write!(f, "Skipping existing {}", path.display())
            }
            EngineEvent::Progress(report) => write!(f, "{}", report),
            EngineEvent::NoDownload => write!(f, "No download"),
            EngineEvent::Completed(summary) => write!(f, "{}", summary),
            EngineEvent::Cancelled { log_id, path } => {
                write!(f, "Cancelled download of log {} ({})", log_id, path.display())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_lines() {
        assert_eq!(EngineEvent::NoLogs.to_string(), "No logs");
        assert_eq!(
            EngineEvent::DownloadStarted {
                log_id: 4,
                path: PathBuf::from("log4.bin")
            }
            .to_string(),
            "Downloading log 4 as log4.bin"
        );
        assert_eq!(
            EngineEvent::SkippedExisting {
                log_id: 4,
                path: PathBuf::from("log4.bin")
            }
            .to_string(),
            "Skipping existing log4.bin"
        );
    }
}
