//! Error types for the transfer engine.

use thiserror::Error;

use crate::catalog::LogId;
use crate::transfer::TransferError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by engine operations.
///
/// All of them are recoverable: the worst case is a stalled download the
/// user can inspect with `log status` or abort with `log cancel`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A bulk download was requested before any logs were listed.
    #[error("no logs known, please use 'log list' first")]
    EmptyCatalog,

    /// A transfer was started while another one is active.
    #[error("download of log {log_id} is already active")]
    SessionAlreadyActive { log_id: LogId },

    /// Writing the destination file failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Command words that do not form a valid command.
    #[error("{0}")]
    InvalidCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_catalog_display() {
        assert!(EngineError::EmptyCatalog.to_string().contains("log list"));
    }

    #[test]
    fn test_transfer_error_is_transparent() {
        let err: EngineError = TransferError::Write {
            path: PathBuf::from("log1.bin"),
            source: std::io::Error::other("disk full"),
        }
        .into();
        assert_eq!(err.to_string(), "failed to write log1.bin: disk full");
    }
}
