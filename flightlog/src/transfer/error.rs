//! Error types for log transfers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors raised while writing a download to disk.
///
/// Link failures are never errors; they show up as silence and are handled
/// by gap repair.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to open the destination file.
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    /// Failed to reposition within the destination file.
    #[error("failed to seek to offset {offset} in {}: {source}", path.display())]
    Seek {
        path: PathBuf,
        offset: u32,
        source: io::Error,
    },

    /// Failed to write received data.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Failed to flush the destination before closing it.
    #[error("failed to close {}: {source}", path.display())]
    Close { path: PathBuf, source: io::Error },
}
