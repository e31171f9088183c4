//! Tracing setup for the CLI and other hosts.
//!
//! Provides:
//! - A stderr layer, always on
//! - An optional daily rolling file layer (non-blocking)
//! - `RUST_LOG` override of the configured level

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// File name prefix for rolling log files.
const LOG_FILE_PREFIX: &str = "flightlog.log";

/// Errors while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Keeps the file writer alive; logs written after it is dropped may be lost.
#[derive(Debug, Default)]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Build the level filter, preferring `RUST_LOG` when it is set.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("flightlog={level},flightlog_cli={level}"))
    })
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed or the log directory cannot
/// be created.
pub fn init_logging(settings: &LoggingSettings) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(&settings.level);
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    match settings.directory.as_deref() {
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;
            Ok(LoggingGuard::default())
        }
        Some(dir) => {
            let (writer, guard) = file_writer(dir)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false) // No ANSI colors in files
                        .with_target(true),
                )
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))?;
            Ok(LoggingGuard {
                _file_guard: Some(guard),
            })
        }
    }
}

fn file_writer(
    dir: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
