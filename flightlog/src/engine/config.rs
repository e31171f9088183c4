//! Configuration for the transfer engine.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::transfer::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_REPAIR_REQUESTS, DEFAULT_STATUS_INTERVAL};

/// Configuration for [`LogTransferEngine`](super::LogTransferEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory where `log<id>.bin` files are written.
    pub output_dir: PathBuf,

    /// Link silence after which gap repair runs.
    ///
    /// The host must tick more often than this for repair to keep up.
    pub idle_timeout: Duration,

    /// Minimum interval between progress reports.
    pub status_interval: Duration,

    /// Maximum re-requests per repair pass.
    pub max_repair_requests: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            status_interval: DEFAULT_STATUS_INTERVAL,
            max_repair_requests: DEFAULT_MAX_REPAIR_REQUESTS,
        }
    }
}

impl EngineConfig {
    /// Create a configuration writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Build the engine configuration from the `[download]` section.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            output_dir: config.download.output_dir.clone(),
            idle_timeout: Duration::from_millis(config.download.idle_timeout_ms),
            status_interval: Duration::from_millis(config.download.status_interval_ms),
            max_repair_requests: config.download.max_repair_requests,
        }
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the progress report interval.
    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    /// Set the per-pass repair request cap.
    pub fn with_max_repair_requests(mut self, max: usize) -> Self {
        self.max_repair_requests = max;
        self
    }
}
