//! User configuration stored in `~/.flightlog/config.ini`.
//!
//! Every setting has a default, so a missing file (or a missing key) is not
//! an error. The file is plain INI:
//!
//! ```ini
//! [download]
//! output_dir = /data/flight-logs
//! idle_timeout_ms = 700
//!
//! [simulator]
//! remote_dir = /data/vehicle-sd
//! drop_rate = 0.05
//! ```
//!
//! Individual settings are addressed as `section.key` through [`ConfigKey`].

mod keys;

pub use keys::ConfigKey;

use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Name of the per-user configuration directory.
const CONFIG_DIR_NAME: &str = ".flightlog";

/// Name of the configuration file inside the directory.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Errors while loading or changing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the file.
    #[error("failed to access {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The file is not valid INI.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// No such `section.key`.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// A value that does not fit the key.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// `[download]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub output_dir: PathBuf,
    pub idle_timeout_ms: u64,
    pub status_interval_ms: u64,
    pub max_repair_requests: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            idle_timeout_ms: 700,
            status_interval_ms: 500,
            max_repair_requests: 20,
        }
    }
}

/// `[link]` settings for the host loop driving the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSettings {
    /// How often the host ticks the engine.
    pub tick_interval_ms: u64,
    /// Give up waiting for a command to settle after this long.
    pub max_wait_secs: u64,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            max_wait_secs: 120,
        }
    }
}

/// `[simulator]` settings for the in-process remote.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulatorSettings {
    /// Directory whose files the simulated remote serves.
    pub remote_dir: Option<PathBuf>,
    /// Probability of dropping each data chunk.
    pub drop_rate: f64,
    /// Shuffle chunks within each response.
    pub reorder: bool,
    /// Seed for drop and reorder decisions.
    pub seed: u64,
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    pub level: String,
    /// Directory for rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
        }
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub download: DownloadSettings,
    pub link: LinkSettings,
    pub simulator: SimulatorSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, falling back to defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(err) => ConfigError::Parse {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|s| s.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}
