//! Addressable configuration keys (`section.key`).

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};

/// Log levels accepted by `logging.level`.
const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// One configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DownloadOutputDir,
    DownloadIdleTimeoutMs,
    DownloadStatusIntervalMs,
    DownloadMaxRepairRequests,
    LinkTickIntervalMs,
    LinkMaxWaitSecs,
    SimulatorRemoteDir,
    SimulatorDropRate,
    SimulatorReorder,
    SimulatorSeed,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DownloadOutputDir,
            ConfigKey::DownloadIdleTimeoutMs,
            ConfigKey::DownloadStatusIntervalMs,
            ConfigKey::DownloadMaxRepairRequests,
            ConfigKey::LinkTickIntervalMs,
            ConfigKey::LinkMaxWaitSecs,
            ConfigKey::SimulatorRemoteDir,
            ConfigKey::SimulatorDropRate,
            ConfigKey::SimulatorReorder,
            ConfigKey::SimulatorSeed,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// INI section the key lives in.
    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::DownloadOutputDir
            | ConfigKey::DownloadIdleTimeoutMs
            | ConfigKey::DownloadStatusIntervalMs
            | ConfigKey::DownloadMaxRepairRequests => "download",
            ConfigKey::LinkTickIntervalMs | ConfigKey::LinkMaxWaitSecs => "link",
            ConfigKey::SimulatorRemoteDir
            | ConfigKey::SimulatorDropRate
            | ConfigKey::SimulatorReorder
            | ConfigKey::SimulatorSeed => "simulator",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
        }
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::DownloadOutputDir => "output_dir",
            ConfigKey::DownloadIdleTimeoutMs => "idle_timeout_ms",
            ConfigKey::DownloadStatusIntervalMs => "status_interval_ms",
            ConfigKey::DownloadMaxRepairRequests => "max_repair_requests",
            ConfigKey::LinkTickIntervalMs => "tick_interval_ms",
            ConfigKey::LinkMaxWaitSecs => "max_wait_secs",
            ConfigKey::SimulatorRemoteDir => "remote_dir",
            ConfigKey::SimulatorDropRate => "drop_rate",
            ConfigKey::SimulatorReorder => "reorder",
            ConfigKey::SimulatorSeed => "seed",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when an optional setting is unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DownloadOutputDir => config.download.output_dir.display().to_string(),
            ConfigKey::DownloadIdleTimeoutMs => config.download.idle_timeout_ms.to_string(),
            ConfigKey::DownloadStatusIntervalMs => config.download.status_interval_ms.to_string(),
            ConfigKey::DownloadMaxRepairRequests => {
                config.download.max_repair_requests.to_string()
            }
            ConfigKey::LinkTickIntervalMs => config.link.tick_interval_ms.to_string(),
            ConfigKey::LinkMaxWaitSecs => config.link.max_wait_secs.to_string(),
            ConfigKey::SimulatorRemoteDir => optional_path(&config.simulator.remote_dir),
            ConfigKey::SimulatorDropRate => config.simulator.drop_rate.to_string(),
            ConfigKey::SimulatorReorder => config.simulator.reorder.to_string(),
            ConfigKey::SimulatorSeed => config.simulator.seed.to_string(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => optional_path(&config.logging.directory),
        }
    }

    /// Parse `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::DownloadOutputDir => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.download.output_dir = PathBuf::from(value);
            }
            ConfigKey::DownloadIdleTimeoutMs => {
                config.download.idle_timeout_ms = self.parse_positive(value)?;
            }
            ConfigKey::DownloadStatusIntervalMs => {
                config.download.status_interval_ms = self.parse(value)?;
            }
            ConfigKey::DownloadMaxRepairRequests => {
                config.download.max_repair_requests = self.parse_positive(value)?;
            }
            ConfigKey::LinkTickIntervalMs => {
                config.link.tick_interval_ms = self.parse_positive(value)?;
            }
            ConfigKey::LinkMaxWaitSecs => {
                config.link.max_wait_secs = self.parse_positive(value)?;
            }
            ConfigKey::SimulatorRemoteDir => {
                config.simulator.remote_dir = non_empty_path(value);
            }
            ConfigKey::SimulatorDropRate => {
                let rate: f64 = self.parse(value)?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(self.invalid(value, "must be between 0.0 and 1.0"));
                }
                config.simulator.drop_rate = rate;
            }
            ConfigKey::SimulatorReorder => {
                config.simulator.reorder = self.parse(value)?;
            }
            ConfigKey::SimulatorSeed => {
                config.simulator.seed = self.parse(value)?;
            }
            ConfigKey::LoggingLevel => {
                let level = value.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value, "expected one of error, warn, info, debug, trace"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = non_empty_path(value);
            }
        }
        Ok(())
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, &e.to_string()))
    }

    fn parse_positive<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr + Default + PartialEq,
        T::Err: Display,
    {
        let parsed: T = self.parse(value)?;
        if parsed == T::default() {
            return Err(self.invalid(value, "must be greater than zero"));
        }
        Ok(parsed)
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

fn optional_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    (!value.is_empty()).then(|| PathBuf::from(value))
}
