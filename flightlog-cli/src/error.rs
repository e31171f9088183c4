//! CLI error type.

use std::io;
use std::time::Duration;

use flightlog::config::ConfigError;
use flightlog::engine::EngineError;
use flightlog::logging::LoggingError;
use flightlog::sim::SimulatorError;
use thiserror::Error;

/// Anything that ends a CLI invocation with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// Bad configuration input from the command line.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The remote stopped answering before the command finished.
    #[error("gave up after {}s waiting for the remote", .0.as_secs())]
    TimedOut(Duration),
}
