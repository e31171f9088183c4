//! Flightlog CLI - retrieve onboard logs from a remote vehicle.
//!
//! ```text
//! flightlog log list
//! flightlog log download all
//! flightlog --drop-rate 0.1 --reorder log download latest flight.bin
//! flightlog shell
//! flightlog config set simulator.remote_dir /media/sdcard/APM/LOGS
//! ```

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use flightlog::config::{config_file_path, ConfigFile, ConfigKey};
use flightlog::logging::init_logging;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "flightlog")]
#[command(version, about = "Retrieve onboard flight logs over a lossy telemetry link", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.flightlog/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory downloaded logs are written to
    #[arg(long, global = true, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Directory of log files served by the simulated remote
    #[arg(long, global = true, value_name = "DIR")]
    remote_dir: Option<PathBuf>,

    /// Probability of the remote dropping each data chunk (0.0 - 1.0)
    #[arg(long, global = true, value_name = "RATE")]
    drop_rate: Option<f64>,

    /// Let the remote deliver chunks out of order
    #[arg(long, global = true)]
    reorder: bool,

    /// Seed for drop and reorder decisions
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one log command: list, download, erase, resume, status, cancel
    Log {
        /// Command words, e.g. `download range 3 7`
        #[arg(num_args = 0..)]
        words: Vec<String>,
    },

    /// Read log commands from stdin while downloads run
    Shell,

    /// View or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }

    /// Load the configuration file and apply command-line overrides.
    fn load_config(&self) -> Result<ConfigFile, CliError> {
        let mut config = ConfigFile::load_from(&self.config_path())?;

        if let Some(dir) = &self.output_dir {
            config.download.output_dir = dir.clone();
        }
        if let Some(dir) = &self.remote_dir {
            config.simulator.remote_dir = Some(dir.clone());
        }
        if let Some(rate) = self.drop_rate {
            ConfigKey::SimulatorDropRate.set(&mut config, &rate.to_string())?;
        }
        if self.reorder {
            config.simulator.reorder = true;
        }
        if let Some(seed) = self.seed {
            config.simulator.seed = seed;
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Config(command) => commands::config::run(command, &cli.config_path()),
        Commands::Log { words } => {
            let config = cli.load_config()?;
            let _guard = init_logging(&config.logging)?;
            commands::log::run(words, &config)
        }
        Commands::Shell => {
            let config = cli.load_config()?;
            let _guard = init_logging(&config.logging)?;
            commands::shell::run(&config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_log_words_and_overrides() {
        let cli = Cli::try_parse_from([
            "flightlog",
            "--drop-rate",
            "0.25",
            "--reorder",
            "log",
            "download",
            "range",
            "3",
            "7",
        ])
        .unwrap();

        match &cli.command {
            Commands::Log { words } => assert_eq!(words, &["download", "range", "3", "7"]),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(cli.reorder);
        assert_eq!(cli.drop_rate, Some(0.25));
    }

    #[test]
    fn test_overrides_apply_on_top_of_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[download]\noutput_dir = /from/file\n[simulator]\nseed = 5\n").unwrap();

        let cli = Cli::try_parse_from([
            "flightlog",
            "--config",
            path.to_str().unwrap(),
            "--remote-dir",
            "/sd",
            "shell",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.download.output_dir, PathBuf::from("/from/file"));
        assert_eq!(config.simulator.remote_dir, Some(PathBuf::from("/sd")));
        assert_eq!(config.simulator.seed, 5);
    }

    #[test]
    fn test_invalid_drop_rate_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        let cli = Cli::try_parse_from([
            "flightlog",
            "--config",
            path.to_str().unwrap(),
            "--drop-rate",
            "3",
            "log",
            "list",
        ])
        .unwrap();
        assert!(matches!(cli.load_config(), Err(CliError::ConfigFile(_))));
    }
}
