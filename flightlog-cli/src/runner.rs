//! Host loop driving the engine against the simulated remote.
//!
//! The runner owns the engine and plays the part of the link layer: it
//! delivers whatever the remote queued, ticks the engine at the configured
//! cadence and prints each engine event as a status line.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use flightlog::config::ConfigFile;
use flightlog::engine::{EngineConfig, LogCommand, LogTransferEngine};
use flightlog::sim::SimulatedVehicle;
use tracing::{debug, warn};

use crate::error::CliError;

/// How a wait for the engine ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Nothing downloading, nothing queued, nothing in flight.
    Idle,
    /// `max_wait` elapsed first.
    TimedOut,
}

/// Engine plus the host-side cadence.
pub struct CliRunner {
    engine: LogTransferEngine<SimulatedVehicle>,
    tick_interval: Duration,
    max_wait: Duration,
}

impl CliRunner {
    /// Build the remote and engine described by `config`.
    pub fn new(config: &ConfigFile) -> Result<Self, CliError> {
        let vehicle = SimulatedVehicle::from_settings(&config.simulator)?;
        ensure_dir(&config.download.output_dir)?;
        debug!(
            logs = vehicle.logs().len(),
            output_dir = %config.download.output_dir.display(),
            "Simulated remote ready"
        );

        let engine = LogTransferEngine::new(
            vehicle,
            EngineConfig::from_config_file(config),
            Instant::now(),
        );
        Ok(Self {
            engine,
            tick_interval: Duration::from_millis(config.link.tick_interval_ms),
            max_wait: Duration::from_secs(config.link.max_wait_secs),
        })
    }

    /// Maximum time [`run_until_settled`](Self::run_until_settled) waits.
    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Tick cadence.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Run one command and print what it produced immediately.
    pub fn execute(&mut self, command: LogCommand) -> Result<(), CliError> {
        let result = self.engine.execute(command, Instant::now());
        self.print_events();
        result.map_err(CliError::from)
    }

    /// Check whether there is nothing left to do.
    pub fn is_settled(&self) -> bool {
        self.engine.is_idle() && !self.engine.link().has_pending()
    }

    /// Deliver pending inbound traffic, tick once and print events.
    pub fn step(&mut self) -> Result<(), CliError> {
        let result = self.deliver_inbound();
        if result.is_ok() {
            self.engine.on_idle_tick(Instant::now());
        }
        self.print_events();
        result
    }

    /// Step until settled or until `max_wait` elapses.
    pub fn run_until_settled(&mut self) -> Result<Settled, CliError> {
        let started = Instant::now();
        loop {
            self.step()?;
            if self.is_settled() {
                return Ok(Settled::Idle);
            }
            if started.elapsed() >= self.max_wait {
                warn!(waited_secs = self.max_wait.as_secs(), "Remote did not settle");
                return Ok(Settled::TimedOut);
            }
            thread::sleep(self.tick_interval);
        }
    }

    fn deliver_inbound(&mut self) -> Result<(), CliError> {
        let now = Instant::now();
        while let Some(event) = self.engine.link_mut().next_event() {
            self.engine.handle_inbound(event, now)?;
        }
        Ok(())
    }

    fn print_events(&mut self) {
        for event in self.engine.drain_events() {
            println!("{}", event);
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(remote: &TempDir, output: &TempDir) -> ConfigFile {
        let mut config = ConfigFile::default();
        config.download.output_dir = output.path().to_path_buf();
        config.simulator.remote_dir = Some(remote.path().to_path_buf());
        config.link.tick_interval_ms = 1;
        config.link.max_wait_secs = 5;
        config
    }

    #[test]
    fn test_list_then_download_all() {
        let remote = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(remote.path().join("a.bin"), vec![1u8; 500]).unwrap();
        std::fs::write(remote.path().join("b.bin"), vec![2u8; 180]).unwrap();

        let mut runner = CliRunner::new(&config_for(&remote, &output)).unwrap();
        runner.execute(LogCommand::List).unwrap();
        assert_eq!(runner.run_until_settled().unwrap(), Settled::Idle);

        runner
            .execute("download all".parse().unwrap())
            .unwrap();
        assert_eq!(runner.run_until_settled().unwrap(), Settled::Idle);

        assert_eq!(
            std::fs::read(output.path().join("log1.bin")).unwrap(),
            vec![1u8; 500]
        );
        assert_eq!(
            std::fs::read(output.path().join("log2.bin")).unwrap(),
            vec![2u8; 180]
        );
    }

    #[test]
    fn test_download_all_before_list_fails() {
        let remote = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let mut runner = CliRunner::new(&config_for(&remote, &output)).unwrap();
        let err = runner.execute("download all".parse().unwrap()).unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
        assert!(runner.is_settled());
    }

    #[test]
    fn test_creates_output_directory() {
        let remote = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let mut config = config_for(&remote, &output);
        config.download.output_dir = output.path().join("nested").join("logs");

        CliRunner::new(&config).unwrap();
        assert!(output.path().join("nested").join("logs").is_dir());
    }
}
