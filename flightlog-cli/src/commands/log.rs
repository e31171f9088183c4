//! One-shot `flightlog log <...>` commands.
//!
//! Each invocation starts from an empty catalog, so download commands list
//! the remote first and wait for the listing before running.

use flightlog::config::ConfigFile;
use flightlog::engine::LogCommand;

use crate::error::CliError;
use crate::runner::{CliRunner, Settled};

/// Run the `log` command made of `words`.
pub fn run(words: &[String], config: &ConfigFile) -> Result<(), CliError> {
    let command = LogCommand::parse(words)?;
    let mut runner = CliRunner::new(config)?;

    if needs_listing(&command) {
        runner.execute(LogCommand::List)?;
        settle(&mut runner)?;
    }

    runner.execute(command)?;
    settle(&mut runner)
}

fn needs_listing(command: &LogCommand) -> bool {
    matches!(command, LogCommand::Download(_))
}

fn settle(runner: &mut CliRunner) -> Result<(), CliError> {
    match runner.run_until_settled()? {
        Settled::Idle => Ok(()),
        Settled::TimedOut => Err(CliError::TimedOut(runner.max_wait())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightlog::engine::DownloadTarget;
    use tempfile::TempDir;

    fn words(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_only_downloads_list_first() {
        assert!(needs_listing(&LogCommand::Download(DownloadTarget::All)));
        assert!(!needs_listing(&LogCommand::List));
        assert!(!needs_listing(&LogCommand::Status));
    }

    #[test]
    fn test_download_latest_one_shot() {
        let remote = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        std::fs::write(remote.path().join("flight.bin"), vec![9u8; 1234]).unwrap();

        let mut config = ConfigFile::default();
        config.download.output_dir = output.path().to_path_buf();
        config.simulator.remote_dir = Some(remote.path().to_path_buf());
        config.link.tick_interval_ms = 1;

        let target = output.path().join("latest.bin");
        let line = format!("download latest {}", target.display());
        run(&words(&line), &config).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), vec![9u8; 1234]);
    }

    #[test]
    fn test_bad_command_is_rejected_before_setup() {
        let mut config = ConfigFile::default();
        config.simulator.remote_dir = Some("/nonexistent/remote".into());

        let err = run(&words("download"), &config).unwrap_err();
        assert!(matches!(err, CliError::Engine(_)));
    }
}
