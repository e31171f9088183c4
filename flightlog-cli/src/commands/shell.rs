//! Interactive `flightlog shell`.
//!
//! Lines are read on a separate thread so the engine keeps ticking while the
//! user types; `log status` and `log cancel` work mid-download.

use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;

use flightlog::config::ConfigFile;
use flightlog::engine::{LogCommand, USAGE};
use tracing::debug;

use crate::error::CliError;
use crate::runner::CliRunner;

/// What to do with one input line.
#[derive(Debug, PartialEq)]
enum ShellInput {
    Empty,
    Help,
    Quit,
    Command(LogCommand),
    Invalid(String),
}

impl ShellInput {
    fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ShellInput::Empty,
            "help" | "?" => ShellInput::Help,
            "quit" | "exit" => ShellInput::Quit,
            line => match line.parse::<LogCommand>() {
                Ok(command) => ShellInput::Command(command),
                Err(e) => ShellInput::Invalid(e.to_string()),
            },
        }
    }
}

/// Run the shell until `quit` or end of input.
///
/// At end of input the shell waits for outstanding downloads, so commands
/// can be piped in.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let mut runner = CliRunner::new(config)?;
    let lines = spawn_reader();
    println!("flightlog shell; type 'help' for commands");

    loop {
        match lines.recv_timeout(runner.tick_interval()) {
            Ok(line) => match ShellInput::parse(&line?) {
                ShellInput::Empty => {}
                ShellInput::Help => println!("{}", USAGE),
                ShellInput::Quit => return Ok(()),
                ShellInput::Command(command) => {
                    if let Err(e) = runner.execute(command) {
                        println!("{}", e);
                    }
                }
                ShellInput::Invalid(message) => println!("{}", message),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("End of input");
                runner.run_until_settled()?;
                return Ok(());
            }
        }
        runner.step()?;
    }
}

fn spawn_reader() -> mpsc::Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
