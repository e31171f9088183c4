//! The `log ...` command surface.
//!
//! ```text
//! log list | log status | log erase | log resume | log cancel
//! log download <id> [filename]
//! log download all | latest [filename] | from <n> | range <first> <last>
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use super::error::{EngineError, EngineResult};
use crate::catalog::LogId;

/// Top-level usage line.
pub const USAGE: &str = "usage: log <list|download|erase|resume|status|cancel>";

/// Usage line for `log download`.
pub const DOWNLOAD_USAGE: &str = "usage: log download all | log download <lognumber> <filename> | log download latest <filename> | log download from <index> | log download range FIRST LAST";

/// Which logs a download command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// One log by id, optionally into an explicit file.
    Id {
        id: LogId,
        filename: Option<PathBuf>,
    },
    /// Every listed log, newest first.
    All,
    /// The newest listed log.
    Latest { filename: Option<PathBuf> },
    /// Listed logs after skipping the `start_index` oldest.
    From { start_index: usize },
    /// Ids `first..=last`, ascending.
    Range { first: LogId, last: LogId },
}

/// A parsed `log` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCommand {
    List,
    Status,
    Erase,
    Resume,
    Cancel,
    Download(DownloadTarget),
}

impl LogCommand {
    /// Parse the words following `log`.
    pub fn parse<S: AsRef<str>>(words: &[S]) -> EngineResult<Self> {
        let words: Vec<&str> = words.iter().map(AsRef::as_ref).collect();
        let Some((&verb, rest)) = words.split_first() else {
            return Err(invalid(USAGE));
        };

        match verb {
            "list" => Ok(LogCommand::List),
            "status" => Ok(LogCommand::Status),
            "erase" => Ok(LogCommand::Erase),
            "resume" => Ok(LogCommand::Resume),
            "cancel" => Ok(LogCommand::Cancel),
            "download" => DownloadTarget::parse(rest).map(LogCommand::Download),
            _ => Err(invalid(USAGE)),
        }
    }
}

impl FromStr for LogCommand {
    type Err = EngineError;

    /// Parse a whole line; a leading `log` is optional.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words: Vec<&str> = line.split_whitespace().collect();
        if words.first() == Some(&"log") {
            words.remove(0);
        }
        LogCommand::parse(&words)
    }
}

impl DownloadTarget {
    /// Parse the words following `log download`.
    pub fn parse(words: &[&str]) -> EngineResult<Self> {
        let Some((&first, rest)) = words.split_first() else {
            return Err(invalid(DOWNLOAD_USAGE));
        };

        match first {
            "all" => Ok(DownloadTarget::All),
            "latest" => Ok(DownloadTarget::Latest {
                filename: rest.first().map(PathBuf::from),
            }),
            "from" => {
                let start_index = match rest.first() {
                    Some(word) => parse_number(word, "from index")?,
                    None => 0,
                };
                Ok(DownloadTarget::From { start_index })
            }
            "range" => match rest {
                [first, last, ..] => Ok(DownloadTarget::Range {
                    first: parse_number(first, "first log")?,
                    last: parse_number(last, "last log")?,
                }),
                _ => Err(invalid("usage: log download range FIRST LAST")),
            },
            id => Ok(DownloadTarget::Id {
                id: parse_number(id, "log number")?,
                filename: rest.first().map(PathBuf::from),
            }),
        }
    }
}

fn parse_number<T: FromStr>(word: &str, what: &str) -> EngineResult<T> {
    word.parse()
        .map_err(|_| EngineError::InvalidCommand(format!("invalid {}: '{}'", what, word)))
}

fn invalid(usage: &str) -> EngineError {
    EngineError::InvalidCommand(usage.to_string())
}
