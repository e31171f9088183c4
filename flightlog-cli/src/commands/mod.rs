//! CLI subcommands.

pub mod config;
pub mod log;
pub mod shell;
