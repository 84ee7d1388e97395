//! Factgate CLI library.
//!
//! Configuration loading, command execution and output formatting for the
//! `factgate` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
