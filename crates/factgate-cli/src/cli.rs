//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Factgate - Check generated financial articles against their source data.
#[derive(Debug, Parser)]
#[command(name = "factgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FACTGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (verdict or counts only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every gate against an article
    Check(CheckArgs),

    /// List the numbers found in an article
    Scan(ScanArgs),

    /// Summarize what a snapshot provides
    Facts(FactsArgs),

    /// Show or write the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Snapshot JSON file
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Document JSON file
    #[arg(short, long)]
    pub document: PathBuf,

    /// Write the JSON report to this file
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Override the run deadline (milliseconds)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Arguments for the scan command.
#[derive(Debug, Parser)]
pub struct ScanArgs {
    /// Document JSON file
    #[arg(short, long)]
    pub document: PathBuf,

    /// Also trace each number against this snapshot
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Hide numbers that need no source
    #[arg(long)]
    pub unsafe_only: bool,
}

/// Arguments for the facts command.
#[derive(Debug, Parser)]
pub struct FactsArgs {
    /// Snapshot JSON file
    #[arg(short, long)]
    pub snapshot: PathBuf,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Start from a preset instead of the loaded configuration
    #[arg(short, long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Write the configuration to the config file
    #[arg(short, long)]
    pub write: bool,
}

/// Configuration presets.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced tolerances
    Default,
    /// Tight tolerances, short deadline
    Strict,
    /// Loose tolerances, long deadline
    Lenient,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PresetArg> for factgate_orchestrator::OrchestratorConfig {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => factgate_orchestrator::OrchestratorConfig::default(),
            PresetArg::Strict => factgate_orchestrator::OrchestratorConfig::strict(),
            PresetArg::Lenient => factgate_orchestrator::OrchestratorConfig::lenient(),
        }
    }
}
