//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
///
/// All of these exit with status 1; content verdicts use their own codes.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Orchestrator error
    #[error(transparent)]
    Orchestrator(#[from] factgate_orchestrator::OrchestratorError),

    /// Gate construction error
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] factgate_gatekeeper::GatekeeperError),

    /// Extractor error
    #[error("Extractor error: {0}")]
    Extractor(#[from] factgate_extractor::ExtractorError),

    /// Snapshot could not be loaded
    #[error("Snapshot error: {0}")]
    Store(#[from] factgate_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
