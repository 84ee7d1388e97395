//! Gatekeeper error types

use factgate_extractor::ExtractorError;
use thiserror::Error;

/// Errors that can occur while building or running gates
///
/// These are operational failures, never content violations. A gate that
/// returns one is reported as incomplete for that run.
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Number extractor could not be built
    #[error("Extractor error: {0}")]
    Extractor(String),

    /// Validation error (internal)
    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ExtractorError> for GatekeeperError {
    fn from(err: ExtractorError) -> Self {
        GatekeeperError::Extractor(err.to_string())
    }
}

impl From<regex::Error> for GatekeeperError {
    fn from(err: regex::Error) -> Self {
        GatekeeperError::Pattern(err.to_string())
    }
}
