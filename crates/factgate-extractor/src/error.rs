//! Error types for the Number Extractor

use thiserror::Error;

/// Errors that can occur while building an extractor
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The pattern table failed to compile
    #[error("Pattern error: {0}")]
    Pattern(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<regex::Error> for ExtractorError {
    fn from(e: regex::Error) -> Self {
        ExtractorError::Pattern(e.to_string())
    }
}
