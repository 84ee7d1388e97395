//! Error types for orchestrator operations

use factgate_gatekeeper::GatekeeperError;
use thiserror::Error;

/// Errors that keep a run from producing a report
///
/// Content problems never surface here; they become violations in the
/// report. These are operational failures only.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gate construction failed
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(String),

    /// The document is not valid JSON or has the wrong shape
    #[error("Document parse error: {0}")]
    Document(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl From<GatekeeperError> for OrchestratorError {
    fn from(err: GatekeeperError) -> Self {
        match err {
            GatekeeperError::Config(msg) => OrchestratorError::Config(msg),
            other => OrchestratorError::Gatekeeper(other.to_string()),
        }
    }
}
