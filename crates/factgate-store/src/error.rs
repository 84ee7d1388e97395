//! Error types for the fact store loader

use thiserror::Error;

/// Errors that can occur while building a fact store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Snapshot is not valid JSON
    #[error("Snapshot parse error: {0}")]
    Parse(String),

    /// Snapshot root is not a mapping
    #[error("Invalid snapshot root: expected an object, found {0}")]
    InvalidRoot(String),

    /// Snapshot carries no numeric values at all
    #[error("Snapshot contains no numeric facts")]
    Empty,
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(err.to_string())
    }
}
