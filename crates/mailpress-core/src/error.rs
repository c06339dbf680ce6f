//! Error types for the pipeline core.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A collaborator yielded a message with an empty source id.
    #[error("Message source id is empty or whitespace-only")]
    EmptySourceId,

    /// The output root could not be prepared.
    #[error("Cannot prepare output directory {path}: {source}")]
    OutputRoot {
        /// Directory that could not be created.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
