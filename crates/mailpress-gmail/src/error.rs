//! Error types for Gmail API operations.

/// Result type alias for Gmail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gmail API error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64url payload decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Error response from the API.
    #[error("Gmail API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-reported message.
        message: String,
    },

    /// A response lacked data the caller requires.
    #[error("Missing data in response: {0}")]
    MissingData(String),
}
