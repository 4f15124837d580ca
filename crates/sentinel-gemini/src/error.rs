//! Error types for Gemini calls.

use sentinel_core::ClassificationError;

/// Result type alias for Gemini operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gemini error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the API.
    #[error("Gemini API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The prompt was blocked by the safety filter.
    #[error("Prompt blocked: {0}")]
    Blocked(String),

    /// The response carried no text.
    #[error("Empty response")]
    EmptyResponse,
}

impl From<Error> for ClassificationError {
    fn from(error: Error) -> Self {
        match error {
            Error::Http(e) => Self::Transport(e.to_string()),
            Error::Api { status, message } => Self::Transport(format!("{status}: {message}")),
            Error::Json(e) => Self::Malformed(e.to_string()),
            Error::Blocked(_) | Error::EmptyResponse => Self::Empty,
        }
    }
}
