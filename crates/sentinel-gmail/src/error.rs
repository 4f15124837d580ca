//! Error types for Gmail and `OAuth2` operations.

use sentinel_core::MailboxError;

/// Result type alias for Gmail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gmail error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `OAuth2` error from the token endpoint.
    #[error("OAuth2 error: {error} - {description}")]
    OAuth {
        /// Error code (e.g., `invalid_grant`).
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Error status from the Gmail API.
    #[error("Gmail API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The addressed message does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Creates an OAuth error from error code and description.
    #[must_use]
    pub fn oauth_error(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::OAuth {
            error: error.into(),
            description: description.into(),
        }
    }
}

impl From<Error> for MailboxError {
    fn from(error: Error) -> Self {
        match error {
            Error::Http(e) => Self::Transport(e.to_string()),
            Error::Json(e) => Self::Encoding(e.to_string()),
            e @ (Error::OAuth { .. } | Error::NoRefreshToken) => Self::Auth(e.to_string()),
            Error::Url(e) => Self::Transport(e.to_string()),
            Error::Api { status: 401, message } => Self::Auth(message),
            Error::Api { status, message } => Self::Api { status, message },
            Error::NotFound(what) => Self::NotFound(what),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_error_mapping() {
        assert!(matches!(
            MailboxError::from(Error::NotFound("m1".into())),
            MailboxError::NotFound(id) if id == "m1"
        ));
        assert!(matches!(
            MailboxError::from(Error::oauth_error("invalid_grant", "Token has been revoked")),
            MailboxError::Auth(_)
        ));
        assert!(matches!(
            MailboxError::from(Error::Api {
                status: 500,
                message: "Backend Error".into()
            }),
            MailboxError::Api { status: 500, .. }
        ));
    }
}
