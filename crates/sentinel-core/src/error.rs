//! Error types for the core library.

use thiserror::Error;

use crate::port::MailboxError;

/// Errors that abort a scan or a storage operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mailbox operation failed in a way that cannot be skipped.
    #[error("Mailbox error: {0}")]
    Mailbox(#[from] MailboxError),

    /// A stored timestamp could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
