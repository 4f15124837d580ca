//! Capabilities the triage engine consumes.
//!
//! The engine never talks to a mail provider or a language model directly.
//! It is handed a [`Mailbox`] and a [`Classifier`] and drives them through
//! these traits, so either side can be swapped or faked in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::triage::Classification;

/// An unread message as fetched from the mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque provider id.
    pub id: String,
    /// Sender (the raw `From` header).
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Body text; usually a provider snippet rather than the full body.
    pub body: String,
}

impl Message {
    /// Creates a new message.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Errors reported by a mailbox implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MailboxError {
    /// The provider could not be reached.
    #[error("Connection failed: {0}")]
    Transport(String),

    /// Authentication or token refresh failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider rejected the request.
    #[error("Provider returned {status}: {message}")]
    Api {
        /// HTTP-like status code.
        status: u16,
        /// Provider error message.
        message: String,
    },

    /// The message does not exist (anymore).
    #[error("Message not found: {0}")]
    NotFound(String),

    /// An outgoing message could not be encoded.
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

/// Why a message could not be classified.
///
/// Every variant is handled the same way by the engine: the message is left
/// unprocessed and retried on a later scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    /// The classification service could not be reached.
    #[error("Classifier unreachable: {0}")]
    Transport(String),

    /// The service answered with nothing usable.
    #[error("Classifier returned an empty response")]
    Empty,

    /// The response was not valid JSON.
    #[error("Malformed classifier output: {0}")]
    Malformed(String),

    /// A required field was absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// A field held a value outside its domain.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Mail provider capabilities used by the engine.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Fetch up to `limit` unread messages, in provider order.
    async fn fetch_unread(&self, limit: u32) -> Result<Vec<Message>, MailboxError>;

    /// Create (but do not send) a reply draft addressed to `to`.
    async fn create_draft_reply(
        &self,
        to: &str,
        original_subject: &str,
        body: &str,
    ) -> Result<(), MailboxError>;

    /// Send a message to the mailbox owner.
    async fn send_to_self(&self, subject: &str, body: &str) -> Result<(), MailboxError>;

    /// Move a message out of the inbox.
    async fn archive(&self, id: &str) -> Result<(), MailboxError>;

    /// Move a message to the trash.
    async fn trash(&self, id: &str) -> Result<(), MailboxError>;
}

/// Classification service used by the engine.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one message.
    async fn classify(
        &self,
        sender: &str,
        subject: &str,
        body: &str,
    ) -> Result<Classification, ClassificationError>;
}
