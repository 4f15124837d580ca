//! Ledger data models.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A message that has already been handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessedEmail {
    /// Provider message id (unique key).
    pub email_id: String,
    /// Sender as it appeared on the message.
    pub sender: String,
    /// Message subject.
    pub subject: String,
    /// When the message was recorded.
    pub processed_at: DateTime<Utc>,
}
