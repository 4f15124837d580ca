//! Scan results.

use serde::Serialize;

use super::dispatch::TriageAction;
use super::model::Classification;
use crate::Result;

/// Message returned when the mailbox had nothing unread.
pub const NO_NEW_EMAILS: &str = "No new emails found.";

/// What happened to one classified message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRecord {
    /// Provider message id.
    pub id: String,
    /// Sender.
    pub sender: String,
    /// Subject.
    pub subject: String,
    /// Classifier verdict.
    pub ai_analysis: Classification,
    /// Action chosen by the dispatch policy.
    pub action_taken: TriageAction,
    /// Why the mailbox mutation for the action failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_error: Option<String>,
}

/// Summary of a completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Messages classified in this scan.
    pub analyzed_count: usize,
    /// Messages skipped because the ledger already had them.
    pub skipped_count: usize,
    /// Messages whose classification failed (left for the next scan).
    pub failed_count: usize,
    /// Deferred deletions resolved at the start of the scan.
    pub trashed_count: usize,
    /// Whether a digest was sent.
    pub digest_sent: bool,
    /// Per-message results, in fetch order.
    pub emails: Vec<EmailRecord>,
}

/// Result of one scan, as handed back to the trigger.
///
/// Serializes to one of
/// `{analyzed_count, skipped_count, ..., emails}`,
/// `{"message": "No new emails found."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    /// The scan ran to completion.
    Completed(ScanReport),
    /// The mailbox had no unread messages.
    NothingToDo {
        /// Fixed human-readable notice.
        message: String,
    },
    /// The scan was aborted.
    Failed {
        /// Rendered error.
        error: String,
    },
}

impl ScanOutcome {
    /// Outcome for an empty mailbox.
    #[must_use]
    pub fn nothing_to_do() -> Self {
        Self::NothingToDo {
            message: NO_NEW_EMAILS.to_string(),
        }
    }

    /// Outcome for an aborted scan.
    #[must_use]
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    /// Returns true if the scan was aborted.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The report, if the scan completed.
    #[must_use]
    pub const fn report(&self) -> Option<&ScanReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    /// Pretty-printed JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_shapes() {
        assert_eq!(
            serde_json::to_value(ScanOutcome::nothing_to_do()).unwrap(),
            json!({ "message": "No new emails found." })
        );
        assert_eq!(
            serde_json::to_value(ScanOutcome::failed("boom")).unwrap(),
            json!({ "error": "boom" })
        );

        let report = serde_json::to_value(ScanOutcome::Completed(ScanReport::default())).unwrap();
        assert_eq!(report["analyzed_count"], 0);
        assert_eq!(report["skipped_count"], 0);
        assert_eq!(report["emails"], json!([]));
    }
}
