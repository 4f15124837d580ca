//! Scan orchestration.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::digest::{Digest, DigestEntry};
use super::dispatch::{TriageAction, decide};
use super::model::Classification;
use super::report::{EmailRecord, ScanOutcome, ScanReport};
use crate::deferred::DeletionQueue;
use crate::ledger::LedgerRepository;
use crate::port::{Classifier, Mailbox, MailboxError, Message};
use crate::{Error, Result};

/// Default pause between two classification calls.
pub const DEFAULT_PACING: Duration = Duration::from_secs(2);

/// Default delay before a one-time-code message is trashed.
pub const DEFAULT_OTP_TRASH_DELAY_MINUTES: i64 = 1;

/// Tunables for a scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Pause between consecutive classification calls.
    pub pacing: Duration,
    /// How long one-time-code messages stay before being trashed.
    pub otp_trash_delay: chrono::Duration,
}

impl ScanSettings {
    /// Builds settings from configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the trash delay is negative.
    pub fn new(pacing_seconds: u64, otp_trash_delay_minutes: i64) -> Result<Self> {
        if otp_trash_delay_minutes < 0 {
            return Err(Error::Config(format!(
                "otp_trash_delay_minutes must not be negative, got {otp_trash_delay_minutes}"
            )));
        }

        Ok(Self {
            pacing: Duration::from_secs(pacing_seconds),
            otp_trash_delay: chrono::Duration::minutes(otp_trash_delay_minutes),
        })
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            otp_trash_delay: chrono::Duration::minutes(DEFAULT_OTP_TRASH_DELAY_MINUTES),
        }
    }
}

/// The triage engine.
///
/// Scans are expected to run one at a time; callers that trigger scans
/// from several places must serialize them.
pub struct TriageEngine<M, C> {
    mailbox: M,
    classifier: C,
    ledger: LedgerRepository,
    deletions: DeletionQueue,
    settings: ScanSettings,
}

impl<M: Mailbox, C: Classifier> TriageEngine<M, C> {
    /// Creates an engine with default settings.
    #[must_use]
    pub fn new(
        mailbox: M,
        classifier: C,
        ledger: LedgerRepository,
        deletions: DeletionQueue,
    ) -> Self {
        Self {
            mailbox,
            classifier,
            ledger,
            deletions,
            settings: ScanSettings::default(),
        }
    }

    /// Replaces the scan settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ScanSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The mailbox this engine drives.
    pub const fn mailbox(&self) -> &M {
        &self.mailbox
    }

    /// The classifier this engine consults.
    pub const fn classifier(&self) -> &C {
        &self.classifier
    }

    /// The processed-message ledger.
    pub const fn ledger(&self) -> &LedgerRepository {
        &self.ledger
    }

    /// The deferred-deletion queue.
    pub const fn deletions(&self) -> &DeletionQueue {
        &self.deletions
    }

    /// Run one scan over at most `fetch_limit` unread messages.
    ///
    /// Never fails: an aborted scan is reported as [`ScanOutcome::Failed`].
    /// Ledger and queue writes made before the failure stay committed.
    pub async fn run_scan(&self, fetch_limit: u32) -> ScanOutcome {
        info!(fetch_limit, "Starting inbox scan");

        match self.scan(fetch_limit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Inbox scan aborted: {e}");
                ScanOutcome::failed(e)
            }
        }
    }

    async fn scan(&self, fetch_limit: u32) -> Result<ScanOutcome> {
        let trashed_count = self.resolve_due_deletions().await?;

        let messages = self.mailbox.fetch_unread(fetch_limit).await?;
        if messages.is_empty() {
            info!(trashed_count, "No unread messages");
            return Ok(ScanOutcome::nothing_to_do());
        }

        let mut report = ScanReport {
            trashed_count,
            ..ScanReport::default()
        };
        let mut digest = Digest::new();
        let mut classified_before = false;

        for message in &messages {
            if self.ledger.is_processed(&message.id).await? {
                debug!(id = %message.id, "Already processed, skipping");
                report.skipped_count += 1;
                continue;
            }

            if classified_before {
                self.pace().await;
            }
            classified_before = true;

            debug!(id = %message.id, subject = %message.subject, "Classifying");
            let classification = match self
                .classifier
                .classify(&message.sender, &message.subject, &message.body)
                .await
            {
                Ok(classification) => classification,
                Err(e) => {
                    warn!(id = %message.id, "Classification failed, will retry next scan: {e}");
                    report.failed_count += 1;
                    continue;
                }
            };

            let action = decide(&classification);
            let action_error = self
                .apply(action, message, &classification, &mut digest)
                .await?;

            self.ledger
                .record(&message.id, &message.sender, &message.subject)
                .await?;

            info!(id = %message.id, action = %action, "Message triaged");
            report.emails.push(EmailRecord {
                id: message.id.clone(),
                sender: message.sender.clone(),
                subject: message.subject.clone(),
                ai_analysis: classification,
                action_taken: action,
                action_error,
            });
        }

        report.analyzed_count = report.emails.len();

        if !digest.is_empty() {
            match self.flush_digest(&digest).await {
                Ok(()) => report.digest_sent = true,
                Err(e) => {
                    let reason = format!("Digest send failed: {e}");
                    for record in report
                        .emails
                        .iter_mut()
                        .filter(|r| r.action_taken == TriageAction::AddedToDigest)
                    {
                        record.action_error = Some(reason.clone());
                    }
                }
            }
        }

        info!(
            analyzed = report.analyzed_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            trashed = report.trashed_count,
            digest_sent = report.digest_sent,
            "Inbox scan finished"
        );
        Ok(ScanOutcome::Completed(report))
    }

    /// Trash every deferred deletion that has come due.
    ///
    /// Entries whose trash call fails stay queued for the next scan.
    async fn resolve_due_deletions(&self) -> Result<usize> {
        let due = self.deletions.list_due(Utc::now()).await?;
        let mut trashed = 0;

        for id in due {
            match self.mailbox.trash(&id).await {
                Ok(()) => {
                    self.deletions.remove(&id).await?;
                    debug!(id = %id, "Deferred deletion resolved");
                    trashed += 1;
                }
                Err(MailboxError::NotFound(_)) => {
                    // Nothing left to trash
                    self.deletions.remove(&id).await?;
                    debug!(id = %id, "Deferred deletion target is gone");
                }
                Err(e) => {
                    warn!(id = %id, "Deferred deletion failed, keeping it queued: {e}");
                }
            }
        }

        Ok(trashed)
    }

    /// Carry out the side effect of `action`.
    ///
    /// Mailbox failures are logged and returned as the record's
    /// `action_error`; only storage failures abort the scan.
    async fn apply(
        &self,
        action: TriageAction,
        message: &Message,
        classification: &Classification,
        digest: &mut Digest,
    ) -> Result<Option<String>> {
        let outcome = match action {
            TriageAction::DraftCreated => {
                let draft = classification.draft().unwrap_or_default();
                self.mailbox
                    .create_draft_reply(&message.sender, &message.subject, draft)
                    .await
            }
            TriageAction::AddedToDigest => {
                digest.push(DigestEntry::new(
                    &message.sender,
                    &message.subject,
                    &classification.summary,
                ));
                Ok(())
            }
            TriageAction::Archived => self.mailbox.archive(&message.id).await,
            TriageAction::ScheduledForTrash => {
                self.deletions
                    .schedule(&message.id, self.settings.otp_trash_delay)
                    .await?;
                Ok(())
            }
            TriageAction::Trashed => self.mailbox.trash(&message.id).await,
            TriageAction::NoAction => Ok(()),
        };

        Ok(outcome.err().map(|e| {
            warn!(id = %message.id, action = %action, "Mailbox action failed: {e}");
            e.to_string()
        }))
    }

    /// Send the digest. The caller marks the batched records on failure.
    async fn flush_digest(&self, digest: &Digest) -> std::result::Result<(), MailboxError> {
        match self
            .mailbox
            .send_to_self(&digest.subject(), &digest.body())
            .await
        {
            Ok(()) => {
                info!(entries = digest.len(), "Digest sent");
                Ok(())
            }
            Err(e) => {
                warn!(entries = digest.len(), "Failed to send digest: {e}");
                Err(e)
            }
        }
    }

    async fn pace(&self) {
        if !self.settings.pacing.is_zero() {
            tokio::time::sleep(self.settings.pacing).await;
        }
    }
}

impl<M, C> std::fmt::Debug for TriageEngine<M, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config_values() {
        let settings = ScanSettings::new(0, 0).unwrap();
        assert!(settings.pacing.is_zero());
        assert_eq!(settings.otp_trash_delay, chrono::Duration::zero());

        assert!(matches!(ScanSettings::new(2, -1), Err(Error::Config(_))));
    }
}
