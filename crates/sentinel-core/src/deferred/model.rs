//! Deferred-deletion data models.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A message waiting to be trashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledDeletion {
    /// Provider message id (unique key).
    pub email_id: String,
    /// When the message becomes due for trashing.
    pub trash_at: DateTime<Utc>,
}

impl ScheduledDeletion {
    /// Schedule `email_id` to be trashed `delay` after `now`.
    #[must_use]
    pub fn after(email_id: impl Into<String>, now: DateTime<Utc>, delay: Duration) -> Self {
        Self {
            email_id: email_id.into(),
            trash_at: now + delay,
        }
    }

    /// Returns true if the entry is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.trash_at <= now
    }

    /// Returns the remaining time until the entry is due.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_due(now) {
            None
        } else {
            Some(self.trash_at - now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_boundary() {
        let now = Utc::now();
        let entry = ScheduledDeletion::after("otp-1", now, Duration::minutes(1));

        assert!(!entry.is_due(now));
        assert_eq!(entry.time_remaining(now), Some(Duration::minutes(1)));
        assert!(entry.is_due(entry.trash_at));
        assert!(entry.time_remaining(entry.trash_at).is_none());
    }
}
