//! Per-scan digest of low-priority messages.

use std::fmt::Write;

use serde::Serialize;

/// One line item in the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DigestEntry {
    /// Original sender.
    pub sender: String,
    /// Original subject.
    pub subject: String,
    /// Classifier summary.
    pub summary: String,
}

impl DigestEntry {
    /// Creates a new digest entry.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            summary: summary.into(),
        }
    }
}

/// Digest collected during a single scan, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Digest {
    entries: Vec<DigestEntry>,
}

impl Digest {
    /// Creates an empty digest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry.
    pub fn push(&mut self, entry: DigestEntry) {
        self.entries.push(entry);
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of collected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Subject line for the outgoing digest.
    #[must_use]
    pub fn subject(&self) -> String {
        match self.entries.len() {
            1 => "Inbox Sentinel Digest: 1 update".to_string(),
            n => format!("Inbox Sentinel Digest: {n} updates"),
        }
    }

    /// Plain-text body listing every entry.
    #[must_use]
    pub fn body(&self) -> String {
        let mut body = format!(
            "Here is your digest of {} low-priority email(s):\n\n",
            self.entries.len()
        );

        for (i, entry) in self.entries.iter().enumerate() {
            // Writing to a String cannot fail
            let _ = writeln!(body, "{}. {}", i + 1, entry.sender);
            let _ = writeln!(body, "   Subject: {}", entry.subject);
            let _ = writeln!(body, "   Summary: {}\n", entry.summary);
        }

        body.push_str("-- Inbox Sentinel");
        body
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest() {
        let digest = Digest::new();
        assert!(digest.is_empty());
        assert_eq!(digest.len(), 0);
    }

    #[test]
    fn test_body_lists_entries_in_order() {
        let mut digest = Digest::new();
        digest.push(DigestEntry::new(
            "news@weekly.io",
            "This week in Rust",
            "New compiler release and async updates.",
        ));
        digest.push(DigestEntry::new(
            "billing@bank.com",
            "Your statement is ready",
            "Monthly statement available, no payment due.",
        ));

        assert_eq!(digest.subject(), "Inbox Sentinel Digest: 2 updates");

        let body = digest.body();
        let first = body.find("1. news@weekly.io").unwrap();
        let second = body.find("2. billing@bank.com").unwrap();
        assert!(first < second);
        assert!(body.contains("Summary: New compiler release and async updates."));
        assert!(body.contains("Subject: Your statement is ready"));
    }

    #[test]
    fn test_singular_subject() {
        let mut digest = Digest::new();
        digest.push(DigestEntry::new("a@b.c", "Hi", "Hello"));
        assert_eq!(digest.subject(), "Inbox Sentinel Digest: 1 update");
    }
}
