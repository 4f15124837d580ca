//! # sentinel-core
//!
//! Core triage logic for the Inbox Sentinel assistant.
//!
//! This crate provides:
//! - **Ports** - the mailbox and classifier capabilities the engine consumes
//! - **Processed-Message Ledger** - durable dedup record of handled messages
//! - **Deferred-Deletion Queue** - messages scheduled to be trashed later
//! - **Dispatch Policy** - maps a classification to exactly one mailbox action
//! - **Triage Engine** - the per-scan decision loop tying it all together
//!
//! Mailbox and classifier implementations live in separate crates; the
//! engine only ever sees the traits in [`port`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod deferred;
mod error;
pub mod ledger;
pub mod port;
pub mod storage;
pub mod triage;

pub use deferred::{DeletionQueue, ScheduledDeletion};
pub use error::{Error, Result};
pub use ledger::{LedgerRepository, ProcessedEmail};
pub use port::{ClassificationError, Classifier, Mailbox, MailboxError, Message};
pub use triage::{
    Category, Classification, DigestEntry, EmailRecord, ScanOutcome, ScanReport, ScanSettings,
    SuggestedAction, TriageAction, TriageEngine, decide,
};
