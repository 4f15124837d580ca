//! The triage decision loop.
//!
//! One scan resolves due deferred deletions, fetches unread messages, skips
//! the ones the ledger already knows, classifies the rest, applies exactly
//! one action per message and finally sends a single digest for everything
//! routed to it.
//!
//! # Example
//!
//! ```ignore
//! use sentinel_core::{DeletionQueue, LedgerRepository, TriageEngine, storage};
//!
//! let pool = storage::open(path).await?;
//! let engine = TriageEngine::new(
//!     mailbox,
//!     classifier,
//!     LedgerRepository::new(pool.clone()).await?,
//!     DeletionQueue::new(pool).await?,
//! );
//!
//! let outcome = engine.run_scan(5).await;
//! println!("{}", outcome.to_json()?);
//! ```

mod digest;
mod dispatch;
mod engine;
mod model;
mod report;

pub use digest::{Digest, DigestEntry};
pub use dispatch::{TriageAction, decide};
pub use engine::{ScanSettings, TriageEngine};
pub use model::{Category, Classification, SUMMARY_MAX_WORDS, SuggestedAction};
pub use report::{EmailRecord, NO_NEW_EMAILS, ScanOutcome, ScanReport};
