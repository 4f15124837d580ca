//! Processed-message ledger.
//!
//! A permanent dedup record of every message the engine has classified.
//! Entries are written once and never updated or removed; the engine checks
//! the ledger before spending a classification call on a message.

mod model;
mod repository;

pub use model::ProcessedEmail;
pub use repository::LedgerRepository;
