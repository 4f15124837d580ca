//! Deferred-deletion queue.
//!
//! Messages that should be trashed, just not yet (one-time codes the user
//! may still need for a minute) are parked here with a due time. Each scan
//! trashes whatever has come due and drops it from the queue once the
//! mailbox confirms.

mod model;
mod repository;

pub use model::ScheduledDeletion;
pub use repository::DeletionQueue;
