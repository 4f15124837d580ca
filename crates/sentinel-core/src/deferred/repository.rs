//! Deferred-deletion storage repository.

use chrono::{DateTime, Duration, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::ScheduledDeletion;
use crate::Result;
use crate::storage::{self, format_timestamp, parse_timestamp};

/// Repository for messages scheduled for delayed trashing.
#[derive(Debug, Clone)]
pub struct DeletionQueue {
    pool: SqlitePool,
}

impl DeletionQueue {
    /// Create a queue on an existing pool.
    ///
    /// Creates the table if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory queue for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        Self::new(storage::open_in_memory().await?).await
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS scheduled_deletions (
                email_id TEXT PRIMARY KEY,
                trash_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Create index for finding due entries
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_scheduled_deletions_trash_at
            ON scheduled_deletions(trash_at)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Schedule a message to be trashed `delay` from now.
    ///
    /// Scheduling an id that is already queued is a no-op and keeps the
    /// original due time. Returns `true` if a new entry was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn schedule(&self, email_id: &str, delay: Duration) -> Result<bool> {
        self.insert(&ScheduledDeletion::after(email_id, Utc::now(), delay))
            .await
    }

    /// Insert a prepared entry.
    ///
    /// Same duplicate semantics as [`DeletionQueue::schedule`].
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, entry: &ScheduledDeletion) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO scheduled_deletions (email_id, trash_at)
            VALUES (?, ?)
            ON CONFLICT(email_id) DO NOTHING
            ",
        )
        .bind(&entry.email_id)
        .bind(format_timestamp(entry.trash_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Ids of every entry due at or before `now`, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r"
            SELECT email_id
            FROM scheduled_deletions
            WHERE trash_at <= ?
            ORDER BY trash_at ASC
            ",
        )
        .bind(format_timestamp(now))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("email_id")).collect())
    }

    /// Every queued entry, earliest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored timestamp is corrupt.
    pub async fn pending(&self) -> Result<Vec<ScheduledDeletion>> {
        let rows = sqlx::query(
            r"
            SELECT email_id, trash_at
            FROM scheduled_deletions
            ORDER BY trash_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Check if a message is queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn contains(&self, email_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM scheduled_deletions WHERE email_id = ?")
            .bind(email_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Remove a message from the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn remove(&self, email_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM scheduled_deletions WHERE email_id = ?")
            .bind(email_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Convert a database row to a `ScheduledDeletion`.
fn row_to_entry(row: &SqliteRow) -> Result<ScheduledDeletion> {
    let trash_at: String = row.get("trash_at");
    Ok(ScheduledDeletion {
        email_id: row.get("email_id"),
        trash_at: parse_timestamp(&trash_at)?,
    })
}
