//! Ledger storage repository.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqliteRow};

use super::model::ProcessedEmail;
use crate::Result;
use crate::storage::{self, format_timestamp, parse_timestamp};

/// Repository for the processed-message ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Create a repository on an existing pool.
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

    /// Create an in-memory repository for testing.
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
            CREATE TABLE IF NOT EXISTS processed_emails (
                email_id TEXT PRIMARY KEY,
                sender TEXT NOT NULL DEFAULT '',
                subject TEXT NOT NULL DEFAULT '',
                processed_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check whether a message has already been processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_processed(&self, email_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM processed_emails WHERE email_id = ?")
            .bind(email_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    /// Record a message as processed.
    ///
    /// Recording an id that is already present is a no-op. Returns `true`
    /// if a new entry was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn record(&self, email_id: &str, sender: &str, subject: &str) -> Result<bool> {
        let result = sqlx::query(
            r"
            INSERT INTO processed_emails (email_id, sender, subject, processed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(email_id) DO NOTHING
            ",
        )
        .bind(email_id)
        .bind(sender)
        .bind(subject)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get a single ledger entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the stored timestamp is corrupt.
    pub async fn get(&self, email_id: &str) -> Result<Option<ProcessedEmail>> {
        let row = sqlx::query(
            r"
            SELECT email_id, sender, subject, processed_at
            FROM processed_emails
            WHERE email_id = ?
            ",
        )
        .bind(email_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_entry).transpose()
    }

    /// Number of processed messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM processed_emails")
            .fetch_one(&self.pool)
            .await?;

        #[allow(clippy::cast_sign_loss)]
        Ok(row.get::<i64, _>("count") as u64)
    }

    /// Most recently processed messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or a stored timestamp is corrupt.
    pub async fn recent(&self, limit: u32) -> Result<Vec<ProcessedEmail>> {
        let rows = sqlx::query(
            r"
            SELECT email_id, sender, subject, processed_at
            FROM processed_emails
            ORDER BY processed_at DESC, rowid DESC
            LIMIT ?
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

/// Convert a database row to a `ProcessedEmail`.
fn row_to_entry(row: &SqliteRow) -> Result<ProcessedEmail> {
    let processed_at: String = row.get("processed_at");
    Ok(ProcessedEmail {
        email_id: row.get("email_id"),
        sender: row.get("sender"),
        subject: row.get("subject"),
        processed_at: parse_timestamp(&processed_at)?,
    })
}
