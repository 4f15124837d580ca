//! Shared `SQLite` connection handling.
//!
//! The ledger and the deferred-deletion queue live in the same database
//! file and share one pool.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::{Error, Result};

/// Open (creating if needed) the database at `database_path`.
///
/// The parent directory is created when missing.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the connection fails.
pub async fn open(database_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = database_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }

    let url = format!("sqlite:{}?mode=rwc", database_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    Ok(pool)
}

/// Open a private in-memory database.
///
/// A single connection is used so every query sees the same database.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}

/// Format a timestamp for storage.
///
/// Fixed width (millisecond precision, `Z` suffix), so text comparison in
/// SQL matches chronological order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp written by [`format_timestamp`].
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if the text is not RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidTimestamp(format!("{raw}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_timestamps_sort_as_text() {
        let whole = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let fractional = whole + Duration::milliseconds(500);

        let a = format_timestamp(whole);
        let b = format_timestamp(fractional);

        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert!(a.ends_with('Z'));
    }

    #[test]
    fn test_parse_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(at)).unwrap(), at);
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(Error::InvalidTimestamp(_))
        ));
    }
}
