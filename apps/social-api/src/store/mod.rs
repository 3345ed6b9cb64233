//! Persistence layer: one module per aggregate.

pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod users;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::error::SocialError;

pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, SocialError> {
    let text: String = row.try_get(column).map_err(SocialError::internal)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SocialError::internal(format!("bad timestamp in column {column}: {e}")))
}

pub(crate) fn tags_column(row: &SqliteRow, column: &str) -> Result<Vec<String>, SocialError> {
    let text: String = row.try_get(column).map_err(SocialError::internal)?;
    serde_json::from_str(&text)
        .map_err(|e| SocialError::internal(format!("bad tags in column {column}: {e}")))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}
