//! SQLite pool setup and schema.
//!
//! Timestamps are stored as RFC 3339 `TEXT`; tags are stored as a JSON
//! array in `TEXT`. The `likes` and `follows` tables enforce their
//! one-row-per-pair invariant with `UNIQUE` constraints so duplicates
//! fail in the database even if a check above races.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::info;

use crate::error::SocialError;

/// Open (creating if missing) the database and prepare the schema.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub async fn connect(database_url: &str) -> Result<SqlitePool, SocialError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(SocialError::internal)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite connection pool initialized");

    migrate(&pool).await?;
    Ok(pool)
}

/// Create the tables if they do not exist.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), SocialError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            bio TEXT NOT NULL DEFAULT '',
            is_private INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id INTEGER NOT NULL REFERENCES users (id),
            content TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            visibility TEXT NOT NULL DEFAULT 'public',
            is_edited INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id INTEGER NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
            author_id INTEGER NOT NULL REFERENCES users (id),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS likes (
            post_id INTEGER NOT NULL REFERENCES posts (id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users (id),
            created_at TEXT NOT NULL,
            UNIQUE (post_id, user_id)
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id INTEGER NOT NULL REFERENCES users (id),
            followee_id INTEGER NOT NULL REFERENCES users (id),
            created_at TEXT NOT NULL,
            UNIQUE (follower_id, followee_id),
            CHECK (follower_id <> followee_id)
        )
        ",
    )
    .execute(pool)
    .await?;

    Ok(())
}
