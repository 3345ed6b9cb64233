//! Post likes.
//!
//! Liking is a toggle: the first call likes, the second unlikes. The
//! `UNIQUE (post_id, user_id)` constraint caps a pair at one row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use crate::error::SocialError;
use crate::store::is_unique_violation;

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikeState {
    /// Whether the caller now likes the post.
    pub liked: bool,
    /// Total likes after the toggle.
    pub like_count: i64,
}

/// Toggle the caller's like on a post they can see.
pub async fn toggle(
    pool: &SqlitePool,
    user_id: i64,
    post_id: i64,
) -> Result<LikeState, SocialError> {
    crate::store::posts::fetch(pool, user_id, post_id).await?;

    let removed = sqlx::query("DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    let liked = if removed.rows_affected() == 0 {
        let inserted = sqlx::query(
            "INSERT INTO likes (post_id, user_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await;
        match inserted {
            Ok(_) => true,
            // A concurrent like beat the insert; the row exists, which
            // is the state this branch wanted.
            Err(err) if is_unique_violation(&err) => true,
            Err(err) => return Err(err.into()),
        }
    } else {
        false
    };

    let row = sqlx::query("SELECT COUNT(*) AS like_count FROM likes WHERE post_id = ?1")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    let like_count = row.try_get("like_count").map_err(SocialError::internal)?;

    Ok(LikeState { liked, like_count })
}
