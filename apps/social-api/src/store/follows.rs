//! Follow relationships.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::UserSummary;
use crate::error::SocialError;
use crate::store::{is_unique_violation, users};

/// Record that `follower_id` follows `followee_id`.
///
/// Self-follows and duplicate follows are rejected. The `UNIQUE`
/// constraint backs the duplicate check under concurrency.
pub async fn follow(
    pool: &SqlitePool,
    follower_id: i64,
    followee_id: i64,
) -> Result<(), SocialError> {
    if follower_id == followee_id {
        return Err(SocialError::invalid("You cannot follow yourself"));
    }

    let result = sqlx::query(
        "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(SocialError::invalid("You are already following this user"))
        }
        Err(err) => Err(err.into()),
    }
}

/// Remove a follow relationship.
pub async fn unfollow(
    pool: &SqlitePool,
    follower_id: i64,
    followee_id: i64,
) -> Result<(), SocialError> {
    let done = sqlx::query("DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2")
        .bind(follower_id)
        .bind(followee_id)
        .execute(pool)
        .await?;

    if done.rows_affected() == 0 {
        return Err(SocialError::invalid("You are not following this user"));
    }
    Ok(())
}

/// Whether `follower_id` currently follows `followee_id`.
pub async fn is_following(
    pool: &SqlitePool,
    follower_id: i64,
    followee_id: i64,
) -> Result<bool, SocialError> {
    let row = sqlx::query(
        "SELECT 1 FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.is_some())
}

/// Users who follow `user_id`, most recent follow first.
pub async fn followers(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserSummary>, SocialError> {
    let rows = sqlx::query(
        "SELECT u.id, u.username, u.display_name
         FROM follows f JOIN users u ON u.id = f.follower_id
         WHERE f.followee_id = ?1
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(users::row_to_summary).collect()
}

/// Users `user_id` follows, most recent follow first.
pub async fn following(pool: &SqlitePool, user_id: i64) -> Result<Vec<UserSummary>, SocialError> {
    let rows = sqlx::query(
        "SELECT u.id, u.username, u.display_name
         FROM follows f JOIN users u ON u.id = f.followee_id
         WHERE f.follower_id = ?1
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(users::row_to_summary).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::domain::NewUser;

    async fn seed() -> (SqlitePool, i64, i64, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/social.db", dir.path().display());
        let pool = db::connect(&url).await.unwrap();
        let ada = users::create(&pool, &user("ada")).await.unwrap();
        let grace = users::create(&pool, &user("grace")).await.unwrap();
        (pool, ada.id, grace.id, dir)
    }

    fn user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            display_name: None,
            bio: None,
            is_private: false,
        }
    }

    #[tokio::test]
    async fn follow_and_unfollow() {
        let (pool, ada, grace, _dir) = seed().await;

        follow(&pool, ada, grace).await.unwrap();
        assert!(is_following(&pool, ada, grace).await.unwrap());
        // Not symmetric.
        assert!(!is_following(&pool, grace, ada).await.unwrap());

        assert_eq!(followers(&pool, grace).await.unwrap().len(), 1);
        assert_eq!(following(&pool, ada).await.unwrap().len(), 1);

        unfollow(&pool, ada, grace).await.unwrap();
        assert!(!is_following(&pool, ada, grace).await.unwrap());
    }

    #[tokio::test]
    async fn self_follow_rejected() {
        let (pool, ada, _, _dir) = seed().await;
        let err = follow(&pool, ada, ada).await.unwrap_err();
        assert_eq!(err.to_string(), "You cannot follow yourself");
    }

    #[tokio::test]
    async fn duplicate_follow_rejected() {
        let (pool, ada, grace, _dir) = seed().await;
        follow(&pool, ada, grace).await.unwrap();

        let err = follow(&pool, ada, grace).await.unwrap_err();
        assert_eq!(err.to_string(), "You are already following this user");
    }

    #[tokio::test]
    async fn unfollow_without_follow_rejected() {
        let (pool, ada, grace, _dir) = seed().await;
        let err = unfollow(&pool, ada, grace).await.unwrap_err();
        assert_eq!(err.to_string(), "You are not following this user");
    }
}
