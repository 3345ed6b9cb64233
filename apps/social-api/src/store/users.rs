//! User rows: registration, profiles, and search.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::{NewUser, ProfileUpdate, ProfileView, User, UserSummary};
use crate::error::SocialError;
use crate::store::{is_unique_violation, timestamp_column};

/// Register a user. The username must be unused.
pub async fn create(pool: &SqlitePool, new: &NewUser) -> Result<User, SocialError> {
    new.validate()?;
    let username = new.username.trim();
    let display_name = new
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(username);
    let bio = new.bio.as_deref().unwrap_or("");
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO users (username, display_name, bio, is_private, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(username)
    .bind(display_name)
    .bind(bio)
    .bind(new.is_private)
    .bind(now.to_rfc3339())
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(err) if is_unique_violation(&err) => return Err(SocialError::UsernameTaken),
        Err(err) => return Err(err.into()),
    };

    Ok(User {
        id,
        username: username.to_string(),
        display_name: display_name.to_string(),
        bio: bio.to_string(),
        is_private: new.is_private,
        created_at: now,
    })
}

/// Look up a user by id.
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, SocialError> {
    let row = sqlx::query(
        "SELECT id, username, display_name, bio, is_private, created_at
         FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Look up a user by username.
pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, SocialError> {
    let row = sqlx::query(
        "SELECT id, username, display_name, bio, is_private, created_at
         FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Apply a partial profile update and return the fresh row.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<User, SocialError> {
    let current = find_by_id(pool, user_id)
        .await?
        .ok_or(SocialError::UserNotFound)?;

    let display_name = update
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&current.display_name);
    let bio = update.bio.as_deref().unwrap_or(&current.bio);
    let is_private = update.is_private.unwrap_or(current.is_private);

    sqlx::query("UPDATE users SET display_name = ?1, bio = ?2, is_private = ?3 WHERE id = ?4")
        .bind(display_name)
        .bind(bio)
        .bind(is_private)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(User {
        display_name: display_name.to_string(),
        bio: bio.to_string(),
        is_private,
        ..current
    })
}

/// Profile of `username` as seen by `viewer_id`: counts plus the
/// viewer's relationship to it.
pub async fn profile_view(
    pool: &SqlitePool,
    viewer_id: i64,
    username: &str,
) -> Result<ProfileView, SocialError> {
    let user = find_by_username(pool, username)
        .await?
        .ok_or(SocialError::UserNotFound)?;

    let row = sqlx::query(
        "SELECT
             (SELECT COUNT(*) FROM follows WHERE followee_id = ?1) AS followers_count,
             (SELECT COUNT(*) FROM follows WHERE follower_id = ?1) AS following_count,
             (SELECT COUNT(*) FROM posts WHERE author_id = ?1) AS posts_count,
             EXISTS (
                 SELECT 1 FROM follows WHERE follower_id = ?2 AND followee_id = ?1
             ) AS is_following",
    )
    .bind(user.id)
    .bind(viewer_id)
    .fetch_one(pool)
    .await?;

    Ok(ProfileView {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        bio: user.bio,
        is_private: user.is_private,
        followers_count: row.try_get("followers_count").map_err(SocialError::internal)?,
        following_count: row.try_get("following_count").map_err(SocialError::internal)?,
        posts_count: row.try_get("posts_count").map_err(SocialError::internal)?,
        is_own_profile: user.id == viewer_id,
        is_following: row.try_get("is_following").map_err(SocialError::internal)?,
        created_at: user.created_at,
    })
}

/// Search users by username or display name substring, newest first.
pub async fn search(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserSummary>, SocialError> {
    let pattern = format!("%{}%", query.trim());
    let rows = sqlx::query(
        "SELECT id, username, display_name FROM users
         WHERE username LIKE ?1 OR display_name LIKE ?1
         ORDER BY id DESC LIMIT ?2 OFFSET ?3",
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_summary).collect()
}

pub(crate) fn row_to_summary(row: &SqliteRow) -> Result<UserSummary, SocialError> {
    Ok(UserSummary {
        id: row.try_get("id").map_err(SocialError::internal)?,
        username: row.try_get("username").map_err(SocialError::internal)?,
        display_name: row.try_get("display_name").map_err(SocialError::internal)?,
    })
}

fn row_to_user(row: &SqliteRow) -> Result<User, SocialError> {
    Ok(User {
        id: row.try_get("id").map_err(SocialError::internal)?,
        username: row.try_get("username").map_err(SocialError::internal)?,
        display_name: row.try_get("display_name").map_err(SocialError::internal)?,
        bio: row.try_get("bio").map_err(SocialError::internal)?,
        is_private: row.try_get("is_private").map_err(SocialError::internal)?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn temp_pool() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/social.db", dir.path().display());
        let pool = db::connect(&url).await.unwrap();
        (pool, dir)
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            display_name: None,
            bio: None,
            is_private: false,
        }
    }

    #[tokio::test]
    async fn register_and_fetch() {
        let (pool, _dir) = temp_pool().await;
        let ada = create(&pool, &new_user("ada")).await.unwrap();
        assert_eq!(ada.display_name, "ada");

        let fetched = find_by_username(&pool, "ada").await.unwrap().unwrap();
        assert_eq!(fetched, ada);
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let (pool, _dir) = temp_pool().await;
        create(&pool, &new_user("ada")).await.unwrap();

        let err = create(&pool, &new_user("ada")).await.unwrap_err();
        assert!(matches!(err, SocialError::UsernameTaken));
    }

    #[tokio::test]
    async fn partial_profile_update() {
        let (pool, _dir) = temp_pool().await;
        let ada = create(&pool, &new_user("ada")).await.unwrap();

        let updated = update_profile(
            &pool,
            ada.id,
            &ProfileUpdate {
                bio: Some("Analyst".to_string()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.bio, "Analyst");
        // Untouched fields survive.
        assert_eq!(updated.display_name, "ada");
        assert!(!updated.is_private);
    }

    #[tokio::test]
    async fn search_matches_username_and_display_name() {
        let (pool, _dir) = temp_pool().await;
        create(&pool, &new_user("ada")).await.unwrap();
        create(
            &pool,
            &NewUser {
                username: "grace".to_string(),
                display_name: Some("Grace Hopper".to_string()),
                bio: None,
                is_private: false,
            },
        )
        .await
        .unwrap();

        let hits = search(&pool, "hopper", 20, 0).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "grace");
    }

    #[tokio::test]
    async fn search_pages_through_results() {
        let (pool, _dir) = temp_pool().await;
        for name in ["dev_one", "dev_two", "dev_three"] {
            create(&pool, &new_user(name)).await.unwrap();
        }

        let first = search(&pool, "dev", 1, 0).await.unwrap();
        let second = search(&pool, "dev", 1, 1).await.unwrap();
        let third = search(&pool, "dev", 1, 2).await.unwrap();

        // Newest first, one per page, no repeats.
        assert_eq!(first[0].username, "dev_three");
        assert_eq!(second[0].username, "dev_two");
        assert_eq!(third[0].username, "dev_one");

        assert!(search(&pool, "dev", 1, 3).await.unwrap().is_empty());
    }
}
