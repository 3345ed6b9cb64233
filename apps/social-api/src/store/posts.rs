//! Post rows: creation, editing, the follower feed, and per-author
//! listings.
//!
//! A post a viewer is not allowed to see reads as `PostNotFound` rather
//! than `Forbidden` so its existence is not leaked.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::{NewPost, PostUpdate, PostView, User, UserSummary, Visibility};
use crate::error::SocialError;
use crate::store::{follows, tags_column, timestamp_column};

const POST_COLUMNS: &str = "
    p.id, p.content, p.tags, p.visibility, p.is_edited, p.created_at, p.updated_at,
    u.id AS author_id, u.username, u.display_name,
    (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
    EXISTS (SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?1) AS liked";

/// Create a post and return it as the author sees it.
pub async fn create(
    pool: &SqlitePool,
    author_id: i64,
    new: &NewPost,
) -> Result<PostView, SocialError> {
    new.validate()?;
    let now = Utc::now().to_rfc3339();
    let tags = serde_json::to_string(&new.tags).map_err(SocialError::internal)?;

    let done = sqlx::query(
        "INSERT INTO posts (author_id, content, tags, visibility, is_edited, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
    )
    .bind(author_id)
    .bind(&new.content)
    .bind(tags)
    .bind(new.visibility.as_str())
    .bind(&now)
    .execute(pool)
    .await?;

    fetch_row(pool, author_id, done.last_insert_rowid())
        .await?
        .ok_or(SocialError::PostNotFound)
}

/// Fetch a single post, honoring its visibility for the viewer.
pub async fn fetch(
    pool: &SqlitePool,
    viewer_id: i64,
    post_id: i64,
) -> Result<PostView, SocialError> {
    let post = fetch_row(pool, viewer_id, post_id)
        .await?
        .ok_or(SocialError::PostNotFound)?;

    let is_author = post.author.id == viewer_id;
    let is_follower = !is_author && follows::is_following(pool, viewer_id, post.author.id).await?;
    if !post.visibility.visible_to(is_author, is_follower) {
        return Err(SocialError::PostNotFound);
    }
    Ok(post)
}

/// Apply a partial edit. Only the author may edit; any edit marks the
/// post as edited and bumps `updated_at`.
pub async fn update(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    edit: &PostUpdate,
) -> Result<PostView, SocialError> {
    edit.validate()?;
    let current = fetch_row(pool, author_id, post_id)
        .await?
        .ok_or(SocialError::PostNotFound)?;
    if current.author.id != author_id {
        return Err(SocialError::Forbidden(
            "You can only edit your own posts".to_string(),
        ));
    }

    let content = edit.content.as_deref().unwrap_or(&current.content);
    let tags = edit.tags.as_ref().unwrap_or(&current.tags);
    let tags = serde_json::to_string(tags).map_err(SocialError::internal)?;
    let visibility = edit.visibility.unwrap_or(current.visibility);

    sqlx::query(
        "UPDATE posts SET content = ?1, tags = ?2, visibility = ?3, is_edited = 1, updated_at = ?4
         WHERE id = ?5",
    )
    .bind(content)
    .bind(tags)
    .bind(visibility.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(post_id)
    .execute(pool)
    .await?;

    fetch_row(pool, author_id, post_id)
        .await?
        .ok_or(SocialError::PostNotFound)
}

/// Delete a post. Only the author may delete; comments and likes go
/// with it.
pub async fn delete(pool: &SqlitePool, author_id: i64, post_id: i64) -> Result<(), SocialError> {
    let current = fetch_row(pool, author_id, post_id)
        .await?
        .ok_or(SocialError::PostNotFound)?;
    if current.author.id != author_id {
        return Err(SocialError::Forbidden(
            "You can only delete your own posts".to_string(),
        ));
    }

    sqlx::query("DELETE FROM posts WHERE id = ?1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// The viewer's feed: their own posts plus public and followers-only
/// posts from people they follow, newest first.
pub async fn feed(
    pool: &SqlitePool,
    viewer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostView>, SocialError> {
    let sql = format!(
        "SELECT {POST_COLUMNS}
         FROM posts p JOIN users u ON u.id = p.author_id
         WHERE p.author_id = ?1
            OR (p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ?1)
                AND p.visibility IN ('public', 'followers'))
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?2 OFFSET ?3"
    );
    let rows = sqlx::query(&sql)
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_view).collect()
}

/// Posts by one author, filtered to what the viewer may see.
///
/// The private-profile gate (non-followers see nothing at all) is the
/// caller's concern; this filters per-post visibility only.
pub async fn by_author(
    pool: &SqlitePool,
    viewer_id: i64,
    author: &User,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostView>, SocialError> {
    let is_author = author.id == viewer_id;
    let is_follower = !is_author && follows::is_following(pool, viewer_id, author.id).await?;

    let visible: &[&str] = if is_author {
        &["public", "followers", "private"]
    } else if is_follower {
        &["public", "followers"]
    } else {
        &["public"]
    };
    let placeholders = (0..visible.len())
        .map(|i| format!("?{}", i + 3))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "SELECT {POST_COLUMNS}
         FROM posts p JOIN users u ON u.id = p.author_id
         WHERE p.author_id = ?2 AND p.visibility IN ({placeholders})
         ORDER BY p.created_at DESC, p.id DESC
         LIMIT ?{limit_idx} OFFSET ?{offset_idx}",
        limit_idx = visible.len() + 3,
        offset_idx = visible.len() + 4,
    );

    let mut query = sqlx::query(&sql).bind(viewer_id).bind(author.id);
    for v in visible {
        query = query.bind(*v);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(pool).await?;

    rows.iter().map(row_to_view).collect()
}

async fn fetch_row(
    pool: &SqlitePool,
    viewer_id: i64,
    post_id: i64,
) -> Result<Option<PostView>, SocialError> {
    let sql = format!(
        "SELECT {POST_COLUMNS}
         FROM posts p JOIN users u ON u.id = p.author_id
         WHERE p.id = ?2"
    );
    let row = sqlx::query(&sql)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_view(&r)).transpose()
}

fn row_to_view(row: &SqliteRow) -> Result<PostView, SocialError> {
    let visibility: String = row.try_get("visibility").map_err(SocialError::internal)?;
    Ok(PostView {
        id: row.try_get("id").map_err(SocialError::internal)?,
        author: UserSummary {
            id: row.try_get("author_id").map_err(SocialError::internal)?,
            username: row.try_get("username").map_err(SocialError::internal)?,
            display_name: row.try_get("display_name").map_err(SocialError::internal)?,
        },
        content: row.try_get("content").map_err(SocialError::internal)?,
        tags: tags_column(row, "tags")?,
        visibility: Visibility::parse(&visibility),
        is_edited: row.try_get("is_edited").map_err(SocialError::internal)?,
        like_count: row.try_get("like_count").map_err(SocialError::internal)?,
        comment_count: row.try_get("comment_count").map_err(SocialError::internal)?,
        liked: row.try_get("liked").map_err(SocialError::internal)?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}
