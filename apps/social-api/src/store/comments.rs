//! Comments on posts.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::domain::{CommentView, MAX_COMMENT_LEN, UserSummary, validate_content};
use crate::error::SocialError;
use crate::store::timestamp_column;

/// Add a comment to a post the commenter can see.
pub async fn create(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    content: &str,
) -> Result<CommentView, SocialError> {
    validate_content(content, MAX_COMMENT_LEN, "Comment")?;
    // Visibility check doubles as the existence check.
    crate::store::posts::fetch(pool, author_id, post_id).await?;

    let done = sqlx::query(
        "INSERT INTO comments (post_id, author_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    fetch(pool, done.last_insert_rowid())
        .await?
        .ok_or(SocialError::CommentNotFound)
}

/// Edit a comment's content. Only the comment author may edit.
pub async fn update(
    pool: &SqlitePool,
    caller_id: i64,
    comment_id: i64,
    content: &str,
) -> Result<CommentView, SocialError> {
    validate_content(content, MAX_COMMENT_LEN, "Comment")?;

    let current = fetch(pool, comment_id)
        .await?
        .ok_or(SocialError::CommentNotFound)?;
    if current.author.id != caller_id {
        return Err(SocialError::Forbidden(
            "You can only edit your own comments".to_string(),
        ));
    }

    sqlx::query("UPDATE comments SET content = ?1 WHERE id = ?2")
        .bind(content)
        .bind(comment_id)
        .execute(pool)
        .await?;

    fetch(pool, comment_id)
        .await?
        .ok_or(SocialError::CommentNotFound)
}

/// Comments on a post, newest first.
pub async fn for_post(
    pool: &SqlitePool,
    viewer_id: i64,
    post_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentView>, SocialError> {
    crate::store::posts::fetch(pool, viewer_id, post_id).await?;

    let rows = sqlx::query(
        "SELECT c.id, c.post_id, c.content, c.created_at,
                u.id AS author_id, u.username, u.display_name
         FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at DESC, c.id DESC
         LIMIT ?2 OFFSET ?3",
    )
    .bind(post_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_view).collect()
}

/// Delete a comment. Allowed for the comment author and for the author
/// of the post it sits on.
pub async fn delete(
    pool: &SqlitePool,
    caller_id: i64,
    comment_id: i64,
) -> Result<(), SocialError> {
    let row = sqlx::query(
        "SELECT c.author_id AS comment_author, p.author_id AS post_author
         FROM comments c JOIN posts p ON p.id = c.post_id
         WHERE c.id = ?1",
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?
    .ok_or(SocialError::CommentNotFound)?;

    let comment_author: i64 = row.try_get("comment_author").map_err(SocialError::internal)?;
    let post_author: i64 = row.try_get("post_author").map_err(SocialError::internal)?;
    if caller_id != comment_author && caller_id != post_author {
        return Err(SocialError::Forbidden(
            "You cannot delete this comment".to_string(),
        ));
    }

    sqlx::query("DELETE FROM comments WHERE id = ?1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(())
}

async fn fetch(pool: &SqlitePool, comment_id: i64) -> Result<Option<CommentView>, SocialError> {
    let row = sqlx::query(
        "SELECT c.id, c.post_id, c.content, c.created_at,
                u.id AS author_id, u.username, u.display_name
         FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.id = ?1",
    )
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| row_to_view(&r)).transpose()
}

fn row_to_view(row: &SqliteRow) -> Result<CommentView, SocialError> {
    Ok(CommentView {
        id: row.try_get("id").map_err(SocialError::internal)?,
        post_id: row.try_get("post_id").map_err(SocialError::internal)?,
        author: UserSummary {
            id: row.try_get("author_id").map_err(SocialError::internal)?,
            username: row.try_get("username").map_err(SocialError::internal)?,
            display_name: row.try_get("display_name").map_err(SocialError::internal)?,
        },
        content: row.try_get("content").map_err(SocialError::internal)?,
        created_at: timestamp_column(row, "created_at")?,
    })
}
