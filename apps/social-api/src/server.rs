//! HTTP surface: router and handlers.
//!
//! Handlers stay thin: extract the caller, delegate to a `store`
//! function, shape the JSON. Static segments (`search`, `me`, `feed`,
//! `user`) are registered alongside the capture routes; the router
//! gives them priority.

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::{NewPost, NewUser, PostUpdate, ProfileUpdate};
use crate::error::SocialError;
use crate::extract::{ApiJson, CurrentUser};
use crate::store::{comments, follows, likes, posts, users};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database pool.
    pub db: SqlitePool,
}

/// Build the full router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(register))
        .route("/api/users/search", get(search_users))
        .route("/api/users/me", put(update_profile))
        .route("/api/users/{username}", get(profile))
        .route(
            "/api/users/{username}/follow",
            post(follow_user).delete(unfollow_user),
        )
        .route("/api/users/{username}/followers", get(list_followers))
        .route("/api/users/{username}/following", get(list_following))
        .route("/api/posts", post(create_post))
        .route("/api/posts/feed", get(feed))
        .route("/api/posts/user/{username}", get(posts_by_user))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route(
            "/api/posts/{id}/comments",
            post(add_comment).get(list_comments),
        )
        .route("/api/posts/{id}/like", post(toggle_like))
        .route(
            "/api/comments/{id}",
            put(update_comment).delete(delete_comment),
        )
        .layer(cors)
        .with_state(state)
}

/// Page-based pagination query.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size, clamped to 1..=100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

const fn default_page() -> i64 {
    1
}

const fn default_limit() -> i64 {
    20
}

impl Pagination {
    fn limit(self) -> i64 {
        self.limit.clamp(1, 100)
    }

    fn offset(self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

async fn health() -> &'static str {
    "OK"
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<impl IntoResponse, SocialError> {
    let user = users::create(&state.db, &body).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

async fn search_users(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, SocialError> {
    if query.q.trim().is_empty() {
        return Err(SocialError::invalid("Search query is required"));
    }
    let page = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let hits = users::search(&state.db, &query.q, page.limit(), page.offset()).await?;
    Ok(Json(hits))
}

async fn profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, SocialError> {
    let view = users::profile_view(&state.db, viewer, &username).await?;
    if view.is_private && !view.is_own_profile && !view.is_following {
        return Err(SocialError::Forbidden("This profile is private".to_string()));
    }
    Ok(Json(view))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> Result<impl IntoResponse, SocialError> {
    let user = users::update_profile(&state.db, caller, &body).await?;
    Ok(Json(user))
}

async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, SocialError> {
    let target = users::find_by_username(&state.db, &username)
        .await?
        .ok_or(SocialError::UserNotFound)?;
    follows::follow(&state.db, caller, target.id).await?;
    tracing::debug!(follower = caller, followee = target.id, "Follow created");
    Ok(Json(MessageBody {
        message: "Followed successfully",
    }))
}

async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, SocialError> {
    let target = users::find_by_username(&state.db, &username)
        .await?
        .ok_or(SocialError::UserNotFound)?;
    follows::unfollow(&state.db, caller, target.id).await?;
    Ok(Json(MessageBody {
        message: "Unfollowed successfully",
    }))
}

async fn list_followers(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, SocialError> {
    let target = users::find_by_username(&state.db, &username)
        .await?
        .ok_or(SocialError::UserNotFound)?;
    Ok(Json(follows::followers(&state.db, target.id).await?))
}

async fn list_following(
    State(state): State<AppState>,
    _caller: CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, SocialError> {
    let target = users::find_by_username(&state.db, &username)
        .await?
        .ok_or(SocialError::UserNotFound)?;
    Ok(Json(follows::following(&state.db, target.id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(body): ApiJson<NewPost>,
) -> Result<impl IntoResponse, SocialError> {
    let post = posts::create(&state.db, caller, &body).await?;
    tracing::debug!(post_id = post.id, author = caller, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn feed(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, SocialError> {
    let posts = posts::feed(&state.db, caller, page.limit(), page.offset()).await?;
    Ok(Json(posts))
}

async fn posts_by_user(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, SocialError> {
    let author = users::find_by_username(&state.db, &username)
        .await?
        .ok_or(SocialError::UserNotFound)?;

    if author.is_private && author.id != viewer {
        let follows = follows::is_following(&state.db, viewer, author.id).await?;
        if !follows {
            return Err(SocialError::Forbidden("This profile is private".to_string()));
        }
    }

    let posts = posts::by_author(&state.db, viewer, &author, page.limit(), page.offset()).await?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SocialError> {
    Ok(Json(posts::fetch(&state.db, viewer, id).await?))
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<PostUpdate>,
) -> Result<impl IntoResponse, SocialError> {
    Ok(Json(posts::update(&state.db, caller, id, &body).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SocialError> {
    posts::delete(&state.db, caller, id).await?;
    Ok(Json(MessageBody {
        message: "Post deleted successfully",
    }))
}

#[derive(Debug, Deserialize)]
struct NewCommentBody {
    content: String,
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewCommentBody>,
) -> Result<impl IntoResponse, SocialError> {
    let comment = comments::create(&state.db, caller, id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(id): Path<i64>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, SocialError> {
    let listed = comments::for_post(&state.db, viewer, id, page.limit(), page.offset()).await?;
    Ok(Json(listed))
}

async fn update_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewCommentBody>,
) -> Result<impl IntoResponse, SocialError> {
    Ok(Json(
        comments::update(&state.db, caller, id, &body.content).await?,
    ))
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SocialError> {
    comments::delete(&state.db, caller, id).await?;
    Ok(Json(MessageBody {
        message: "Comment deleted successfully",
    }))
}

async fn toggle_like(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, SocialError> {
    Ok(Json(likes::toggle(&state.db, caller, id).await?))
}
