//! Error taxonomy for the social API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Social API errors, each with a stable HTTP status.
#[derive(Debug, Error)]
pub enum SocialError {
    /// Malformed request or invalid field values.
    #[error("{0}")]
    InvalidRequest(String),

    /// No caller identity on the request.
    #[error("Authentication required")]
    Unauthorized,

    /// Caller may not see or change this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Referenced user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Referenced post does not exist.
    #[error("Post not found")]
    PostNotFound,

    /// Referenced comment does not exist.
    #[error("Comment not found")]
    CommentNotFound,

    /// Username already taken.
    #[error("Username is already taken")]
    UsernameTaken,

    /// Unexpected server error. The detail stays in the log.
    #[error("Internal server error")]
    Internal,
}

impl SocialError {
    /// HTTP status this error maps to.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::UsernameTaken => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::UserNotFound | Self::PostNotFound | Self::CommentNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Invalid request with a message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Internal error; the detail is logged, never echoed to clients.
    #[must_use]
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal social-api error");
        Self::Internal
    }
}

impl From<sqlx::Error> for SocialError {
    fn from(err: sqlx::Error) -> Self {
        Self::internal(err)
    }
}

/// Error body shape for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for SocialError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            SocialError::invalid("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SocialError::Unauthorized.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            SocialError::Forbidden("This profile is private".into()).http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            SocialError::PostNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            SocialError::Internal.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_hides_detail() {
        let err = SocialError::internal("UNIQUE constraint failed: users.username");
        assert_eq!(err.to_string(), "Internal server error");
    }
}
