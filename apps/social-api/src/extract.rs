//! Request extractors.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;

use crate::error::SocialError;

/// Header carrying the authenticated user id, set by the upstream
/// gateway after it validates the session.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
///
/// Requests without a parseable `X-User-Id` header are rejected with
/// 401 before the handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = SocialError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or(SocialError::Unauthorized)
    }
}

/// JSON body extractor that reports malformed or mistyped bodies in the
/// standard `{"error": message}` shape instead of axum's plain-text
/// rejection.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = SocialError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(SocialError::invalid(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CurrentUser, SocialError> {
        let (mut parts, ()) = request.into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_present() {
        let request = Request::builder()
            .header("X-User-Id", "42")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap(), CurrentUser(42));
    }

    #[tokio::test]
    async fn header_missing_or_garbled() {
        let bare = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(bare).await.unwrap_err(),
            SocialError::Unauthorized
        ));

        let garbled = Request::builder()
            .header("X-User-Id", "not-a-number")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(garbled).await.unwrap_err(),
            SocialError::Unauthorized
        ));
    }
}
