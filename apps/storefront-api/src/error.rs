//! Error taxonomy for the storefront.
//!
//! Every failure of the order-placement flow falls into one of a small set
//! of codes, each with a stable HTTP status:
//!
//! | Code | Status | Retry? |
//! |------|--------|--------|
//! | `INVALID_REQUEST` | 400 | No - fix the request |
//! | `INSUFFICIENT_STOCK` | 400 | No - demand exceeds availability |
//! | `PRODUCT_NOT_FOUND` | 404 | No |
//! | `CONTENTION` | 503 | Yes - the whole order is safe to retry |
//! | `INTERNAL_ERROR` | 500 | - |
//!
//! A failed operation never leaves partial state behind, so callers may
//! treat any error as "nothing happened".

use axum::http::StatusCode;
use thiserror::Error;

/// Error codes for the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed request or invalid field values.
    InvalidRequest,
    /// Referenced product does not exist.
    ProductNotFound,
    /// Requested quantity exceeds available stock at commit time.
    InsufficientStock,
    /// Lost a race for the stock rows or the unit of work timed out.
    Contention,
    /// Unexpected server error.
    InternalError,
}

impl ErrorCode {
    /// Stable reason string for logs and clients.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::Contention => "CONTENTION",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// HTTP status this code maps to at the boundary.
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidRequest | Self::InsufficientStock => StatusCode::BAD_REQUEST,
            Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::Contention => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller may safely retry the whole operation.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Contention)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// A storefront error with a code and a human-readable message.
///
/// The message is safe to show to API clients; raw storage errors are
/// wrapped as [`ErrorCode::InternalError`] with a generic message and the
/// detail kept for logging only.
#[derive(Debug, Error)]
#[error("[{code}] {message}")]
pub struct StoreError {
    code: ErrorCode,
    message: String,
}

impl StoreError {
    /// Create a new error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Invalid request shape or field values.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Referenced product is absent.
    #[must_use]
    pub fn product_not_found(product_id: i64) -> Self {
        Self::new(
            ErrorCode::ProductNotFound,
            format!("Product {product_id} not found"),
        )
    }

    /// Demand exceeds availability for a product.
    #[must_use]
    pub fn insufficient_stock(product_id: i64, requested: i64, available: i64) -> Self {
        Self::new(
            ErrorCode::InsufficientStock,
            format!(
                "Insufficient stock for product {product_id}: requested {requested}, available {available}"
            ),
        )
    }

    /// Contention on the unit of work; the whole order may be retried.
    #[must_use]
    pub fn contention(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Contention, message)
    }

    /// Unexpected internal error. The detail goes to the log, not the client.
    #[must_use]
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "internal storefront error");
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_busy(&err) {
            Self::contention("Catalog is busy, retry the order")
        } else {
            Self::internal(err)
        }
    }
}

/// SQLite signals lock contention as `SQLITE_BUSY`/`SQLITE_LOCKED`; both
/// mean the unit of work can be retried from scratch.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            let code = db.code();
            matches!(code.as_deref(), Some("5" | "6" | "517" | "262"))
                || db.message().contains("database is locked")
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
