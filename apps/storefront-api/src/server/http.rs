//! HTTP/JSON API.
//!
//! Thin boundary over the application services: it parses requests, calls
//! the services, and maps [`StoreError`] codes to HTTP statuses with
//! `{"error": message}` bodies. Storage errors never reach clients
//! verbatim.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Request, State, rejection::JsonRejection},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::application::{CatalogService, OrderService, PlaceOrder};
use crate::domain::order::{CartItem, OrderSummary};
use crate::domain::product::{NewProduct, Product};
use crate::domain::repository::CatalogStore;
use crate::error::StoreError;

/// Shared state for the HTTP server.
pub struct AppState<S> {
    /// Order placement service.
    pub orders: Arc<OrderService<S>>,
    /// Catalog read/admin service.
    pub catalog: Arc<CatalogService<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
            catalog: Arc::clone(&self.catalog),
        }
    }
}

/// Create the axum router with all endpoints.
#[must_use]
pub fn create_router<S: CatalogStore + 'static>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/{id}", get(get_product))
        .route("/api/orders", get(list_orders).post(create_order))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn list_products<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.catalog.list_products().await?))
}

async fn get_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.catalog.get_product(id).await?))
}

/// Response for a successful product create.
#[derive(Debug, Serialize)]
pub struct CreateProductResponse {
    /// New product id.
    pub id: i64,
    /// Confirmation message.
    pub message: String,
}

async fn create_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ApiJson(new): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<CreateProductResponse>), ApiError> {
    let id = state.catalog.create_product(new).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateProductResponse {
            id,
            message: "Product added successfully".to_string(),
        }),
    ))
}

/// Request body for `POST /api/orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Customer name. Required.
    pub customer_name: String,
    /// Customer email. Required.
    pub customer_email: String,
    /// Optional phone number.
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

/// One cart line in an order request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderItemRequest {
    /// Product being purchased.
    pub product_id: i64,
    /// Units requested.
    pub quantity: i64,
}

/// Response for a successful order placement.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    /// New order id.
    pub id: i64,
    /// Confirmation message.
    pub message: String,
    /// Total charged.
    pub total_amount: Decimal,
}

async fn create_order<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    tracing::info!(
        customer = %req.customer_email,
        items = req.items.len(),
        "Placing order"
    );

    let receipt = state
        .orders
        .place_order(PlaceOrder {
            customer_name: req.customer_name,
            customer_email: req.customer_email,
            customer_phone: req.customer_phone,
            items: req
                .items
                .iter()
                .map(|item| CartItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            id: receipt.order_id,
            message: "Order created successfully".to_string(),
            total_amount: receipt.total_amount,
        }),
    ))
}

async fn list_orders<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<OrderSummary>>, ApiError> {
    Ok(Json(state.catalog.list_orders().await?))
}

/// Error body shape for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

/// API error: a [`StoreError`] at the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.code().http_status();
        let body = ErrorBody {
            error: self.0.message().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON body extractor that reports malformed or mistyped bodies in the
/// standard `{"error": message}` shape instead of axum's plain-text
/// rejection.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError(StoreError::invalid_request(rejection.body_text()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::MemoryCatalog;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    fn make_state() -> AppState<MemoryCatalog> {
        let store = Arc::new(MemoryCatalog::new());
        AppState {
            orders: Arc::new(OrderService::new(
                Arc::clone(&store),
                Duration::from_secs(5),
                3,
            )),
            catalog: Arc::new(CatalogService::new(store)),
        }
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = create_router(make_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_product_is_404_with_error_body() {
        let app = create_router(make_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/products/77")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.contains("77"));
    }

    #[tokio::test]
    async fn missing_required_field_gets_json_error_body() {
        let app = create_router(make_state());

        // No price at all: the body never deserializes, but the client
        // still gets the standard error shape.
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "Widget"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert!(body.error.contains("price"));
    }

    #[tokio::test]
    async fn product_create_requires_name() {
        let app = create_router(make_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "  ", "price": "1.00"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
