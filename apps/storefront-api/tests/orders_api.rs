//! End-to-end tests for the storefront API over a real SQLite database.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use storefront_api::application::{CatalogService, OrderService, PlaceOrder};
use storefront_api::domain::CartItem;
use storefront_api::error::ErrorCode;
use storefront_api::infrastructure::persistence::SqliteCatalog;
use storefront_api::server::{AppState, create_router};
use tower::ServiceExt;

async fn test_app(dir: &tempfile::TempDir) -> (Router, Arc<SqliteCatalog>) {
    let url = format!("sqlite://{}/store.db", dir.path().display());
    let store = Arc::new(SqliteCatalog::connect(&url).await.unwrap());
    let state = AppState {
        orders: Arc::new(OrderService::new(
            Arc::clone(&store),
            Duration::from_secs(5),
            3,
        )),
        catalog: Arc::new(CatalogService::new(Arc::clone(&store))),
    };
    (create_router(state), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_product(app: &Router, name: &str, price: &str, stock: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/products",
        Some(json!({"name": name, "price": price, "stock": stock})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

fn order_body(product_id: i64, quantity: i64) -> Value {
    json!({
        "customer_name": "Ada Lovelace",
        "customer_email": "ada@example.com",
        "items": [{"product_id": product_id, "quantity": quantity}]
    })
}

#[tokio::test]
async fn place_order_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_app(&dir).await;
    let id = create_product(&app, "Widget", "10.00", 5).await;

    let (status, body) = send(&app, "POST", "/api/orders", Some(order_body(id, 3))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Order created successfully");
    let total = Decimal::from_str(body["total_amount"].as_str().unwrap()).unwrap();
    assert_eq!(total, Decimal::from_str("30.00").unwrap());

    // Stock is durably reduced.
    let (status, product) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["stock"], 2);

    // The admin view shows the order with its items summary.
    let (status, orders) = send(&app, "GET", "/api/orders", None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["items"], "Widget (x3)");
    assert_eq!(orders[0]["status"], "pending");
}

#[tokio::test]
async fn order_with_missing_fields_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_app(&dir).await;
    let id = create_product(&app, "Widget", "10.00", 5).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "customer_name": "",
            "customer_email": "ada@example.com",
            "items": [{"product_id": id, "quantity": 1}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Customer details and items are required");

    let (status, _) = send(
        &app,
        "POST",
        "/api/orders",
        Some(json!({
            "customer_name": "Ada",
            "customer_email": "ada@example.com",
            "items": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was processed.
    let (_, product) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(product["stock"], 5);
}

#[tokio::test]
async fn order_for_unknown_product_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_app(&dir).await;

    let (status, body) = send(&app, "POST", "/api/orders", Some(order_body(999, 1))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("999"));

    let (_, orders) = send(&app, "GET", "/api/orders", None).await;
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn overselling_is_rejected_and_stock_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_app(&dir).await;
    let id = create_product(&app, "Widget", "10.00", 2).await;

    let (status, body) = send(&app, "POST", "/api/orders", Some(order_body(id, 3))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Insufficient stock"));
    assert!(message.contains(&id.to_string()));

    let (_, product) = send(&app, "GET", &format!("/api/products/{id}"), None).await;
    assert_eq!(product["stock"], 2);
}

#[tokio::test]
async fn products_list_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _store) = test_app(&dir).await;
    create_product(&app, "First", "1.00", 1).await;
    let second = create_product(&app, "Second", "2.00", 1).await;

    let (status, products) = send(&app, "GET", "/api/products", None).await;
    assert_eq!(status, StatusCode::OK);
    let products = products.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"].as_i64().unwrap(), second);
}

#[tokio::test]
async fn concurrent_orders_for_the_last_unit() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/store.db", dir.path().display());
    // One connection: competing transactions fully serialize, which makes
    // the loser's InsufficientStock deterministic.
    let store = Arc::new(
        SqliteCatalog::with_max_connections(&url, 1)
            .await
            .unwrap(),
    );
    let catalog = CatalogService::new(Arc::clone(&store));
    let id = catalog
        .create_product(storefront_api::domain::NewProduct {
            name: "Last one".to_string(),
            description: None,
            price: Decimal::from_str("10.00").unwrap(),
            image_url: None,
            stock: 1,
            category: None,
        })
        .await
        .unwrap();

    let service = Arc::new(OrderService::new(
        Arc::clone(&store),
        Duration::from_secs(5),
        3,
    ));
    let place = |svc: Arc<OrderService<SqliteCatalog>>| async move {
        svc.place_order(PlaceOrder {
            customer_name: "Ada".to_string(),
            customer_email: "ada@example.com".to_string(),
            customer_phone: None,
            items: vec![CartItem {
                product_id: id,
                quantity: 1,
            }],
        })
        .await
    };

    let one = tokio::spawn(place(Arc::clone(&service)));
    let two = tokio::spawn(place(Arc::clone(&service)));
    let (one, two) = (one.await.unwrap(), two.await.unwrap());

    let successes = [&one, &two].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one order may win the last unit");
    let loser = if one.is_err() { one } else { two };
    assert_eq!(loser.unwrap_err().code(), ErrorCode::InsufficientStock);

    assert_eq!(catalog.get_product(id).await.unwrap().stock, 0);
    assert_eq!(catalog.list_orders().await.unwrap().len(), 1);
}
