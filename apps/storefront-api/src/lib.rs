// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::items_after_statements
    )
)]

//! Storefront API - Library
//!
//! E-commerce backend: product catalog, admin product creation, order
//! placement. The one piece of real machinery here is checkout: stock
//! validation, stock decrement, and order creation happen as a single
//! atomic unit of work, so two concurrent orders can never oversell a
//! product and a failed order never leaves partial state behind.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: `Product`, `Order`/`OrderItem`, the [`domain::CatalogStore`]
//!   port that persistence adapters implement.
//! - **Application**: [`application::OrderService`] (validation, bounded
//!   timeout, retry on contention) and [`application::CatalogService`]
//!   (admin catalog operations).
//! - **Infrastructure**: SQLite and in-memory catalog adapters.
//! - **Server**: the axum JSON API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - entities, invariants, and the catalog port.
pub mod domain;

/// Application layer - order placement and catalog services.
pub mod application;

/// Infrastructure layer - persistence adapters.
pub mod infrastructure;

/// HTTP server - axum router and DTOs.
pub mod server;

/// Error taxonomy shared by all layers.
pub mod error;

/// Environment-based configuration.
pub mod config;

pub use application::{CatalogService, OrderService};
pub use config::Settings;
pub use domain::{CartItem, CatalogStore, NewProduct, Order, OrderItem, Product, Receipt};
pub use error::{ErrorCode, StoreError};
pub use infrastructure::persistence::{MemoryCatalog, SqliteCatalog};
pub use server::{AppState, create_router};
