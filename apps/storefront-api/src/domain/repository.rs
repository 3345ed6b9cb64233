//! Catalog store port.
//!
//! The persistence abstraction the application layer talks to.
//! Implemented by adapters in the infrastructure layer (SQLite,
//! in-memory).

use async_trait::async_trait;

use super::order::{OrderDraft, OrderSummary, Receipt};
use super::product::{NewProduct, Product};
use crate::error::StoreError;

/// Storage contract for the catalog and orders.
///
/// [`commit_order`](Self::commit_order) is the heart of the contract: the
/// stock checks, stock decrements, and order/item inserts for one draft
/// behave as a single atomic unit. Other concurrent operations observe the
/// unit entirely or not at all, so overlapping orders can never oversell
/// and a rejected order leaves no trace.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one product. Read-only; never mutates state.
    async fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError>;

    /// List all products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Insert a product (admin operation). Returns the new id.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_REQUEST` when the create invariants fail.
    async fn create_product(&self, new: &NewProduct) -> Result<i64, StoreError>;

    /// Conditionally remove `quantity` units of stock.
    ///
    /// Fails cleanly, with no partial decrement, when the product is
    /// missing (`PRODUCT_NOT_FOUND`) or stock would go negative
    /// (`INSUFFICIENT_STOCK`).
    async fn decrement_stock(&self, id: i64, quantity: i64) -> Result<(), StoreError>;

    /// Commit an order as one atomic unit.
    ///
    /// For every cart line: read the product's current price and stock,
    /// fail with `PRODUCT_NOT_FOUND` or `INSUFFICIENT_STOCK` (naming the
    /// product) if it cannot be fulfilled, and decrement stock. Then
    /// persist the order header and all line items with the observed unit
    /// prices, and return the receipt with the total computed from those
    /// same prices.
    ///
    /// Either everything above commits and becomes visible together, or
    /// nothing does. Lost races surface as `CONTENTION` and the whole
    /// draft is safe to resubmit.
    async fn commit_order(&self, draft: &OrderDraft) -> Result<Receipt, StoreError>;

    /// List all orders with item summaries, newest first (admin view).
    async fn list_orders(&self) -> Result<Vec<OrderSummary>, StoreError>;
}
