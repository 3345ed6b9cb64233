//! Product entity and the admin create command.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A sellable product in the catalog.
///
/// Invariant: `stock` is never negative. Stock only moves through the
/// conditional decrement inside an order commit or an admin edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Optional long description.
    pub description: Option<String>,
    /// Unit price. Non-negative.
    pub price: Decimal,
    /// Optional image URL for the storefront UI.
    pub image_url: Option<String>,
    /// Sellable units currently available. Non-negative.
    pub stock: i64,
    /// Optional category label.
    pub category: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Command to create a product (admin operation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name. Required, non-empty.
    pub name: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price. Required, non-negative.
    pub price: Decimal,
    /// Optional image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Initial stock. Defaults to zero, non-negative.
    #[serde(default)]
    pub stock: i64,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
}

impl NewProduct {
    /// Check the create invariants: non-empty name, non-negative price
    /// and stock.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::invalid_request("Name and price are required"));
        }
        if self.price < Decimal::ZERO {
            return Err(StoreError::invalid_request("Price cannot be negative"));
        }
        if self.stock < 0 {
            return Err(StoreError::invalid_request("Stock cannot be negative"));
        }
        Ok(())
    }
}
