//! Orders, line items, and checkout arithmetic.
//!
//! An [`OrderDraft`] is what checkout validates and hands to the catalog
//! store; [`Order`] and [`OrderItem`] are what comes back out of storage.
//! Item prices are snapshots taken inside the commit transaction and are
//! never recomputed from live product prices, so historical orders keep
//! their value when prices change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One product+quantity entry in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product being purchased.
    pub product_id: i64,
    /// Units requested. Positive.
    pub quantity: i64,
}

/// A validated order request, ready for the atomic commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    /// Customer name. Non-empty.
    pub customer_name: String,
    /// Customer email. Non-empty.
    pub customer_email: String,
    /// Optional phone number.
    pub customer_phone: Option<String>,
    /// Cart lines. Non-empty, all quantities positive.
    pub items: Vec<CartItem>,
}

impl OrderDraft {
    /// Validate input constraints and build a draft.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_REQUEST` when the name or email is blank, the cart
    /// is empty, or any quantity is not positive. Nothing is partially
    /// processed on failure.
    pub fn new(
        customer_name: impl Into<String>,
        customer_email: impl Into<String>,
        customer_phone: Option<String>,
        items: Vec<CartItem>,
    ) -> Result<Self, StoreError> {
        let customer_name = customer_name.into();
        let customer_email = customer_email.into();

        if customer_name.trim().is_empty() || customer_email.trim().is_empty() {
            return Err(StoreError::invalid_request(
                "Customer details and items are required",
            ));
        }
        if items.is_empty() {
            return Err(StoreError::invalid_request(
                "Customer details and items are required",
            ));
        }
        if let Some(item) = items.iter().find(|i| i.quantity <= 0) {
            return Err(StoreError::invalid_request(format!(
                "Quantity for product {} must be positive",
                item.product_id
            )));
        }

        Ok(Self {
            customer_name,
            customer_email,
            customer_phone,
            items,
        })
    }
}

/// Result of a successful order placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Id of the durably stored order.
    pub order_id: i64,
    /// Total charged, computed from prices observed at commit time.
    pub total_amount: Decimal,
}

/// Order lifecycle status.
///
/// Checkout only ever produces `Pending`; later transitions are an
/// administrative concern outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, awaiting fulfilment.
    Pending,
    /// Handed to shipping.
    Shipped,
    /// Cancelled administratively.
    Cancelled,
}

impl OrderStatus {
    /// Stable storage/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse from storage; unknown values read back as `Pending`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "shipped" => Self::Shipped,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// A stored order header. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id.
    pub id: i64,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Optional phone number.
    pub customer_phone: Option<String>,
    /// Total charged.
    pub total_amount: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
}

/// One line of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique line id.
    pub id: i64,
    /// Owning order.
    pub order_id: i64,
    /// Referenced product (non-owning).
    pub product_id: i64,
    /// Units purchased.
    pub quantity: i64,
    /// Unit price at purchase time.
    pub price: Decimal,
}

/// Admin view of an order: the header plus a readable items summary,
/// e.g. `"Widget (x2), Gadget (x1)"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Unique order id.
    pub id: i64,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Optional phone number.
    pub customer_phone: Option<String>,
    /// Total charged.
    pub total_amount: Decimal,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Placement timestamp.
    pub created_at: DateTime<Utc>,
    /// Human-readable line summary.
    pub items: String,
}

/// A cart line with the unit price observed inside the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    /// Referenced product.
    pub product_id: i64,
    /// Units purchased.
    pub quantity: i64,
    /// Unit price at commit time.
    pub unit_price: Decimal,
}

/// Sum of `quantity * unit_price` over the priced lines.
///
/// Both persistence adapters compute order totals through this one
/// function so the arithmetic cannot drift between them.
#[must_use]
pub fn order_total(lines: &[PricedLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.unit_price * Decimal::from(line.quantity))
        .sum()
}
