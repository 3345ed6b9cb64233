//! Order placement service.
//!
//! Accepts a cart plus customer contact fields and either commits a fully
//! consistent order or commits nothing. Validation happens up front with
//! no partial processing; the atomic unit itself lives behind
//! [`CatalogStore::commit_order`]. The service bounds each attempt with a
//! timeout and retries the whole unit a configured number of times when
//! the store reports contention.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::order::{CartItem, OrderDraft, Receipt};
use crate::domain::repository::CatalogStore;
use crate::error::StoreError;

/// Incoming order request, exactly as the HTTP boundary received it.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// Customer name. Required.
    pub customer_name: String,
    /// Customer email. Required.
    pub customer_email: String,
    /// Optional phone number.
    pub customer_phone: Option<String>,
    /// Cart lines.
    pub items: Vec<CartItem>,
}

/// Service in front of the catalog's atomic order commit.
pub struct OrderService<S> {
    store: Arc<S>,
    attempt_timeout: Duration,
    retry_budget: u32,
}

impl<S: CatalogStore> OrderService<S> {
    /// Create a service with the given timeout and retry budget.
    pub fn new(store: Arc<S>, attempt_timeout: Duration, retry_budget: u32) -> Self {
        Self {
            store,
            attempt_timeout,
            retry_budget,
        }
    }

    /// Place an order.
    ///
    /// On success the order and its items are durably stored and each
    /// product's stock is reduced by the purchased quantity, all
    /// atomically. On any failure the system is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `INVALID_REQUEST`: blank customer fields, empty cart, or a
    ///   non-positive quantity.
    /// - `PRODUCT_NOT_FOUND` / `INSUFFICIENT_STOCK`: a cart line cannot be
    ///   fulfilled; the error names the product.
    /// - `CONTENTION`: the retry budget was exhausted or an attempt timed
    ///   out; the whole order is safe to resubmit.
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Receipt, StoreError> {
        let draft = OrderDraft::new(
            request.customer_name,
            request.customer_email,
            request.customer_phone,
            request.items,
        )?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_commit(&draft).await {
                Ok(receipt) => {
                    info!(
                        order_id = receipt.order_id,
                        total = %receipt.total_amount,
                        customer = %draft.customer_email,
                        "Order placed"
                    );
                    return Ok(receipt);
                }
                Err(err) if err.code().is_retryable() && attempt <= self.retry_budget => {
                    debug!(attempt, error = %err, "Retrying order commit after contention");
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Order rejected");
                    return Err(err);
                }
            }
        }
    }

    /// One timeout-bounded run of the atomic unit.
    async fn try_commit(&self, draft: &OrderDraft) -> Result<Receipt, StoreError> {
        match tokio::time::timeout(self.attempt_timeout, self.store.commit_order(draft)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::contention("Order commit timed out")),
        }
    }
}
