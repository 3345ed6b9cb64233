//! In-memory catalog store.
//!
//! Suitable for testing and development. A single mutex guards all state,
//! so an order commit is trivially atomic: the lock is held across every
//! check, decrement, and insert of the draft.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::order::{
    Order, OrderDraft, OrderItem, OrderStatus, OrderSummary, PricedLine, Receipt, order_total,
};
use crate::domain::product::{NewProduct, Product};
use crate::domain::repository::CatalogStore;
use crate::error::StoreError;

#[derive(Debug, Default)]
struct Inner {
    products: BTreeMap<i64, Product>,
    orders: Vec<(Order, Vec<OrderItem>)>,
    next_product_id: i64,
    next_order_id: i64,
    next_item_id: i64,
}

/// In-memory implementation of [`CatalogStore`].
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: Mutex<Inner>,
}

impl MemoryCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders (for test assertions).
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut products: Vec<Product> = inner.products.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn create_product(&self, new: &NewProduct) -> Result<i64, StoreError> {
        new.validate()?;

        let mut inner = self.inner.lock().unwrap();
        inner.next_product_id += 1;
        let id = inner.next_product_id;
        inner.products.insert(
            id,
            Product {
                id,
                name: new.name.clone(),
                description: new.description.clone(),
                price: new.price,
                image_url: new.image_url.clone(),
                stock: new.stock,
                category: new.category.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn decrement_stock(&self, id: i64, quantity: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let product = inner
            .products
            .get_mut(&id)
            .ok_or_else(|| StoreError::product_not_found(id))?;
        if product.stock < quantity {
            return Err(StoreError::insufficient_stock(id, quantity, product.stock));
        }
        product.stock -= quantity;
        Ok(())
    }

    async fn commit_order(&self, draft: &OrderDraft) -> Result<Receipt, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Stage decrements on a copy so a mid-cart failure leaves the
        // live catalog untouched.
        let mut staged = inner.products.clone();
        let mut lines = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            let product = staged
                .get_mut(&item.product_id)
                .ok_or_else(|| StoreError::product_not_found(item.product_id))?;
            if product.stock < item.quantity {
                return Err(StoreError::insufficient_stock(
                    item.product_id,
                    item.quantity,
                    product.stock,
                ));
            }
            product.stock -= item.quantity;
            lines.push(PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let total_amount = order_total(&lines);
        inner.next_order_id += 1;
        let order_id = inner.next_order_id;

        let order = Order {
            id: order_id,
            customer_name: draft.customer_name.clone(),
            customer_email: draft.customer_email.clone(),
            customer_phone: draft.customer_phone.clone(),
            total_amount,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        let items = lines
            .iter()
            .map(|line| {
                inner.next_item_id += 1;
                OrderItem {
                    id: inner.next_item_id,
                    order_id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.unit_price,
                }
            })
            .collect();

        inner.products = staged;
        inner.orders.push((order, items));

        Ok(Receipt {
            order_id,
            total_amount,
        })
    }

    async fn list_orders(&self) -> Result<Vec<OrderSummary>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut summaries: Vec<OrderSummary> = inner
            .orders
            .iter()
            .map(|(order, items)| {
                let items = items
                    .iter()
                    .map(|item| {
                        let name = inner
                            .products
                            .get(&item.product_id)
                            .map_or("?", |p| p.name.as_str());
                        format!("{name} (x{})", item.quantity)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                OrderSummary {
                    id: order.id,
                    customer_name: order.customer_name.clone(),
                    customer_email: order.customer_email.clone(),
                    customer_phone: order.customer_phone.clone(),
                    total_amount: order.total_amount,
                    status: order.status,
                    created_at: order.created_at,
                    items,
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(summaries)
    }
}
