//! Catalog read/admin service.

use std::sync::Arc;

use tracing::info;

use crate::domain::order::OrderSummary;
use crate::domain::product::{NewProduct, Product};
use crate::domain::repository::CatalogStore;
use crate::error::StoreError;

/// Thin service over the catalog port for the non-checkout routes.
pub struct CatalogService<S> {
    store: Arc<S>,
}

impl<S: CatalogStore> CatalogService<S> {
    /// Create a new catalog service.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All products, newest first.
    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.store.list_products().await
    }

    /// One product, or `PRODUCT_NOT_FOUND`.
    pub async fn get_product(&self, id: i64) -> Result<Product, StoreError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| StoreError::product_not_found(id))
    }

    /// Admin insert. Validates the create invariants first.
    pub async fn create_product(&self, new: NewProduct) -> Result<i64, StoreError> {
        new.validate()?;
        let id = self.store.create_product(&new).await?;
        info!(product_id = id, name = %new.name, "Product added");
        Ok(id)
    }

    /// Admin order view with item summaries, newest first.
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, StoreError> {
        self.store.list_orders().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::infrastructure::persistence::MemoryCatalog;
    use rust_decimal::Decimal;

    fn widget(stock: i64) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: None,
            price: Decimal::new(1000, 2),
            image_url: None,
            stock,
            category: None,
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let svc = CatalogService::new(Arc::new(MemoryCatalog::new()));
        let id = svc.create_product(widget(3)).await.unwrap();
        let product = svc.get_product(id).await.unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 3);
    }

    #[tokio::test]
    async fn get_missing_product_is_not_found() {
        let svc = CatalogService::new(Arc::new(MemoryCatalog::new()));
        let err = svc.get_product(404).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let svc = CatalogService::new(Arc::new(MemoryCatalog::new()));
        let mut bad = widget(1);
        bad.name = String::new();
        let err = svc.create_product(bad).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert!(svc.list_products().await.unwrap().is_empty());
    }
}
