//! SQLite catalog store.
//!
//! Durable state storage via `SQLx`. The order commit runs inside one
//! database transaction; stock decrements use a conditional
//! `stock >= quantity` update so a lost race can only ever fail cleanly,
//! never drive stock negative.
//!
//! Prices and totals are stored as canonical decimal strings (`TEXT`):
//! SQLite has no decimal column type and `REAL` would reintroduce float
//! rounding into money.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::domain::order::{
    OrderDraft, OrderStatus, OrderSummary, PricedLine, Receipt, order_total,
};
use crate::domain::product::{NewProduct, Product};
use crate::domain::repository::CatalogStore;
use crate::error::StoreError;

/// SQLite implementation of [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Open (creating if missing) a database and prepare the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Self::with_max_connections(database_url, 5).await
    }

    /// Open a database with a custom pool size.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!(max_connections, "SQLite connection pool initialized");

        let catalog = Self { pool };
        catalog.migrate().await?;
        Ok(catalog)
    }

    /// Wrap an existing pool (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let catalog = Self { pool };
        catalog.migrate().await?;
        Ok(catalog)
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                price TEXT NOT NULL,
                image_url TEXT,
                stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
                category TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                customer_name TEXT NOT NULL,
                customer_email TEXT NOT NULL,
                customer_phone TEXT,
                total_amount TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS order_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                order_id INTEGER NOT NULL REFERENCES orders (id),
                product_id INTEGER NOT NULL REFERENCES products (id),
                quantity INTEGER NOT NULL,
                price TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, price, image_url, stock, category, created_at
             FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_product(&r)).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, price, image_url, stock, category, created_at
             FROM products ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn create_product(&self, new: &NewProduct) -> Result<i64, StoreError> {
        new.validate()?;

        let result = sqlx::query(
            "INSERT INTO products (name, description, price, image_url, stock, category, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.to_string())
        .bind(&new.image_url)
        .bind(new.stock)
        .bind(&new.category)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(product_id = id, name = %new.name, "Product created");
        Ok(id)
    }

    async fn decrement_stock(&self, id: i64, quantity: i64) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
        )
        .bind(quantity)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 1 {
            return Ok(());
        }

        // Distinguish a missing row from an overdraw.
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match stock {
            None => Err(StoreError::product_not_found(id)),
            Some(stock) => Err(StoreError::insufficient_stock(id, quantity, stock)),
        }
    }

    async fn commit_order(&self, draft: &OrderDraft) -> Result<Receipt, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Check and decrement every line inside the transaction; an early
        // return drops `tx`, rolling back any decrements already applied.
        let mut lines = Vec::with_capacity(draft.items.len());
        for item in &draft.items {
            let row = sqlx::query("SELECT price, stock FROM products WHERE id = ?1")
                .bind(item.product_id)
                .fetch_optional(&mut *tx)
                .await?;
            let Some(row) = row else {
                return Err(StoreError::product_not_found(item.product_id));
            };

            let unit_price = decimal_column(&row, "price")?;
            let stock: i64 = row.try_get("stock").map_err(StoreError::internal)?;
            if stock < item.quantity {
                return Err(StoreError::insufficient_stock(
                    item.product_id,
                    item.quantity,
                    stock,
                ));
            }

            let updated = sqlx::query(
                "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
            )
            .bind(item.quantity)
            .bind(item.product_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            if updated != 1 {
                // A duplicate cart line already consumed the stock.
                return Err(StoreError::insufficient_stock(
                    item.product_id,
                    item.quantity,
                    stock,
                ));
            }

            lines.push(PricedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price,
            });
        }

        let total_amount = order_total(&lines);
        let order_id = sqlx::query(
            "INSERT INTO orders (customer_name, customer_email, customer_phone, total_amount, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&draft.customer_name)
        .bind(&draft.customer_email)
        .bind(&draft.customer_phone)
        .bind(total_amount.to_string())
        .bind(OrderStatus::Pending.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(order_id, total = %total_amount, "Order committed");
        Ok(Receipt {
            order_id,
            total_amount,
        })
    }

    async fn list_orders(&self) -> Result<Vec<OrderSummary>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT o.id, o.customer_name, o.customer_email, o.customer_phone,
                   o.total_amount, o.status, o.created_at,
                   COALESCE(GROUP_CONCAT(p.name || ' (x' || oi.quantity || ')', ', '), '') AS items
            FROM orders o
            LEFT JOIN order_items oi ON o.id = oi.order_id
            LEFT JOIN products p ON oi.product_id = p.id
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderSummary {
                    id: row.try_get("id").map_err(StoreError::internal)?,
                    customer_name: row
                        .try_get("customer_name")
                        .map_err(StoreError::internal)?,
                    customer_email: row
                        .try_get("customer_email")
                        .map_err(StoreError::internal)?,
                    customer_phone: row
                        .try_get("customer_phone")
                        .map_err(StoreError::internal)?,
                    total_amount: decimal_column(row, "total_amount")?,
                    status: OrderStatus::parse(
                        row.try_get::<String, _>("status")
                            .map_err(StoreError::internal)?
                            .as_str(),
                    ),
                    created_at: timestamp_column(row, "created_at")?,
                    items: row.try_get("items").map_err(StoreError::internal)?,
                })
            })
            .collect()
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product, StoreError> {
    Ok(Product {
        id: row.try_get("id").map_err(StoreError::internal)?,
        name: row.try_get("name").map_err(StoreError::internal)?,
        description: row.try_get("description").map_err(StoreError::internal)?,
        price: decimal_column(row, "price")?,
        image_url: row.try_get("image_url").map_err(StoreError::internal)?,
        stock: row.try_get("stock").map_err(StoreError::internal)?,
        category: row.try_get("category").map_err(StoreError::internal)?,
        created_at: timestamp_column(row, "created_at")?,
    })
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, StoreError> {
    let text: String = row.try_get(column).map_err(StoreError::internal)?;
    Decimal::from_str(&text)
        .map_err(|e| StoreError::internal(format!("bad decimal in column {column}: {e}")))
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, StoreError> {
    let text: String = row.try_get(column).map_err(StoreError::internal)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::internal(format!("bad timestamp in column {column}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::CartItem;
    use crate::error::ErrorCode;

    async fn temp_catalog() -> (SqliteCatalog, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/store.db", dir.path().display());
        let catalog = SqliteCatalog::connect(&url).await.unwrap();
        (catalog, dir)
    }

    async fn seed(catalog: &SqliteCatalog, name: &str, price: Decimal, stock: i64) -> i64 {
        catalog
            .create_product(&NewProduct {
                name: name.to_string(),
                description: Some("test".to_string()),
                price,
                image_url: None,
                stock,
                category: Some("test".to_string()),
            })
            .await
            .unwrap()
    }

    fn draft(items: Vec<CartItem>) -> OrderDraft {
        OrderDraft::new("Ada", "ada@example.com", Some("555-0100".to_string()), items).unwrap()
    }

    #[tokio::test]
    async fn product_round_trip_preserves_price_exactly() {
        let (catalog, _dir) = temp_catalog().await;
        let id = seed(&catalog, "Widget", Decimal::from_str("19.99").unwrap(), 4).await;

        let product = catalog.get_product(id).await.unwrap().unwrap();
        assert_eq!(product.price, Decimal::from_str("19.99").unwrap());
        assert_eq!(product.stock, 4);
        assert_eq!(product.name, "Widget");
    }

    #[tokio::test]
    async fn missing_product_reads_as_none() {
        let (catalog, _dir) = temp_catalog().await;
        assert!(catalog.get_product(12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_order_decrements_and_snapshots_prices() {
        let (catalog, _dir) = temp_catalog().await;
        let id = seed(&catalog, "Widget", Decimal::from_str("10.00").unwrap(), 5).await;

        let receipt = catalog
            .commit_order(&draft(vec![CartItem {
                product_id: id,
                quantity: 3,
            }]))
            .await
            .unwrap();
        assert_eq!(receipt.total_amount, Decimal::from_str("30.00").unwrap());
        assert_eq!(catalog.get_product(id).await.unwrap().unwrap().stock, 2);

        // A later price change must not alter the stored order.
        sqlx::query("UPDATE products SET price = '99.00' WHERE id = ?1")
            .bind(id)
            .execute(catalog.pool())
            .await
            .unwrap();
        let orders = catalog.list_orders().await.unwrap();
        assert_eq!(
            orders[0].total_amount,
            Decimal::from_str("30.00").unwrap()
        );
    }

    #[tokio::test]
    async fn overdraw_rolls_back_earlier_lines() {
        let (catalog, _dir) = temp_catalog().await;
        let a = seed(&catalog, "A", Decimal::from_str("5.00").unwrap(), 10).await;
        let b = seed(&catalog, "B", Decimal::from_str("7.00").unwrap(), 2).await;

        let err = catalog
            .commit_order(&draft(vec![
                CartItem {
                    product_id: a,
                    quantity: 4,
                },
                CartItem {
                    product_id: b,
                    quantity: 3,
                },
            ]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);
        assert!(err.message().contains(&b.to_string()));

        // Product A's decrement was rolled back with the transaction.
        assert_eq!(catalog.get_product(a).await.unwrap().unwrap().stock, 10);
        assert_eq!(catalog.get_product(b).await.unwrap().unwrap().stock, 2);
        assert!(catalog.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_aborts_commit() {
        let (catalog, _dir) = temp_catalog().await;
        let a = seed(&catalog, "A", Decimal::from_str("5.00").unwrap(), 10).await;

        let err = catalog
            .commit_order(&draft(vec![
                CartItem {
                    product_id: a,
                    quantity: 1,
                },
                CartItem {
                    product_id: 999,
                    quantity: 1,
                },
            ]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProductNotFound);
        assert!(err.message().contains("999"));
        assert_eq!(catalog.get_product(a).await.unwrap().unwrap().stock, 10);
    }

    #[tokio::test]
    async fn standalone_decrement_is_conditional() {
        let (catalog, _dir) = temp_catalog().await;
        let id = seed(&catalog, "Widget", Decimal::from_str("1.00").unwrap(), 2).await;

        catalog.decrement_stock(id, 2).await.unwrap();
        let err = catalog.decrement_stock(id, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InsufficientStock);

        let err = catalog.decrement_stock(404, 1).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn order_summaries_list_newest_first() {
        let (catalog, _dir) = temp_catalog().await;
        let a = seed(&catalog, "Widget", Decimal::from_str("2.00").unwrap(), 10).await;

        let first = catalog
            .commit_order(&draft(vec![CartItem {
                product_id: a,
                quantity: 1,
            }]))
            .await
            .unwrap();
        let second = catalog
            .commit_order(&draft(vec![CartItem {
                product_id: a,
                quantity: 2,
            }]))
            .await
            .unwrap();

        let orders = catalog.list_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.order_id);
        assert_eq!(orders[1].id, first.order_id);
        assert_eq!(orders[0].items, "Widget (x2)");
    }
}
