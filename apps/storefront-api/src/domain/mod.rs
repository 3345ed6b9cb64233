//! Domain layer.
//!
//! Entities and invariants for the catalog and orders, plus the
//! [`CatalogStore`] port implemented by persistence adapters.

pub mod order;
pub mod product;
pub mod repository;

pub use order::{CartItem, Order, OrderDraft, OrderItem, OrderStatus, OrderSummary, PricedLine, Receipt, order_total};
pub use product::{NewProduct, Product};
pub use repository::CatalogStore;
