//! Application layer.
//!
//! Services orchestrating the domain over the catalog port.

pub mod catalog_service;
pub mod order_service;

pub use catalog_service::CatalogService;
pub use order_service::{OrderService, PlaceOrder};
