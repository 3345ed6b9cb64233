//! Persistence Adapters
//!
//! Catalog store implementations: SQLite for the real thing, in-memory
//! for tests and development.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;
