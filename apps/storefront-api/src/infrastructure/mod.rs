//! Infrastructure layer.
//!
//! Adapters implementing the domain ports.

pub mod persistence;
