//! Social API
//!
//! Social-media backend: user profiles, posts with visibility tiers,
//! comments, likes, and follows. A thin route layer over SQLite; the
//! upstream gateway authenticates callers and forwards their id in the
//! `X-User-Id` header.

#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        missing_docs
    )
)]

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod extract;
pub mod server;
pub mod store;

pub use config::Settings;
pub use error::SocialError;
pub use server::{AppState, create_router};
