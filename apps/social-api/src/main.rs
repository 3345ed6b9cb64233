//! Social API Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run -p social-api
//! ```
//!
//! # Environment Variables
//!
//! - `PORT`: HTTP listen port (default: 3001)
//! - `DATABASE_URL`: SQLite database (default: `sqlite://social.db`)
//! - `RUST_LOG`: log filter (default: info)

use std::net::SocketAddr;

use social_api::config::Settings;
use social_api::server::{AppState, create_router};
use social_api::db;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present; real environments set variables directly.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    tracing::info!(
        port = settings.port,
        database = %settings.database_url,
        "Starting social API"
    );

    let pool = db::connect(&settings.database_url).await?;
    let app = create_router(AppState { db: pool });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Social API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Social API shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
