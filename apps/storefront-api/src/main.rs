//! Storefront API Binary
//!
//! # Usage
//!
//! ```bash
//! cargo run -p storefront-api
//! ```
//!
//! # Environment Variables
//!
//! - `PORT`: HTTP listen port (default: 3000)
//! - `DATABASE_URL`: SQLite database (default: `sqlite://storefront.db`)
//! - `CHECKOUT_TIMEOUT_MS`: cap on one checkout attempt (default: 5000)
//! - `CHECKOUT_RETRIES`: retry budget on contention (default: 3)
//! - `RUST_LOG`: log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use storefront_api::application::{CatalogService, OrderService};
use storefront_api::config::Settings;
use storefront_api::infrastructure::persistence::SqliteCatalog;
use storefront_api::server::{AppState, create_router};
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
        "Starting storefront API"
    );

    let store = Arc::new(SqliteCatalog::connect(&settings.database_url).await?);
    let state = AppState {
        orders: Arc::new(OrderService::new(
            Arc::clone(&store),
            settings.checkout_timeout,
            settings.checkout_retries,
        )),
        catalog: Arc::new(CatalogService::new(store)),
    };

    let app = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Storefront API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Storefront API shut down");
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
