//! Storefront host process.
//!
//! Loads configuration, installs telemetry, opens the configured store
//! (applying migrations on PostgreSQL) and serves the Prometheus endpoint
//! until interrupted. The services are driven through the library crate; this
//! binary exposes no request surface of its own.

use app::{AppError, Config, Storefront, telemetry};
use store::{Catalog, OrderStore, ReviewStore};
use tokio::signal;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                tracing::info!("received SIGINT, shutting down");
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM, shutting down");
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        tracing::info!("received SIGINT, shutting down");
        Ok(())
    }
}

/// Reports the catalog the services start with, then waits for shutdown.
async fn run<S>(storefront: Storefront<S>, backend: &'static str) -> Result<(), AppError>
where
    S: Catalog + OrderStore + ReviewStore + Clone,
{
    let products = storefront.store.list_products().await?;
    let in_stock = products.iter().filter(|p| p.stock > 0).count();
    tracing::info!(backend, products = products.len(), in_stock, "storefront ready");

    shutdown_signal().await?;
    tracing::info!("storefront stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Configuration and telemetry
    let config = Config::from_env()?;
    telemetry::init_tracing(&config)?;
    let _metrics = telemetry::install_metrics(&config)?;

    // 2. Storage backend
    match &config.database_url {
        Some(url) => {
            let storefront = Storefront::connect(url, config.database_max_connections).await?;
            run(storefront, "postgres").await
        }
        None => run(Storefront::in_memory(), "memory").await,
    }
}
