//! Wiring for the storefront.
//!
//! Loads configuration, installs logging and metrics, and assembles the
//! cart, checkout and review services over the configured storage backend.

pub mod config;
pub mod error;
pub mod telemetry;

use checkout::{CheckoutProcessor, TracingNotifier};
use domain::{CartManager, InMemorySessionStore, ReviewService};
use sqlx::postgres::PgPoolOptions;
use store::{Catalog, InMemoryStore, OrderStore, PostgresStore, ReviewStore, StoreError};

pub use config::{Config, LogFormat};
pub use error::{AppError, ConfigError};

/// The assembled services over one storage backend.
pub struct Storefront<S>
where
    S: Catalog + OrderStore + ReviewStore + Clone,
{
    pub store: S,
    pub carts: CartManager<InMemorySessionStore, S>,
    pub checkout: CheckoutProcessor<S, TracingNotifier>,
    pub reviews: ReviewService<S>,
}

impl<S> Storefront<S>
where
    S: Catalog + OrderStore + ReviewStore + Clone,
{
    /// Assembles the services over `store`.
    pub fn new(store: S) -> Self {
        Self {
            carts: CartManager::new(InMemorySessionStore::new(), store.clone()),
            checkout: CheckoutProcessor::new(store.clone(), TracingNotifier),
            reviews: ReviewService::new(store.clone()),
            store,
        }
    }
}

impl Storefront<InMemoryStore> {
    /// Assembles the services over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(InMemoryStore::new())
    }
}

impl Storefront<PostgresStore> {
    /// Connects to PostgreSQL, applies pending migrations and assembles the
    /// services.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(StoreError::from)?;

        let store = PostgresStore::new(pool);
        store.run_migrations().await.map_err(StoreError::from)?;
        tracing::info!(max_connections, "connected to PostgreSQL");

        Ok(Self::new(store))
    }
}
