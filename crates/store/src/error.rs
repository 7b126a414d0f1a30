use thiserror::Error;

use common::{ProductId, ShopId};

/// Errors that can occur when interacting with the storefront store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional stock decrement found less stock than requested.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The product does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product violates a catalog invariant.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// The shop does not exist.
    #[error("Shop not found: {0}")]
    ShopNotFound(ShopId),

    /// A stored row holds a value the domain types cannot represent.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
