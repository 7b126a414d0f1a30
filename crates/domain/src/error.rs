//! Domain error types.

use common::{ProductId, ReviewId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rating outside the 1..=5 scale.
    #[error("Invalid rating: {0} (must be between 1 and 5)")]
    InvalidRating(u8),

    /// The reviewed product is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The review does not exist.
    #[error("Review not found: {0}")]
    ReviewNotFound(ReviewId),

    /// Only the author may change or delete a review.
    #[error("Review {0} belongs to another user")]
    NotAuthor(ReviewId),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An error occurred in a review operation.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// A line subtotal or the cart total does not fit in [`common::Money`].
    #[error("Amount out of range while pricing product {0}")]
    AmountOverflow(ProductId),

    /// A session payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
