//! Checkout error types.

use common::ProductId;
use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart holds no entries.
    #[error("Cannot check out an empty cart")]
    EmptyCart,

    /// A product had less stock than the cart requested.
    ///
    /// Nothing from the failed checkout persists.
    #[error(
        "Insufficient stock for {product_name} ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        requested: u32,
        available: u32,
    },

    /// A line subtotal or the order total does not fit in [`common::Money`].
    ///
    /// Nothing from the failed checkout persists.
    #[error("Amount out of range for product {product_id}")]
    AmountOverflow { product_id: ProductId },

    /// A storage error occurred.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The session cart could not be loaded or saved.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Errors raised by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The invoice could not be handed to the transport.
    #[error("Invoice delivery failed: {0}")]
    Delivery(String),
}
