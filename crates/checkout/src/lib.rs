//! Checkout for the storefront.
//!
//! The [`CheckoutProcessor`] turns a cart into an order inside one store
//! transaction: products are locked, stock is checked and decremented and
//! the order is inserted, all or nothing. After commit the customer gets an
//! invoice through a [`Notifier`]; delivery failures are logged and counted
//! but never undo the order.

pub mod error;
pub mod invoice;
pub mod notifier;
pub mod processor;

pub use error::{CheckoutError, NotifyError, Result};
pub use invoice::Invoice;
pub use notifier::{InMemoryNotifier, Notifier, TracingNotifier};
pub use processor::CheckoutProcessor;
