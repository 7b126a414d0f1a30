//! Domain layer for the storefront.
//!
//! This crate provides:
//! - The session-scoped [`Cart`] and the [`CartManager`] that loads, mutates
//!   and persists it
//! - The [`SessionStore`] boundary with an in-memory implementation
//! - The [`ReviewService`] for verified product reviews

pub mod cart;
pub mod customer;
pub mod error;
pub mod reviews;
pub mod session;

pub use cart::{Cart, CartEntry, CartLine, CartManager, PricedCart, parse_quantity};
pub use customer::Customer;
pub use error::{DomainError, ReviewError};
pub use reviews::ReviewService;
pub use session::{InMemorySessionStore, SessionStore};
