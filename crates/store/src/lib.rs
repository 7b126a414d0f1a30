//! Persistence for the storefront: catalog, orders and reviews.
//!
//! Every collaborator is a trait with an in-memory implementation and a
//! PostgreSQL implementation. Order creation goes through an explicit
//! [`OrderTransaction`] so that stock checks, stock decrements and order
//! inserts commit or roll back together.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use common::{Money, MoneyOverflow, OrderId, ProductId, ReviewId, ShopId, UserId};
pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryTransaction};
pub use models::{Order, OrderItem, Product, Review, Shop};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use store::{Catalog, OrderStore, OrderTransaction, ReviewStore};
