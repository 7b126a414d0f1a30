//! Shared identifier and money types for the storefront workspace.

mod money;
mod types;

pub use money::{Money, MoneyOverflow, ParseMoneyError};
pub use types::{OrderId, ProductId, ReviewId, SessionId, ShopId, UserId};
