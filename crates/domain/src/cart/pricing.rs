use common::Money;
use serde::Serialize;
use store::{Catalog, Product};

use super::Cart;
use crate::DomainError;

/// A cart entry resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    /// `quantity * product.price` at the time of pricing.
    pub subtotal: Money,
}

/// A cart priced at current catalog prices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl PricedCart {
    /// Returns true if no entry resolved to a product.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Cart {
    /// Prices every entry at the catalog's current price, in cart order.
    ///
    /// Entries whose product has left the catalog are skipped. Fails with
    /// [`DomainError::AmountOverflow`] when a subtotal or the total is out of
    /// range.
    pub async fn snapshot_with_pricing<C>(&self, catalog: &C) -> Result<PricedCart, DomainError>
    where
        C: Catalog + ?Sized,
    {
        let mut priced = PricedCart::default();

        for entry in self.entries() {
            let Some(product) = catalog.get_product(entry.product_id).await? else {
                tracing::debug!(product_id = %entry.product_id, "skipping cart entry for missing product");
                continue;
            };

            let overflow = |_| DomainError::AmountOverflow(product.id);
            let subtotal = product.price.try_multiply(entry.quantity).map_err(overflow)?;
            priced.total = priced.total.try_add(subtotal).map_err(overflow)?;
            priced.lines.push(CartLine {
                product,
                quantity: entry.quantity,
                subtotal,
            });
        }

        Ok(priced)
    }
}
