use common::{ProductId, SessionId};
use store::Catalog;

use super::{Cart, PricedCart};
use crate::error::DomainError;
use crate::session::SessionStore;

/// Cart operations bound to a session store and a catalog.
///
/// Each operation loads the session's cart, applies the change and writes
/// the cart back only if it was modified.
pub struct CartManager<S: SessionStore, C: Catalog> {
    sessions: S,
    catalog: C,
}

impl<S: SessionStore, C: Catalog> CartManager<S, C> {
    /// Creates a new cart manager.
    pub fn new(sessions: S, catalog: C) -> Self {
        Self { sessions, catalog }
    }

    /// Returns a reference to the catalog used for pricing.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Loads the cart of a session for use within one request.
    pub async fn load(&self, session: SessionId) -> Result<Cart, DomainError> {
        self.sessions.load_cart(session).await
    }

    /// Persists a request's cart if it was modified. Returns whether it wrote.
    pub async fn save(&self, session: SessionId, cart: &mut Cart) -> Result<bool, DomainError> {
        if !cart.is_modified() {
            return Ok(false);
        }
        self.sessions.save_cart(session, cart).await?;
        cart.mark_saved();
        Ok(true)
    }

    /// Adds a product to the session's cart.
    #[tracing::instrument(skip(self))]
    pub async fn add(
        &self,
        session: SessionId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, DomainError> {
        let mut cart = self.load(session).await?;
        let new_quantity = cart.add(product_id, quantity);
        self.save(session, &mut cart).await?;

        metrics::counter!("cart_mutations_total", "operation" => "add").increment(1);
        tracing::debug!(%product_id, new_quantity, "cart entry added");
        Ok(cart)
    }

    /// Removes a product from the session's cart. Missing products are a no-op.
    #[tracing::instrument(skip(self))]
    pub async fn remove(
        &self,
        session: SessionId,
        product_id: ProductId,
    ) -> Result<Cart, DomainError> {
        let mut cart = self.load(session).await?;
        if cart.remove(product_id) {
            self.save(session, &mut cart).await?;
            metrics::counter!("cart_mutations_total", "operation" => "remove").increment(1);
        }
        Ok(cart)
    }

    /// Empties the session's cart.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, session: SessionId) -> Result<(), DomainError> {
        let mut cart = self.load(session).await?;
        cart.clear();
        self.save(session, &mut cart).await?;
        metrics::counter!("cart_mutations_total", "operation" => "clear").increment(1);
        Ok(())
    }

    /// Prices the session's cart at current catalog prices.
    #[tracing::instrument(skip(self))]
    pub async fn snapshot_with_pricing(&self, session: SessionId) -> Result<PricedCart, DomainError> {
        let cart = self.load(session).await?;
        cart.snapshot_with_pricing(&self.catalog).await
    }
}
