//! Session storage for carts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::SessionId;
use tokio::sync::RwLock;

use crate::cart::Cart;
use crate::error::DomainError;

/// Trait for the session backend that keeps carts between requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the cart of a session. Unknown sessions get an empty cart.
    async fn load_cart(&self, session: SessionId) -> Result<Cart, DomainError>;

    /// Stores the cart of a session, replacing any previous one.
    async fn save_cart(&self, session: SessionId, cart: &Cart) -> Result<(), DomainError>;

    /// Drops the cart of a session, e.g. when the session expires.
    async fn remove_cart(&self, session: SessionId) -> Result<(), DomainError>;
}

/// In-memory session store.
///
/// Carts are kept as serialized JSON, the way a cookie or cache backed
/// session would hold them.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    carts: Arc<RwLock<HashMap<SessionId, String>>>,
}

impl InMemorySessionStore {
    /// Creates a new in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of sessions holding a cart.
    pub async fn session_count(&self) -> usize {
        self.carts.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_cart(&self, session: SessionId) -> Result<Cart, DomainError> {
        match self.carts.read().await.get(&session) {
            Some(payload) => Ok(serde_json::from_str(payload)?),
            None => Ok(Cart::new()),
        }
    }

    async fn save_cart(&self, session: SessionId, cart: &Cart) -> Result<(), DomainError> {
        let payload = serde_json::to_string(cart)?;
        self.carts.write().await.insert(session, payload);
        Ok(())
    }

    async fn remove_cart(&self, session: SessionId) -> Result<(), DomainError> {
        self.carts.write().await.remove(&session);
        Ok(())
    }
}
