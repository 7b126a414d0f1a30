use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, ReviewId, ShopId, UserId};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::{
    Order, Product, Result, Review, Shop, StoreError,
    store::{Catalog, OrderStore, OrderTransaction, ReviewStore},
};

#[derive(Debug, Default)]
struct InMemoryState {
    shops: HashMap<ShopId, Shop>,
    products: HashMap<ProductId, Product>,
    orders: Vec<Order>,
    reviews: HashMap<ReviewId, Review>,
}

/// In-memory storefront store for tests and local runs.
///
/// A transaction holds the store's write lock until it is committed or
/// dropped, so transactions run one at a time.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all shops, products, orders and reviews.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.shops.clear();
        state.products.clear();
        state.orders.clear();
        state.reviews.clear();
    }
}

/// Transaction over an [`InMemoryStore`].
///
/// Stock changes and new orders are staged and applied on commit.
pub struct InMemoryTransaction {
    state: OwnedRwLockWriteGuard<InMemoryState>,
    staged_stock: HashMap<ProductId, u32>,
    staged_orders: Vec<Order>,
}

impl InMemoryTransaction {
    fn current_stock(&self, id: ProductId) -> Option<u32> {
        self.staged_stock
            .get(&id)
            .copied()
            .or_else(|| self.state.products.get(&id).map(|p| p.stock))
    }
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn lock_products(&mut self, _ids: &[ProductId]) -> Result<()> {
        // The whole store is already held exclusively.
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let stock = self.current_stock(id);
        Ok(self.state.products.get(&id).cloned().map(|mut product| {
            if let Some(stock) = stock {
                product.stock = stock;
            }
            product
        }))
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<u32> {
        let available = self
            .current_stock(id)
            .ok_or(StoreError::ProductNotFound(id))?;

        if available < quantity {
            return Err(StoreError::InsufficientStock {
                product_id: id,
                requested: quantity,
                available,
            });
        }

        let remaining = available - quantity;
        self.staged_stock.insert(id, remaining);
        Ok(remaining)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        self.staged_orders.push(order.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let Self {
            mut state,
            staged_stock,
            staged_orders,
        } = self;

        for (id, stock) in staged_stock {
            if let Some(product) = state.products.get_mut(&id) {
                product.stock = stock;
            }
        }
        state.orders.extend(staged_orders);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        tracing::debug!(
            staged_orders = self.staged_orders.len(),
            "discarding in-memory transaction"
        );
        Ok(())
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn insert_shop(&self, shop: Shop) -> Result<()> {
        self.state.write().await.shops.insert(shop.id, shop);
        Ok(())
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>> {
        Ok(self.state.read().await.shops.get(&id).cloned())
    }

    async fn shops_for_owner(&self, owner_id: UserId) -> Result<Vec<Shop>> {
        let state = self.state.read().await;
        let mut shops: Vec<_> = state
            .shops
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        shops.sort_by_key(|s| (s.created_at, s.id));
        Ok(shops)
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by_key(|p| (p.created_at, p.id));
        Ok(products)
    }

    async fn products_for_shop(&self, shop_id: ShopId) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.shop_id == Some(shop_id))
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.created_at, p.id));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        product.validate()?;

        let mut state = self.state.write().await;
        if let Some(shop_id) = product.shop_id
            && !state.shops.contains_key(&shop_id)
        {
            return Err(StoreError::ShopNotFound(shop_id));
        }
        state.products.insert(product.id, product);
        Ok(())
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Product> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;
        product.stock = product.stock.saturating_add(quantity);
        Ok(product.clone())
    }

    async fn remove_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.state.write().await.products.remove(&id).is_some())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let state = self.state.clone().write_owned().await;
        Ok(InMemoryTransaction {
            state,
            staged_stock: HashMap::new(),
            staged_orders: Vec::new(),
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        // Stable, so orders sharing a timestamp keep commit order.
        orders.sort_by_key(|o| Reverse(o.created_at));
        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.orders.len();
        state.orders.retain(|o| o.id != id);
        Ok(state.orders.len() != before)
    }

    async fn has_purchased(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .any(|o| o.items.iter().any(|i| i.product_id == product_id)))
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn find_review(&self, user_id: UserId, product_id: ProductId) -> Result<Option<Review>> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .cloned())
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.state.read().await.reviews.get(&id).cloned())
    }

    async fn save_review(&self, review: &Review) -> Result<()> {
        self.state
            .write()
            .await
            .reviews
            .insert(review.id, review.clone());
        Ok(())
    }

    async fn reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let state = self.state.read().await;
        let mut reviews: Vec<_> = state
            .reviews
            .values()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        Ok(self.state.write().await.reviews.remove(&id).is_some())
    }
}
