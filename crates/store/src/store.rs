use async_trait::async_trait;
use common::{OrderId, ProductId, ReviewId, ShopId, UserId};

use crate::{Order, Product, Result, Review, Shop};

/// Shops, product lookup, browsing and seeding.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Adds a shop, replacing any shop with the same ID.
    async fn insert_shop(&self, shop: Shop) -> Result<()>;

    /// Looks up a shop by ID.
    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>>;

    /// Lists the shops a vendor owns, oldest first.
    async fn shops_for_owner(&self, owner_id: UserId) -> Result<Vec<Shop>>;

    /// Lists every product in the catalog, oldest first.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Lists the products of one shop, oldest first.
    async fn products_for_shop(&self, shop_id: ShopId) -> Result<Vec<Product>>;

    /// Looks up a product by ID.
    ///
    /// Returns None if the product is not (or no longer) in the catalog.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Adds a product to the catalog, replacing any product with the same ID.
    ///
    /// Fails with `StoreError::InvalidProduct` if the price is negative or
    /// the name is blank, and with `StoreError::ShopNotFound` if the product
    /// names a shop that does not exist.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Adds stock to an existing product and returns the updated product.
    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Product>;

    /// Removes a product from the catalog.
    ///
    /// Returns false if the product did not exist. Historical order lines
    /// keep their copied name and price.
    async fn remove_product(&self, id: ProductId) -> Result<bool>;
}

/// A unit of work against the order store.
///
/// Changes made through a transaction become visible only after
/// [`commit`](OrderTransaction::commit). Dropping a transaction without
/// committing discards every change made through it.
#[async_trait]
pub trait OrderTransaction: Send {
    /// Locks the given products for the rest of the transaction.
    ///
    /// Implementations acquire the locks in ascending ID order so that
    /// concurrent transactions over overlapping products cannot deadlock.
    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<()>;

    /// Looks up a product as seen by this transaction.
    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Decrements stock if at least `quantity` units are available.
    ///
    /// Fails with `StoreError::InsufficientStock` and leaves stock untouched
    /// otherwise. Returns the remaining stock.
    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<u32>;

    /// Persists an order together with its lines.
    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    /// Makes every change of this transaction durable.
    async fn commit(self) -> Result<()>;

    /// Discards every change of this transaction.
    async fn rollback(self) -> Result<()>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// The transaction type handed out by [`begin`](OrderStore::begin).
    type Transaction: OrderTransaction;

    /// Opens a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Loads an order with its lines.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Deletes an order and its lines. Stock is not restored.
    ///
    /// Returns false if the order did not exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;

    /// Returns true if the user has at least one order line for the product.
    async fn has_purchased(&self, user_id: UserId, product_id: ProductId) -> Result<bool>;
}

/// Review persistence.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Finds the review a user wrote for a product, if any.
    async fn find_review(&self, user_id: UserId, product_id: ProductId) -> Result<Option<Review>>;

    /// Loads a review by ID.
    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>>;

    /// Inserts a review or replaces the one with the same ID.
    async fn save_review(&self, review: &Review) -> Result<()>;

    /// Lists reviews for a product, newest first.
    async fn reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>>;

    /// Deletes a review. Returns false if it did not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<bool>;
}
