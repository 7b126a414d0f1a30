//! Checkout processor turning a cart into a committed order.

use std::time::Instant;

use common::{OrderId, SessionId, UserId};
use domain::{Cart, CartManager, Customer, DomainError, PricedCart, SessionStore};
use store::{Catalog, Order, OrderItem, OrderStore, OrderTransaction, StoreError};

use crate::error::{CheckoutError, Result};
use crate::notifier::Notifier;

/// Converts carts into orders.
///
/// Stock checks, stock decrements and the order insert run in a single
/// store transaction: either the whole order commits or nothing from the
/// attempt persists. The invoice is sent after commit and its failure never
/// fails the checkout.
pub struct CheckoutProcessor<S, N>
where
    S: OrderStore + Catalog,
    N: Notifier,
{
    store: S,
    notifier: N,
}

impl<S, N> CheckoutProcessor<S, N>
where
    S: OrderStore + Catalog,
    N: Notifier,
{
    /// Creates a new checkout processor.
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for everything in the cart.
    ///
    /// On success the cart is cleared. On failure the cart is left as it
    /// was and no stock or order change persists.
    #[tracing::instrument(skip(self, customer, cart), fields(user_id = %customer.id, entries = cart.len()))]
    pub async fn checkout(&self, customer: &Customer, cart: &mut Cart) -> Result<Order> {
        metrics::counter!("checkout_attempts_total").increment(1);
        let start = Instant::now();

        let result = self.place_order(customer, cart).await;
        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());

        let order = match result {
            Ok(order) => order,
            Err(e) => {
                metrics::counter!("checkout_failed_total", "reason" => failure_reason(&e))
                    .increment(1);
                tracing::warn!(error = %e, "checkout failed");
                return Err(e);
            }
        };
        metrics::counter!("checkout_completed_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            total = %order.total_amount,
            items = order.items.len(),
            "order placed"
        );

        if let Err(e) = self.notifier.send_invoice(customer, &order).await {
            metrics::counter!("invoice_failures_total").increment(1);
            tracing::error!(order_id = %order.id, error = %e, "failed to send invoice");
        }

        cart.clear();
        Ok(order)
    }

    /// Checks out the cart stored for a session and writes the result back.
    pub async fn checkout_session<Ss, C>(
        &self,
        carts: &CartManager<Ss, C>,
        customer: &Customer,
        session: SessionId,
    ) -> Result<Order>
    where
        Ss: SessionStore,
        C: Catalog,
    {
        let mut cart = carts.load(session).await?;
        let order = self.checkout(customer, &mut cart).await?;
        carts.save(session, &mut cart).await?;
        Ok(order)
    }

    /// Prices the cart the way checkout would, without side effects.
    pub async fn preview(&self, cart: &Cart) -> Result<PricedCart> {
        cart.snapshot_with_pricing(&self.store)
            .await
            .map_err(|e| match e {
                DomainError::AmountOverflow(product_id) => {
                    CheckoutError::AmountOverflow { product_id }
                }
                other => other.into(),
            })
    }

    /// Loads an order.
    pub async fn order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Lists a user's orders, newest first.
    pub async fn orders_for(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    async fn place_order(&self, customer: &Customer, cart: &Cart) -> Result<Order> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut tx = self.store.begin().await?;
        let staged = stage_order(&mut tx, customer, cart).await;

        match staged {
            Ok(order) => {
                tx.commit().await?;
                Ok(order)
            }
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::error!(error = %rollback_error, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

/// Decrements stock and inserts the order inside an open transaction.
async fn stage_order<T: OrderTransaction>(
    tx: &mut T,
    customer: &Customer,
    cart: &Cart,
) -> Result<Order> {
    tx.lock_products(&cart.product_ids()).await?;

    let mut order = Order::new(customer.id);
    for entry in cart.entries() {
        let Some(product) = tx.get_product(entry.product_id).await? else {
            metrics::counter!("checkout_items_skipped_total").increment(1);
            tracing::warn!(product_id = %entry.product_id, "skipping cart entry for missing product");
            continue;
        };

        match tx.decrement_stock(product.id, entry.quantity).await {
            Ok(_) => {}
            Err(StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    product_name: product.name,
                    requested,
                    available,
                });
            }
            Err(e) => return Err(e.into()),
        }

        order
            .push_item(OrderItem::from_product(&product, entry.quantity))
            .map_err(|_| CheckoutError::AmountOverflow {
                product_id: product.id,
            })?;
    }

    if order.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    tx.insert_order(&order).await?;
    Ok(order)
}

fn failure_reason(error: &CheckoutError) -> &'static str {
    match error {
        CheckoutError::EmptyCart => "empty_cart",
        CheckoutError::InsufficientStock { .. } => "insufficient_stock",
        CheckoutError::AmountOverflow { .. } => "amount_overflow",
        CheckoutError::Store(_) => "store",
        CheckoutError::Domain(_) => "session",
    }
}

#[cfg(test)]
mod tests {
    use common::{Money, ProductId};
    use store::{InMemoryStore, Product};

    use super::*;
    use crate::notifier::InMemoryNotifier;

    fn customer() -> Customer {
        Customer::new(UserId::new(), "carol", "carol@example.com")
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let store = InMemoryStore::new();
        let processor = CheckoutProcessor::new(store.clone(), InMemoryNotifier::new());

        let result = processor.checkout(&customer(), &mut Cart::new()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn cart_of_only_missing_products_creates_nothing() {
        let store = InMemoryStore::new();
        let processor = CheckoutProcessor::new(store.clone(), InMemoryNotifier::new());
        let mut cart = Cart::new();
        cart.add(ProductId::new(), 1);

        let result = processor.checkout(&customer(), &mut cart).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn preview_has_no_side_effects() {
        let store = InMemoryStore::new();
        let product = Product::new("Widget", Money::from_cents(1000), 1);
        store.insert_product(product.clone()).await.unwrap();
        let processor = CheckoutProcessor::new(store.clone(), InMemoryNotifier::new());

        let mut cart = Cart::new();
        cart.add(product.id, 3);
        let priced = processor.preview(&cart).await.unwrap();

        assert_eq!(priced.total, Money::from_cents(3000));
        assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 1);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn preview_reports_out_of_range_total() {
        let store = InMemoryStore::new();
        let product = Product::new("Pricey", Money::from_cents(9_999_999_999), 1);
        store.insert_product(product.clone()).await.unwrap();
        let processor = CheckoutProcessor::new(store.clone(), InMemoryNotifier::new());

        let mut cart = Cart::new();
        cart.add(product.id, i64::from(u32::MAX));

        let result = processor.preview(&cart).await;
        assert!(matches!(
            result,
            Err(CheckoutError::AmountOverflow { product_id }) if product_id == product.id
        ));
    }

    #[test]
    fn failure_reasons_are_stable_labels() {
        assert_eq!(failure_reason(&CheckoutError::EmptyCart), "empty_cart");
        let e = CheckoutError::InsufficientStock {
            product_id: ProductId::new(),
            product_name: "Widget".to_string(),
            requested: 2,
            available: 1,
        };
        assert_eq!(failure_reason(&e), "insufficient_stock");
        let e = CheckoutError::AmountOverflow {
            product_id: ProductId::new(),
        };
        assert_eq!(failure_reason(&e), "amount_overflow");
    }
}
