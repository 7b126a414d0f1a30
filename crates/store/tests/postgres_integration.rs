//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use serial_test::serial;
use store::{
    Catalog, Money, Order, OrderItem, OrderStore, OrderTransaction, PostgresStore, Product,
    ProductId, Review, ReviewStore, Shop, ShopId, StoreError, UserId,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let pool = sqlx::PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(pool.clone())
                .run_migrations()
                .await
                .unwrap();
            pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products, reviews, shops")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed_product(store: &PostgresStore, price_cents: i64, stock: u32) -> Product {
    let product = Product::new("Widget", Money::from_cents(price_cents), stock)
        .with_description("A widget");
    store.insert_product(product.clone()).await.unwrap();
    product
}

#[tokio::test]
#[serial]
async fn product_roundtrip_and_restock() {
    let store = get_test_store().await;
    let product = seed_product(&store, 1000, 5).await;

    let loaded = store.get_product(product.id).await.unwrap().unwrap();
    assert_eq!(loaded.name, "Widget");
    assert_eq!(loaded.description, "A widget");
    assert_eq!(loaded.price, Money::from_cents(1000));
    assert_eq!(loaded.stock, 5);

    let restocked = store.restock(product.id, 3).await.unwrap();
    assert_eq!(restocked.stock, 8);

    assert!(store.remove_product(product.id).await.unwrap());
    assert!(store.get_product(product.id).await.unwrap().is_none());
    assert!(matches!(
        store.restock(product.id, 1).await,
        Err(StoreError::ProductNotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn insert_product_rejects_negative_price_and_unknown_shop() {
    let store = get_test_store().await;

    let negative = Product::new("Refund", Money::from_cents(-500), 2);
    assert!(matches!(
        store.insert_product(negative.clone()).await,
        Err(StoreError::InvalidProduct(_))
    ));
    assert!(store.get_product(negative.id).await.unwrap().is_none());

    let orphan = Product::new("Widget", Money::from_cents(500), 2).in_shop(ShopId::new());
    assert!(matches!(
        store.insert_product(orphan).await,
        Err(StoreError::ShopNotFound(_))
    ));
    assert!(store.list_products().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn shops_own_products_and_list_oldest_first() {
    let store = get_test_store().await;
    let vendor = UserId::new();

    let mut first_shop = Shop::new("First", vendor);
    first_shop.created_at -= chrono::Duration::seconds(5);
    let second_shop = Shop::new("Second", vendor);
    store.insert_shop(second_shop.clone()).await.unwrap();
    store.insert_shop(first_shop.clone()).await.unwrap();

    let mut older = Product::new("Older", Money::from_cents(100), 1).in_shop(first_shop.id);
    older.created_at -= chrono::Duration::seconds(10);
    let newer = Product::new("Newer", Money::from_cents(200), 1).in_shop(first_shop.id);
    let other = Product::new("Other", Money::from_cents(300), 1).in_shop(second_shop.id);
    for product in [&newer, &other, &older] {
        store.insert_product(product.clone()).await.unwrap();
    }
    let loose = seed_product(&store, 400, 1).await;

    let owned = store.shops_for_owner(vendor).await.unwrap();
    assert_eq!(
        owned.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![first_shop.id, second_shop.id]
    );
    assert_eq!(store.get_shop(second_shop.id).await.unwrap().unwrap().name, "Second");
    assert!(store.shops_for_owner(UserId::new()).await.unwrap().is_empty());

    let in_first = store.products_for_shop(first_shop.id).await.unwrap();
    assert_eq!(
        in_first.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![older.id, newer.id]
    );
    assert!(in_first.iter().all(|p| p.shop_id == Some(first_shop.id)));

    let all = store.list_products().await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].id, older.id);
    let unowned = all.iter().find(|p| p.id == loose.id).unwrap();
    assert_eq!(unowned.shop_id, None);
}

#[tokio::test]
#[serial]
async fn committed_transaction_persists_order_and_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, 1000, 5).await;
    let user_id = UserId::new();

    let mut order = Order::new(user_id);
    order.push_item(OrderItem::from_product(&product, 2)).unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.lock_products(&[product.id]).await.unwrap();
    assert_eq!(tx.decrement_stock(product.id, 2).await.unwrap(), 3);
    tx.insert_order(&order).await.unwrap();
    tx.commit().await.unwrap();

    let stored = store.get_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.items, order.items);
    assert_eq!(stored.total_amount, Money::from_cents(2000));
    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 3);

    assert!(store.has_purchased(user_id, product.id).await.unwrap());
    assert_eq!(store.orders_for_user(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn rolled_back_transaction_leaves_no_trace() {
    let store = get_test_store().await;
    let product = seed_product(&store, 1000, 5).await;

    let mut order = Order::new(UserId::new());
    order.push_item(OrderItem::from_product(&product, 5)).unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.decrement_stock(product.id, 5).await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.rollback().await.unwrap();

    assert!(store.get_order(order.id).await.unwrap().is_none());
    assert_eq!(store.get_product(product.id).await.unwrap().unwrap().stock, 5);
}

#[tokio::test]
#[serial]
async fn conditional_decrement_reports_available_stock() {
    let store = get_test_store().await;
    let product = seed_product(&store, 1000, 1).await;

    let mut tx = store.begin().await.unwrap();
    let err = tx.decrement_stock(product.id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::InsufficientStock {
            requested: 2,
            available: 1,
            ..
        }
    ));

    let err = tx.decrement_stock(ProductId::new(), 1).await.unwrap_err();
    assert!(matches!(err, StoreError::ProductNotFound(_)));
}

#[tokio::test]
#[serial]
async fn delete_order_cascades_to_items() {
    let store = get_test_store().await;
    let product = seed_product(&store, 500, 5).await;
    let user_id = UserId::new();

    let mut order = Order::new(user_id);
    order.push_item(OrderItem::from_product(&product, 1)).unwrap();

    let mut tx = store.begin().await.unwrap();
    tx.insert_order(&order).await.unwrap();
    tx.commit().await.unwrap();

    assert!(store.delete_order(order.id).await.unwrap());
    assert!(!store.delete_order(order.id).await.unwrap());
    assert!(!store.has_purchased(user_id, product.id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn review_upsert_and_listing() {
    let store = get_test_store().await;
    let product = seed_product(&store, 500, 5).await;
    let user_id = UserId::new();

    let mut review = Review::new(product.id, user_id, 3, "fine");
    store.save_review(&review).await.unwrap();

    review.rating = 5;
    review.comment = "great after all".to_string();
    review.is_verified = true;
    store.save_review(&review).await.unwrap();

    let found = store.find_review(user_id, product.id).await.unwrap().unwrap();
    assert_eq!(found.rating, 5);
    assert_eq!(found.comment, "great after all");
    assert!(found.is_verified);

    assert_eq!(store.reviews_for_product(product.id).await.unwrap().len(), 1);
    assert!(store.delete_review(review.id).await.unwrap());
    assert!(store.get_review(review.id).await.unwrap().is_none());
}
