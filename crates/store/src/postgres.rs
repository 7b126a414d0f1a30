use std::collections::HashMap;

use async_trait::async_trait;
use common::{Money, OrderId, ProductId, ReviewId, ShopId, UserId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Order, OrderItem, Product, Result, Review, Shop, StoreError,
    store::{Catalog, OrderStore, OrderTransaction, ReviewStore},
};

const SHOP_COLUMNS: &str = "id, name, owner_id, created_at";
const PRODUCT_COLUMNS: &str = "id, shop_id, name, description, price_cents, stock, created_at";
const ORDER_COLUMNS: &str = "id, user_id, created_at, total_amount_cents";
const ORDER_ITEM_COLUMNS: &str = "order_id, product_id, product_name, quantity, price_cents";
const REVIEW_COLUMNS: &str = "id, product_id, user_id, rating, comment, is_verified, created_at";

/// PostgreSQL-backed storefront store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn attach_items(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY order_id, position"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let order_id: Uuid = row.try_get("order_id")?;
            items.entry(order_id).or_default().push(row_to_item(&row)?);
        }

        for order in &mut orders {
            order.items = items.remove(&order.id.as_uuid()).unwrap_or_default();
        }
        Ok(orders)
    }
}

/// Transaction over a [`PostgresStore`].
///
/// Dropping it without committing rolls the database transaction back.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

fn to_u32(value: i64, column: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidRow(format!("{column} out of range: {value}")))
}

fn row_to_shop(row: &PgRow) -> Result<Shop> {
    Ok(Shop {
        id: ShopId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        shop_id: row
            .try_get::<Option<Uuid>, _>("shop_id")?
            .map(ShopId::from_uuid),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock: to_u32(row.try_get("stock")?, "stock")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_order(row: &PgRow) -> Result<Order> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        created_at: row.try_get("created_at")?,
        total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
        items: Vec::new(),
    })
}

fn row_to_item(row: &PgRow) -> Result<OrderItem> {
    Ok(OrderItem {
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: to_u32(row.try_get("quantity")?, "quantity")?,
        price: Money::from_cents(row.try_get("price_cents")?),
    })
}

fn row_to_review(row: &PgRow) -> Result<Review> {
    let rating: i16 = row.try_get("rating")?;
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        rating: u8::try_from(rating)
            .map_err(|_| StoreError::InvalidRow(format!("rating out of range: {rating}")))?,
        comment: row.try_get("comment")?,
        is_verified: row.try_get("is_verified")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl OrderTransaction for PostgresTransaction {
    async fn lock_products(&mut self, ids: &[ProductId]) -> Result<()> {
        let mut ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        ids.sort_unstable();
        ids.dedup();

        // Rows are locked in the order the sort produces them.
        sqlx::query("SELECT id FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(&ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn decrement_stock(&mut self, id: ProductId, quantity: u32) -> Result<u32> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = NOW()
            WHERE id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(remaining) = remaining {
            return to_u32(remaining, "stock");
        }

        let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        match available {
            Some(available) => Err(StoreError::InsufficientStock {
                product_id: id,
                requested: quantity,
                available: to_u32(available, "stock")?,
            }),
            None => Err(StoreError::ProductNotFound(id)),
        }
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, created_at, total_amount_cents)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.created_at)
        .bind(order.total_amount.cents())
        .execute(&mut *self.tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::InvalidRow(format!("too many order lines: {position}")))?;

            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, product_name, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(i64::from(item.quantity))
            .bind(item.price.cents())
            .execute(&mut *self.tx)
            .await?;
        }

        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for PostgresStore {
    async fn insert_shop(&self, shop: Shop) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO shops (id, name, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(shop.id.as_uuid())
        .bind(&shop.name)
        .bind(shop.owner_id.as_uuid())
        .bind(shop.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_shop(&self, id: ShopId) -> Result<Option<Shop>> {
        let row = sqlx::query(&format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_shop).transpose()
    }

    async fn shops_for_owner(&self, owner_id: UserId) -> Result<Vec<Shop>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHOP_COLUMNS} FROM shops WHERE owner_id = $1 ORDER BY created_at, id"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_shop).collect()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn products_for_shop(&self, shop_id: ShopId) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE shop_id = $1 ORDER BY created_at, id"
        ))
        .bind(shop_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        product.validate()?;

        if let Some(shop_id) = product.shop_id {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shops WHERE id = $1)")
                    .bind(shop_id.as_uuid())
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(StoreError::ShopNotFound(shop_id));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, shop_id, name, description, price_cents, stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                shop_id = EXCLUDED.shop_id,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price_cents = EXCLUDED.price_cents,
                stock = EXCLUDED.stock,
                updated_at = NOW()
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.shop_id.map(|id| id.as_uuid()))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(i64::from(product.stock))
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> Result<Product> {
        let row = sqlx::query(&format!(
            "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(&row),
            None => Err(StoreError::ProductNotFound(id)),
        }
    }

    async fn remove_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let tx = self.pool.begin().await?;
        Ok(PostgresTransaction { tx })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = row_to_order(&row)?;
        Ok(self.attach_items(vec![order]).await?.pop())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let orders = rows.iter().map(row_to_order).collect::<Result<Vec<_>>>()?;
        self.attach_items(orders).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_purchased(&self, user_id: UserId, product_id: ProductId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM order_items i
                JOIN orders o ON o.id = i.order_id
                WHERE o.user_id = $1 AND i.product_id = $2
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    async fn find_review(&self, user_id: UserId, product_id: ProductId) -> Result<Option<Review>> {
        let row = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND product_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_review).transpose()
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>> {
        let row = sqlx::query(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_review).transpose()
    }

    async fn save_review(&self, review: &Review) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, product_id, user_id, rating, comment, is_verified, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                rating = EXCLUDED.rating,
                comment = EXCLUDED.comment,
                is_verified = EXCLUDED.is_verified
            "#,
        )
        .bind(review.id.as_uuid())
        .bind(review.product_id.as_uuid())
        .bind(review.user_id.as_uuid())
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.is_verified)
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reviews_for_product(&self, product_id: ProductId) -> Result<Vec<Review>> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE product_id = $1 ORDER BY created_at DESC"
        ))
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_review).collect()
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
