//! Persisted storefront entities.

use chrono::{DateTime, Utc};
use common::{Money, MoneyOverflow, OrderId, ProductId, ReviewId, ShopId, UserId};
use serde::{Deserialize, Serialize};

use crate::{Result, StoreError};

/// A vendor's shop. Products listed by a vendor belong to one of their shops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: ShopId,
    pub name: String,
    /// The vendor running the shop.
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Shop {
    /// Creates a new shop with a fresh ID.
    pub fn new(name: impl Into<String>, owner_id: UserId) -> Self {
        Self {
            id: ShopId::new(),
            name: name.into(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Owning shop. Products seeded outside any shop have none.
    pub shop_id: Option<ShopId>,
    pub name: String,
    pub description: String,
    /// Current unit price.
    pub price: Money,
    /// Units available for sale.
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product with a fresh ID.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: ProductId::new(),
            shop_id: None,
            name: name.into(),
            description: String::new(),
            price,
            stock,
            created_at: Utc::now(),
        }
    }

    /// Sets the product description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Lists the product in a shop.
    pub fn in_shop(mut self, shop_id: ShopId) -> Self {
        self.shop_id = Some(shop_id);
        self
    }

    /// Checks the invariants every catalog backend enforces before storing.
    pub fn validate(&self) -> Result<()> {
        if self.price.is_negative() {
            return Err(StoreError::InvalidProduct(format!(
                "price of {} must not be negative: {}",
                self.id, self.price
            )));
        }
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidProduct(format!(
                "name of {} must not be empty",
                self.id
            )));
        }
        Ok(())
    }
}

/// A line of an order.
///
/// Name and price are copied from the product at purchase time so later
/// catalog changes never alter historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at purchase time.
    pub price: Money,
}

impl OrderItem {
    /// Creates an order line from the product's current name and price.
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
            price: product.price,
        }
    }

    /// Returns `quantity * price`, saturating at the representable range.
    pub fn subtotal(&self) -> Money {
        self.price.multiply(self.quantity)
    }

    /// Returns `quantity * price`, failing if it is out of range.
    pub fn try_subtotal(&self) -> std::result::Result<Money, MoneyOverflow> {
        self.price.try_multiply(self.quantity)
    }
}

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a provisional order with no items and a zero total.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            created_at: Utc::now(),
            total_amount: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Appends a line and adds its subtotal to the running total.
    ///
    /// Leaves the order unchanged if the subtotal or the new total would be
    /// out of range.
    pub fn push_item(&mut self, item: OrderItem) -> std::result::Result<(), MoneyOverflow> {
        self.total_amount = self.total_amount.try_add(item.try_subtotal()?)?;
        self.items.push(item);
        Ok(())
    }

    /// Recomputes the total from the order lines.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderItem::subtotal).sum()
    }

    /// Returns true if the order has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A buyer's review of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    /// Rating between 1 and 5.
    pub rating: u8,
    pub comment: String,
    /// Set when the author has bought the product.
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Creates an unverified review with a fresh ID.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: ReviewId::new(),
            product_id,
            user_id,
            rating,
            comment: comment.into(),
            is_verified: false,
            created_at: Utc::now(),
        }
    }
}
