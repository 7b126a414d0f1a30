//! Session-scoped shopping cart.

mod manager;
mod pricing;

pub use manager::CartManager;
pub use pricing::{CartLine, PricedCart};

use common::ProductId;
use serde::{Deserialize, Serialize};

/// Parses a raw quantity form value.
///
/// Missing or unparsable input counts as 1. The result still goes through
/// the clamping in [`Cart::add`].
pub fn parse_quantity(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(1)
}

/// One cart entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub product_id: ProductId,
    /// Always at least 1.
    pub quantity: u32,
}

/// Requested quantities per product, in the order products were first added.
///
/// Mutations set a modified flag so the session layer only writes carts
/// that actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
    #[serde(skip)]
    modified: bool,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of a product and returns the entry's new quantity.
    ///
    /// Non-positive quantities count as 1. Quantities for a product already
    /// in the cart are summed. Stock is not checked here.
    pub fn add(&mut self, product_id: ProductId, quantity: i64) -> u32 {
        let quantity = u32::try_from(quantity.max(1)).unwrap_or(u32::MAX);
        self.modified = true;

        match self.entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(entry) => {
                entry.quantity = entry.quantity.saturating_add(quantity);
                entry.quantity
            }
            None => {
                self.entries.push(CartEntry {
                    product_id,
                    quantity,
                });
                quantity
            }
        }
    }

    /// Removes a product's entry. Returns false (and leaves the cart
    /// unmodified) if the product was not in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.product_id != product_id);
        let removed = self.entries.len() != before;
        self.modified |= removed;
        removed
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.modified = true;
    }

    /// Returns the requested quantity for a product.
    pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.product_id == product_id)
            .map(|e| e.quantity)
    }

    /// Returns the entries in insertion order.
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    /// Returns the product IDs in the cart.
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.iter().map(|e| e.product_id).collect()
    }

    /// Returns the number of distinct products.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cart holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the cart changed since it was loaded or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Resets the modified flag after the cart has been persisted.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_creates_then_sums_entries() {
        let mut cart = Cart::new();
        let product = ProductId::new();

        assert_eq!(cart.add(product, 2), 2);
        assert_eq!(cart.add(product, 3), 5);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity(product), Some(5));
        assert!(cart.is_modified());
    }

    #[test]
    fn add_clamps_non_positive_quantities() {
        let mut cart = Cart::new();
        let a = ProductId::new();
        let b = ProductId::new();

        assert_eq!(cart.add(a, 0), 1);
        assert_eq!(cart.add(b, -7), 1);
        assert_eq!(cart.add(a, i64::MIN), 2);
    }

    #[test]
    fn add_saturates_at_u32_max() {
        let mut cart = Cart::new();
        let product = ProductId::new();

        assert_eq!(cart.add(product, i64::MAX), u32::MAX);
        assert_eq!(cart.add(product, 10), u32::MAX);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut cart = Cart::new();
        let ids: Vec<_> = (0..4).map(|_| ProductId::new()).collect();
        for id in &ids {
            cart.add(*id, 1);
        }
        cart.add(ids[0], 1);

        assert_eq!(cart.product_ids(), ids);
    }

    #[test]
    fn remove_missing_product_is_noop() {
        let mut cart = Cart::new();
        let product = ProductId::new();
        cart.add(product, 1);
        cart.mark_saved();

        assert!(!cart.remove(ProductId::new()));
        assert!(!cart.is_modified());

        assert!(cart.remove(product));
        assert!(cart.is_modified());
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_and_marks_modified() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(), 1);
        cart.mark_saved();

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.is_modified());
    }

    #[test]
    fn parse_quantity_falls_back_to_one() {
        assert_eq!(parse_quantity(Some("3")), 3);
        assert_eq!(parse_quantity(Some(" 4 ")), 4);
        assert_eq!(parse_quantity(Some("-2")), -2);
        assert_eq!(parse_quantity(Some("two")), 1);
        assert_eq!(parse_quantity(Some("")), 1);
        assert_eq!(parse_quantity(None), 1);
    }

    #[test]
    fn modified_flag_is_not_serialized() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(), 2);

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.entries(), cart.entries());
        assert!(!restored.is_modified());
    }
}
