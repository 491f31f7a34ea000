//! # Order Module
//!
//! Cart state owned by one session.
//!
//! - `OrderLine` is keyed by `VariantKey`; keys are unique within an order
//! - A line's quantity is always at least 1; a line that would drop to 0
//!   is removed, never kept at zero
//! - Lines keep insertion order, so a parsed submission is reflected in
//!   input line order
//! - Unmatched descriptions keep first-seen order without duplicates
//!
//! Mutation is crate-private; external callers go through `Reconciler`.

use crate::{Price, Product, ProductId, VariantKey};
use serde::{Deserialize, Serialize};

// =============================================================================
// ORDER LINE
// =============================================================================

/// One cart line: a product variant and how many of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub variant_key: VariantKey,
    pub product: Product,
    pub quantity: u32,
}

impl OrderLine {
    /// Unit price × quantity, saturating.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

// =============================================================================
// ORDER
// =============================================================================

/// Ordered cart lines plus the descriptions that found no product.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Order {
    lines: Vec<OrderLine>,
    unmatched: Vec<String>,
}

impl Order {
    /// Create an empty order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    #[must_use]
    pub fn unmatched(&self) -> &[String] {
        &self.unmatched
    }

    /// Look up a line by variant key.
    #[must_use]
    pub fn line(&self, key: &VariantKey) -> Option<&OrderLine> {
        self.lines.iter().find(|l| &l.variant_key == key)
    }

    /// True if any variant of the product is in the order.
    #[must_use]
    pub fn contains_product(&self, id: &ProductId) -> bool {
        self.lines.iter().any(|l| &l.product.id == id)
    }

    /// Product of the most recently introduced line.
    #[must_use]
    pub fn last_product(&self) -> Option<&Product> {
        self.lines.last().map(|l| &l.product)
    }

    /// No lines and no unmatched descriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.unmatched.is_empty()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of all line totals, saturating.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines
            .iter()
            .fold(Price::default(), |acc, l| acc.saturating_add(l.line_total()))
    }

    /// Structured view handed to the presentation layer.
    #[must_use]
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_lines: self
                .lines
                .iter()
                .map(|l| SnapshotLine {
                    product_id: l.product.id.clone(),
                    variant_key: l.variant_key.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            unmatched: self.unmatched.clone(),
        }
    }

    // =========================================================================
    // CRATE-PRIVATE MUTATION
    // =========================================================================

    /// Add `quantity` to the line for `key`, creating it if absent.
    pub(crate) fn add(&mut self, key: VariantKey, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.variant_key == key) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(OrderLine {
                variant_key: key,
                product: product.clone(),
                quantity,
            }),
        }
    }

    /// Increase an existing line by one. Returns false if the key is absent.
    pub(crate) fn increment(&mut self, key: &VariantKey) -> bool {
        match self.lines.iter_mut().find(|l| &l.variant_key == key) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrease a line by one, removing it instead of reaching zero.
    ///
    /// Returns false if the key is absent.
    pub(crate) fn decrement(&mut self, key: &VariantKey) -> bool {
        let Some(position) = self.lines.iter().position(|l| &l.variant_key == key) else {
            return false;
        };
        if self.lines[position].quantity > 1 {
            self.lines[position].quantity -= 1;
        } else {
            self.lines.remove(position);
        }
        true
    }

    pub(crate) fn push_unmatched(&mut self, description: &str) {
        if !self.unmatched.iter().any(|u| u == description) {
            self.unmatched.push(description.to_string());
        }
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
        self.unmatched.clear();
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// One line of an `OrderSnapshot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub variant_key: VariantKey,
    pub quantity: u32,
}

/// Structured result of a submission or cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_lines: Vec<SnapshotLine>,
    pub unmatched: Vec<String>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bread() -> Product {
        Product::new("p003", "Whole Wheat Bread", Price(399))
    }

    #[test]
    fn add_accumulates_on_same_key() {
        let mut order = Order::new();
        let key = VariantKey::new("p003");
        order.add(key.clone(), &bread(), 2);
        order.add(key.clone(), &bread(), 3);

        assert_eq!(order.line_count(), 1);
        assert_eq!(order.line(&key).map(|l| l.quantity), Some(5));
    }

    #[test]
    fn add_zero_is_ignored() {
        let mut order = Order::new();
        order.add(VariantKey::new("p003"), &bread(), 0);
        assert!(order.is_empty());
    }

    #[test]
    fn decrement_removes_at_one() {
        let mut order = Order::new();
        let key = VariantKey::new("p003");
        order.add(key.clone(), &bread(), 2);

        assert!(order.decrement(&key));
        assert_eq!(order.line(&key).map(|l| l.quantity), Some(1));
        assert!(order.decrement(&key));
        assert!(order.line(&key).is_none());
        assert!(!order.decrement(&key));
    }

    #[test]
    fn increment_absent_key_is_noop() {
        let mut order = Order::new();
        assert!(!order.increment(&VariantKey::new("nope")));
        assert!(order.is_empty());
    }

    #[test]
    fn unmatched_is_deduplicated_in_order() {
        let mut order = Order::new();
        order.push_unmatched("milk");
        order.push_unmatched("caviar");
        order.push_unmatched("milk");
        assert_eq!(order.unmatched(), ["milk".to_string(), "caviar".to_string()]);
    }

    #[test]
    fn totals_and_snapshot() {
        let mut order = Order::new();
        order.add(VariantKey::new("p003"), &bread(), 2);
        order.add(
            VariantKey::new("p001"),
            &Product::new("p001", "Organic Avocado", Price(199)),
            3,
        );

        assert_eq!(order.total(), Price(399 * 2 + 199 * 3));
        assert_eq!(order.item_count(), 5);
        assert_eq!(
            order.last_product().map(|p| p.id.as_str()),
            Some("p001")
        );

        let snapshot = order.snapshot();
        assert_eq!(snapshot.order_lines.len(), 2);
        assert_eq!(snapshot.order_lines[0].product_id.as_str(), "p003");
        assert_eq!(snapshot.order_lines[0].quantity, 2);
    }

    #[test]
    fn clear_empties_everything() {
        let mut order = Order::new();
        order.add(VariantKey::new("p003"), &bread(), 1);
        order.push_unmatched("milk");
        order.clear();
        assert!(order.is_empty());
    }
}
