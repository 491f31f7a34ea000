//! # Cart Reconciler
//!
//! Merges matcher output into order state under variant-key identity.
//!
//! Two modes:
//! - `Replace`: a full free-text submission. The new order is rebuilt from
//!   scratch; repeated variant keys within the results accumulate into one
//!   line, and the unmatched set is replaced.
//! - `Merge`: incremental catalog browsing. Matched results are added onto
//!   the existing lines; the unmatched set is left alone.
//!
//! Increment, decrement and clear are merge-mode operations. Touching a key
//! that is not in the order is a no-op, never an error.

use crate::matcher::MatchResult;
use crate::order::Order;
use crate::{Product, VariantKey};
use serde::{Deserialize, Serialize};

/// How results are folded into an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    Replace,
    Merge,
}

/// The Reconciler owns every order mutation rule.
pub struct Reconciler;

impl Reconciler {
    /// Produce the order that results from applying `results` to `current`.
    ///
    /// `Replace` ignores `current` entirely, so calling it twice with the
    /// same results yields the same order.
    #[must_use]
    pub fn reconcile(current: &Order, results: &[MatchResult], mode: ReconcileMode) -> Order {
        let mut next = match mode {
            ReconcileMode::Replace => Order::new(),
            ReconcileMode::Merge => current.clone(),
        };
        Self::apply(&mut next, results, mode);
        next
    }

    /// In-place form of `reconcile`.
    pub fn apply(order: &mut Order, results: &[MatchResult], mode: ReconcileMode) {
        if mode == ReconcileMode::Replace {
            order.clear();
        }

        for result in results {
            match result {
                MatchResult::Matched {
                    product,
                    quantity,
                    variant_key,
                    ..
                } => order.add(variant_key.clone(), product, *quantity),
                MatchResult::Unmatched { raw_description } => {
                    if mode == ReconcileMode::Replace {
                        order.push_unmatched(raw_description);
                    }
                }
            }
        }

        tracing::debug!(
            ?mode,
            results = results.len(),
            lines = order.line_count(),
            unmatched = order.unmatched().len(),
            "Order reconciled"
        );
    }

    /// Add one unit of a product variant, creating the line at quantity 1.
    ///
    /// Returns the variant key the unit landed on.
    pub fn add_one(order: &mut Order, product: &Product, hint: Option<&str>) -> VariantKey {
        let key = VariantKey::for_product(product, hint);
        order.add(key.clone(), product, 1);
        key
    }

    /// Increase an existing line by one. Returns false if the key is absent.
    pub fn increment_one(order: &mut Order, key: &VariantKey) -> bool {
        order.increment(key)
    }

    /// Decrease a line by one, removing it when it would reach zero.
    ///
    /// Returns false if the key is absent.
    pub fn decrement_one(order: &mut Order, key: &VariantKey) -> bool {
        order.decrement(key)
    }

    /// Drop every line and every unmatched description.
    pub fn clear(order: &mut Order) {
        order.clear();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Price;
    use crate::matcher::MatchTier;

    fn avocado() -> Product {
        Product::new("p001", "Organic Avocado", Price(199))
    }

    fn rice() -> Product {
        Product::new("p010", "Basmati Rice", Price(899)).with_pack_size("1 kg")
    }

    #[test]
    fn replace_sums_duplicate_keys() {
        let results = vec![
            MatchResult::matched(avocado(), 2, None, MatchTier::Contains),
            MatchResult::unmatched("milk"),
            MatchResult::matched(avocado(), 3, None, MatchTier::Exact),
        ];

        let order = Reconciler::reconcile(&Order::new(), &results, ReconcileMode::Replace);
        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].quantity, 5);
        assert_eq!(order.unmatched(), ["milk".to_string()]);
    }

    #[test]
    fn replace_discards_prior_state() {
        let mut current = Order::new();
        Reconciler::add_one(&mut current, &rice(), None);
        current.push_unmatched("caviar");

        let results = vec![MatchResult::matched(avocado(), 1, None, MatchTier::Exact)];
        let order = Reconciler::reconcile(&current, &results, ReconcileMode::Replace);

        assert_eq!(order.line_count(), 1);
        assert_eq!(order.lines()[0].product.id.as_str(), "p001");
        assert!(order.unmatched().is_empty());
    }

    #[test]
    fn replace_is_idempotent() {
        let results = vec![
            MatchResult::matched(avocado(), 2, None, MatchTier::Contains),
            MatchResult::unmatched("milk"),
        ];
        let once = Reconciler::reconcile(&Order::new(), &results, ReconcileMode::Replace);
        let twice = Reconciler::reconcile(&once, &results, ReconcileMode::Replace);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_keeps_unmatched_and_accumulates() {
        let mut current = Order::new();
        current.push_unmatched("caviar");
        Reconciler::add_one(&mut current, &avocado(), None);

        let results = vec![
            MatchResult::matched(avocado(), 1, None, MatchTier::Exact),
            MatchResult::unmatched("milk"),
        ];
        let order = Reconciler::reconcile(&current, &results, ReconcileMode::Merge);

        assert_eq!(order.lines()[0].quantity, 2);
        assert_eq!(order.unmatched(), ["caviar".to_string()]);
    }

    #[test]
    fn different_pack_sizes_are_distinct_lines() {
        let mut order = Order::new();
        let small = Reconciler::add_one(&mut order, &rice(), Some("500g"));
        let large = Reconciler::add_one(&mut order, &rice(), Some("1kg"));

        assert_ne!(small, large);
        assert_eq!(order.line_count(), 2);
        assert!(order.lines().iter().all(|l| l.quantity == 1));
    }

    #[test]
    fn default_pack_size_is_used_without_hint() {
        let mut order = Order::new();
        let key = Reconciler::add_one(&mut order, &rice(), None);
        assert_eq!(key.as_str(), "p010::1kg");
    }

    #[test]
    fn add_then_decrement_empties_order() {
        let mut order = Order::new();
        let key = Reconciler::add_one(&mut order, &avocado(), None);
        assert!(Reconciler::decrement_one(&mut order, &key));
        assert_eq!(order.line_count(), 0);
    }

    #[test]
    fn decrement_absent_key_is_noop() {
        let mut order = Order::new();
        Reconciler::add_one(&mut order, &avocado(), None);
        let before = order.clone();

        assert!(!Reconciler::decrement_one(&mut order, &VariantKey::new("ghost")));
        assert_eq!(order, before);
    }

    #[test]
    fn increment_then_clear() {
        let mut order = Order::new();
        let key = Reconciler::add_one(&mut order, &avocado(), None);
        assert!(Reconciler::increment_one(&mut order, &key));
        assert_eq!(order.line(&key).map(|l| l.quantity), Some(2));

        Reconciler::clear(&mut order);
        assert!(order.is_empty());
    }
}
