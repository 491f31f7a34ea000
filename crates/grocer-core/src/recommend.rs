//! # Recommender
//!
//! Tag-overlap suggestions for the order and for single products.
//!
//! Suggestions are available products that share at least one tag with the
//! anchor product. They come back in catalog order and never include the
//! anchor itself or anything already in the order.

use crate::catalog::CatalogIndex;
use crate::normalize::fold;
use crate::order::Order;
use crate::{Product, ProductId};
use std::collections::BTreeSet;

/// Stateless recommendation rules over a catalog snapshot.
pub struct Recommender;

impl Recommender {
    /// Products related to the most recently added order line.
    ///
    /// An empty order yields no suggestions.
    #[must_use]
    pub fn for_order<'a>(
        index: &'a CatalogIndex,
        order: &Order,
        limit: usize,
    ) -> Vec<&'a Product> {
        let Some(anchor) = order.last_product() else {
            return Vec::new();
        };
        Self::related(index, anchor, limit, |p| order.contains_product(&p.id))
    }

    /// Products related to `product_id`. Unknown ids yield no suggestions.
    #[must_use]
    pub fn similar_to<'a>(
        index: &'a CatalogIndex,
        product_id: &ProductId,
        limit: usize,
    ) -> Vec<&'a Product> {
        match index.get(product_id) {
            Some(anchor) => Self::related(index, anchor, limit, |_| false),
            None => Vec::new(),
        }
    }

    fn related<'a>(
        index: &'a CatalogIndex,
        anchor: &Product,
        limit: usize,
        exclude: impl Fn(&Product) -> bool,
    ) -> Vec<&'a Product> {
        let anchor_tags: BTreeSet<String> = anchor.tags.iter().map(|t| fold(t)).collect();
        if anchor_tags.is_empty() || limit == 0 {
            return Vec::new();
        }

        index
            .products()
            .iter()
            .filter(|p| p.id != anchor.id && p.available && !exclude(*p))
            .filter(|p| p.tags.iter().any(|t| anchor_tags.contains(&fold(t))))
            .take(limit)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
