//! # Matcher
//!
//! Resolves requested items against a `CatalogIndex` with tiered strategies.
//!
//! Tiers are tried in order and the first one with a candidate wins:
//! 1. Exact name (case-insensitive)
//! 2. Bidirectional substring containment, also on the singular form
//! 3. Word overlap between description and name tokens
//! 4. A product tag occurring in the description
//!
//! Within a tier the first candidate in catalog order is taken. There is no
//! scoring beyond the tier number, and the tier never affects merging.

use crate::catalog::CatalogIndex;
use crate::normalize::{fold, has_alphanumeric, singular_phrase};
use crate::parser::RequestedItem;
use crate::{Product, VariantKey};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// =============================================================================
// MATCH TIER
// =============================================================================

/// Confidence tier of a match. Lower rank means higher confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Contains,
    WordOverlap,
    Tag,
}

impl MatchTier {
    /// All tiers in evaluation order.
    pub const ALL: [Self; 4] = [Self::Exact, Self::Contains, Self::WordOverlap, Self::Tag];

    /// Numeric tier, 1 = highest confidence.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Exact => 1,
            Self::Contains => 2,
            Self::WordOverlap => 3,
            Self::Tag => 4,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contains => "contains",
            Self::WordOverlap => "word-overlap",
            Self::Tag => "tag",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} ({})", self.rank(), self.name())
    }
}

// =============================================================================
// MATCH RESULT
// =============================================================================

/// Outcome of resolving one requested item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        product: Product,
        quantity: u32,
        variant_key: VariantKey,
        tier: MatchTier,
    },
    Unmatched {
        raw_description: String,
    },
}

impl MatchResult {
    /// Build a `Matched` result, deriving the variant key from the hint.
    #[must_use]
    pub fn matched(product: Product, quantity: u32, hint: Option<&str>, tier: MatchTier) -> Self {
        let variant_key = VariantKey::for_product(&product, hint);
        Self::Matched {
            product,
            quantity,
            variant_key,
            tier,
        }
    }

    #[must_use]
    pub fn unmatched(raw_description: impl Into<String>) -> Self {
        Self::Unmatched {
            raw_description: raw_description.into(),
        }
    }

    #[must_use]
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    #[must_use]
    pub fn tier(&self) -> Option<MatchTier> {
        match self {
            Self::Matched { tier, .. } => Some(*tier),
            Self::Unmatched { .. } => None,
        }
    }

    #[must_use]
    pub fn variant_key(&self) -> Option<&VariantKey> {
        match self {
            Self::Matched { variant_key, .. } => Some(variant_key),
            Self::Unmatched { .. } => None,
        }
    }
}

// =============================================================================
// MATCHER
// =============================================================================

/// Tuning knobs for a matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Let out-of-stock products be matched.
    #[serde(default)]
    pub include_unavailable: bool,
}

/// Tiered matcher bound to one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    index: &'a CatalogIndex,
    options: MatchOptions,
}

impl<'a> Matcher<'a> {
    /// Create a matcher with default options.
    #[must_use]
    pub fn new(index: &'a CatalogIndex) -> Self {
        Self::with_options(index, MatchOptions::default())
    }

    #[must_use]
    pub fn with_options(index: &'a CatalogIndex, options: MatchOptions) -> Self {
        Self { index, options }
    }

    /// Resolve a sequence of requested items, preserving their order.
    pub fn match_items<I>(&self, items: I) -> Vec<MatchResult>
    where
        I: IntoIterator,
        I::Item: Borrow<RequestedItem>,
    {
        items
            .into_iter()
            .map(|item| self.match_item(item.borrow()))
            .collect()
    }

    /// Resolve a single requested item.
    #[must_use]
    pub fn match_item(&self, item: &RequestedItem) -> MatchResult {
        match self.resolve(&item.description) {
            Some((product, tier)) => {
                tracing::debug!(
                    description = %item.description,
                    product_id = %product.id,
                    tier = tier.rank(),
                    "Matched requested item"
                );
                MatchResult::matched(
                    product.clone(),
                    item.quantity,
                    item.variant_hint.as_deref(),
                    tier,
                )
            }
            None => {
                tracing::debug!(description = %item.description, "No catalog match");
                MatchResult::unmatched(item.raw.clone())
            }
        }
    }

    /// Best product and tier for a description, if any tier succeeds.
    #[must_use]
    pub fn resolve(&self, description: &str) -> Option<(&'a Product, MatchTier)> {
        let folded = fold(description);
        if !has_alphanumeric(&folded) {
            return None;
        }

        MatchTier::ALL
            .into_iter()
            .find_map(|tier| self.first_in_tier(tier, &folded).map(|p| (p, tier)))
    }

    fn first_in_tier(&self, tier: MatchTier, folded: &str) -> Option<&'a Product> {
        let candidates = match tier {
            MatchTier::Exact => self.index.lookup_exact_all(folded),
            MatchTier::Contains => {
                let singular = singular_phrase(folded);
                self.index.lookup_contains_any(&[folded, singular.as_str()])
            }
            MatchTier::WordOverlap => self.index.lookup_word_overlap(folded),
            MatchTier::Tag => self.index.lookup_tag_within(folded),
        };

        candidates
            .into_iter()
            .find(|p| p.available || self.options.include_unavailable)
    }
}

/// Resolve `items` against `index` with default options.
pub fn match_items<I>(items: I, index: &CatalogIndex) -> Vec<MatchResult>
where
    I: IntoIterator,
    I::Item: Borrow<RequestedItem>,
{
    Matcher::new(index).match_items(items)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::Price;
    use crate::parser::LineParser;

    fn catalog() -> CatalogIndex {
        CatalogIndex::build(vec![
            Product::new("p001", "Organic Avocado", Price(199)).with_tags(["organic", "fruit"]),
            Product::new("p002", "Almond Milk", Price(349)).with_tags(["vegan", "milk"]),
            Product::new("p003", "Whole Wheat Bread", Price(399)),
            Product::new("p004", "Free-Range Eggs", Price(499)).with_tags(["protein"]),
            Product::new("p005", "Saffron", Price(1299))
                .with_tags(["spice"])
                .with_availability(false),
        ])
    }

    fn resolve_one(index: &CatalogIndex, line: &str) -> MatchResult {
        let item = LineParser::parse_line(line).expect("item");
        Matcher::new(index).match_item(&item)
    }

    #[test]
    fn tier_ranks_are_ordered() {
        let ranks: Vec<u8> = MatchTier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(MatchTier::Exact < MatchTier::Tag);
    }

    #[test]
    fn exact_name_is_tier_one() {
        let index = catalog();
        let result = resolve_one(&index, "ALMOND MILK");
        assert_eq!(result.tier(), Some(MatchTier::Exact));
    }

    #[test]
    fn plural_description_hits_containment() {
        let index = catalog();
        match resolve_one(&index, "3 avocados") {
            MatchResult::Matched {
                product,
                quantity,
                tier,
                ..
            } => {
                assert_eq!(product.id.as_str(), "p001");
                assert_eq!(quantity, 3);
                assert_eq!(tier, MatchTier::Contains);
            }
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn word_overlap_tier() {
        let index = catalog();
        let result = resolve_one(&index, "loaf of bread");
        assert_eq!(result.tier(), Some(MatchTier::WordOverlap));
    }

    #[test]
    fn tag_tier_is_last_resort() {
        let index = catalog();
        match resolve_one(&index, "something high in protein") {
            MatchResult::Matched { product, tier, .. } => {
                assert_eq!(product.id.as_str(), "p004");
                assert_eq!(tier, MatchTier::Tag);
            }
            other => panic!("expected tag match, got {:?}", other),
        }
    }

    #[test]
    fn first_tier_wins_over_later_tiers() {
        // "milk" is both contained in "almond milk" and a tag of it
        let index = catalog();
        assert_eq!(
            resolve_one(&index, "milk").tier(),
            Some(MatchTier::Contains)
        );
    }

    #[test]
    fn punctuation_only_line_is_unmatched_with_raw_text() {
        let index = catalog();
        assert_eq!(
            resolve_one(&index, "  -- !! "),
            MatchResult::unmatched("-- !!")
        );
    }

    #[test]
    fn empty_catalog_leaves_everything_unmatched() {
        let index = CatalogIndex::new();
        let items = LineParser::parse("eggs\nmilk");
        let results = match_items(&items, &index);
        assert_eq!(
            results,
            vec![MatchResult::unmatched("eggs"), MatchResult::unmatched("milk")]
        );
    }

    #[test]
    fn unavailable_products_are_skipped_by_default() {
        let index = catalog();
        assert!(!resolve_one(&index, "saffron").is_matched());

        let options = MatchOptions {
            include_unavailable: true,
        };
        let item = LineParser::parse_line("saffron").expect("item");
        let result = Matcher::with_options(&index, options).match_item(&item);
        assert_eq!(result.tier(), Some(MatchTier::Exact));
    }

    #[test]
    fn variant_hint_flows_into_key() {
        let index = catalog();
        let result = resolve_one(&index, "2 almond milk 1 l");
        assert_eq!(
            result.variant_key().map(VariantKey::as_str),
            Some("p002::1l")
        );
    }

    #[test]
    fn tie_break_is_catalog_order() {
        let index = CatalogIndex::build(vec![
            Product::new("b", "Brown Rice", Price(1)),
            Product::new("a", "Basmati Rice", Price(1)),
        ]);
        let result = resolve_one(&index, "rice");
        match result {
            MatchResult::Matched { product, .. } => assert_eq!(product.id.as_str(), "b"),
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn match_result_serializes_with_kind_tag() {
        let json = serde_json::to_value(MatchResult::unmatched("milk")).expect("json");
        assert_eq!(json["kind"], "unmatched");
        assert_eq!(json["raw_description"], "milk");
    }
}
