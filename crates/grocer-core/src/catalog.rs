//! # Catalog Index
//!
//! An immutable, queryable view of one catalog snapshot.
//!
//! - Built fresh from the full product list (no incremental update)
//! - Names and tags are folded once at build time, so every lookup is a
//!   case-insensitive comparison
//! - Every lookup returns candidates in catalog order, which makes the
//!   matcher's "first candidate wins" rule deterministic
//! - An empty product list yields an index that matches nothing

use crate::normalize::{fold, significant_tokens};
use crate::primitives::VARIANT_SEPARATOR;
use crate::{Product, ProductId};
use std::collections::BTreeMap;

/// Folded view of one product, aligned by position with `products`.
#[derive(Debug, Clone)]
struct IndexEntry {
    name: String,
    name_tokens: Vec<String>,
    tags: Vec<String>,
    category: String,
    description: String,
}

impl IndexEntry {
    fn from_product(product: &Product) -> Self {
        let name = fold(&product.name);
        let name_tokens = significant_tokens(&name)
            .into_iter()
            .map(str::to_string)
            .collect();
        let tags = product
            .tags
            .iter()
            .map(|t| fold(t))
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            name,
            name_tokens,
            tags,
            category: fold(&product.category),
            description: product.description.as_deref().map(fold).unwrap_or_default(),
        }
    }
}

/// In-memory index over a catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    products: Vec<Product>,
    entries: Vec<IndexEntry>,
    by_id: BTreeMap<ProductId, usize>,
    by_name: BTreeMap<String, Vec<usize>>,
    by_tag: BTreeMap<String, Vec<usize>>,
}

impl CatalogIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a full product list.
    ///
    /// Product ids must be unique within a snapshot: a later record reusing
    /// an id is dropped with a warning and the first one is kept. Ids holding
    /// the variant separator are dropped as well.
    pub fn build(products: impl IntoIterator<Item = Product>) -> Self {
        let mut index = Self::new();

        for product in products {
            if product.id.as_str().contains(VARIANT_SEPARATOR) {
                tracing::warn!(
                    product_id = %product.id,
                    name = %product.name,
                    "Dropping catalog record whose id contains the variant separator"
                );
                continue;
            }
            if index.by_id.contains_key(&product.id) {
                tracing::warn!(
                    product_id = %product.id,
                    name = %product.name,
                    "Dropping catalog record with duplicate id"
                );
                continue;
            }

            let position = index.products.len();
            let entry = IndexEntry::from_product(&product);

            index.by_id.insert(product.id.clone(), position);
            index
                .by_name
                .entry(entry.name.clone())
                .or_default()
                .push(position);
            for tag in &entry.tags {
                let slots = index.by_tag.entry(tag.clone()).or_default();
                if slots.last() != Some(&position) {
                    slots.push(position);
                }
            }

            index.entries.push(entry);
            index.products.push(product);
        }

        tracing::info!(
            products = index.products.len(),
            tags = index.by_tag.len(),
            "Catalog index built"
        );
        index
    }

    /// Number of indexed products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// All products in catalog order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.by_id.get(id).map(|&i| &self.products[i])
    }

    /// Product count per category, ordered by category name.
    #[must_use]
    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for product in &self.products {
            *counts.entry(product.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct folded tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    /// First product whose folded name equals the folded `name`.
    #[must_use]
    pub fn lookup_exact(&self, name: &str) -> Option<&Product> {
        self.lookup_exact_all(name).into_iter().next()
    }

    /// Every product whose folded name equals the folded `name`.
    #[must_use]
    pub fn lookup_exact_all(&self, name: &str) -> Vec<&Product> {
        self.by_name
            .get(&fold(name))
            .map(|slots| slots.iter().map(|&i| &self.products[i]).collect())
            .unwrap_or_default()
    }

    /// Products whose name contains `name`, or whose name is contained in it.
    #[must_use]
    pub fn lookup_contains(&self, name: &str) -> Vec<&Product> {
        self.lookup_contains_any(&[name])
    }

    /// Bidirectional containment against several phrasings at once.
    ///
    /// A product is returned once, at its catalog position, if any needle
    /// matches. Blank needles never match.
    #[must_use]
    pub fn lookup_contains_any(&self, needles: &[&str]) -> Vec<&Product> {
        let folded: Vec<String> = needles
            .iter()
            .map(|n| fold(n))
            .filter(|n| !n.is_empty())
            .collect();
        if folded.is_empty() {
            return Vec::new();
        }

        self.select(|entry| {
            !entry.name.is_empty()
                && folded
                    .iter()
                    .any(|n| entry.name.contains(n.as_str()) || n.contains(entry.name.as_str()))
        })
    }

    /// Products carrying exactly this tag (case-insensitive).
    #[must_use]
    pub fn lookup_by_tag(&self, tag: &str) -> Vec<&Product> {
        self.by_tag
            .get(&fold(tag))
            .map(|slots| slots.iter().map(|&i| &self.products[i]).collect())
            .unwrap_or_default()
    }

    /// Products whose significant name tokens overlap the description.
    ///
    /// With `n` significant description tokens, a product needs at least
    /// `max(1, ceil(n / 2))` of its name tokens to occur as substrings of
    /// the folded description.
    #[must_use]
    pub fn lookup_word_overlap(&self, description: &str) -> Vec<&Product> {
        let folded = fold(description);
        let word_count = significant_tokens(&folded).len();
        let required = word_count.div_ceil(2).max(1);

        self.select(|entry| {
            entry
                .name_tokens
                .iter()
                .filter(|t| folded.contains(t.as_str()))
                .count()
                >= required
        })
    }

    /// Products with at least one tag occurring verbatim in the description.
    #[must_use]
    pub fn lookup_tag_within(&self, description: &str) -> Vec<&Product> {
        let folded = fold(description);
        if folded.is_empty() {
            return Vec::new();
        }
        self.select(|entry| entry.tags.iter().any(|t| folded.contains(t.as_str())))
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    /// Catalog browsing search.
    ///
    /// A blank query returns every product. Otherwise a product is returned
    /// when its name, description, category or any tag contains the query.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let folded = fold(query);
        if folded.is_empty() {
            return self.products.iter().collect();
        }

        let needle = folded.as_str();
        self.select(|entry| {
            entry.name.contains(needle)
                || entry.description.contains(needle)
                || entry.category.contains(needle)
                || entry.tags.iter().any(|t| t.contains(needle))
        })
    }

    /// Products whose entry satisfies `predicate`, in catalog order.
    fn select(&self, predicate: impl Fn(&IndexEntry) -> bool) -> Vec<&Product> {
        self.entries
            .iter()
            .zip(&self.products)
            .filter(|(entry, _)| predicate(entry))
            .map(|(_, product)| product)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
