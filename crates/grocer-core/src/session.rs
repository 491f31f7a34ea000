//! # Session Module
//!
//! One shopper's view of the engine: a catalog snapshot, an order and the
//! pending free-text input.
//!
//! - A session is the single thread of control over its order; callers
//!   that share one across tasks serialize access themselves
//! - Free-text and extraction submissions replace the order
//! - Browsing operations (add, increment, decrement) merge into it
//! - Swapping the catalog leaves existing lines untouched; they keep the
//!   product copies taken when they were created

use crate::catalog::CatalogIndex;
use crate::matcher::{MatchOptions, MatchResult, Matcher};
use crate::order::{Order, OrderSnapshot};
use crate::parser::{ExtractedItem, LineParser, RequestedItem};
use crate::primitives::RECOMMENDATION_LIMIT;
use crate::recommend::Recommender;
use crate::reconciler::{ReconcileMode, Reconciler};
use crate::{GrocerError, Product, ProductId, VariantKey};

/// A shopper session.
#[derive(Debug, Clone)]
pub struct Session {
    index: CatalogIndex,
    order: Order,
    pending_input: String,
    last_results: Vec<MatchResult>,
    options: MatchOptions,
    recommendation_limit: usize,
}

impl Session {
    /// Create a session over `index` with default matching options.
    #[must_use]
    pub fn new(index: CatalogIndex) -> Self {
        Self::with_options(index, MatchOptions::default())
    }

    #[must_use]
    pub fn with_options(index: CatalogIndex, options: MatchOptions) -> Self {
        Self {
            index,
            order: Order::new(),
            pending_input: String::new(),
            last_results: Vec::new(),
            options,
            recommendation_limit: RECOMMENDATION_LIMIT,
        }
    }

    /// Override how many recommendations `recommendations` returns.
    #[must_use]
    pub fn with_recommendation_limit(mut self, limit: usize) -> Self {
        self.recommendation_limit = limit;
        self
    }

    #[must_use]
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// The last non-blank free text submitted.
    #[must_use]
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Per-item outcomes of the most recent submission.
    #[must_use]
    pub fn last_results(&self) -> &[MatchResult] {
        &self.last_results
    }

    #[must_use]
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    #[must_use]
    pub fn snapshot(&self) -> OrderSnapshot {
        self.order.snapshot()
    }

    // =========================================================================
    // SUBMISSIONS (replace mode)
    // =========================================================================

    /// Resolve a free-text order and replace the current order with it.
    ///
    /// Blank text leaves the order untouched and resolves nothing, so
    /// `last_results` is emptied.
    pub fn submit_text(&mut self, text: &str) -> OrderSnapshot {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring blank submission");
            self.last_results.clear();
            return self.snapshot();
        }

        let items = LineParser::parse(text);
        self.pending_input = text.to_string();
        self.replace_with(&items.to_vec())
    }

    /// Resolve a structured extraction and replace the current order with it.
    ///
    /// An extraction with no usable items behaves like blank text.
    pub fn submit_extraction(&mut self, extracted: &[ExtractedItem]) -> OrderSnapshot {
        let items = LineParser::from_extraction(extracted);
        if items.is_empty() {
            tracing::debug!("Ignoring empty extraction");
            self.last_results.clear();
            return self.snapshot();
        }
        self.replace_with(&items)
    }

    fn replace_with(&mut self, items: &[RequestedItem]) -> OrderSnapshot {
        let results = Matcher::with_options(&self.index, self.options).match_items(items);
        Reconciler::apply(&mut self.order, &results, ReconcileMode::Replace);

        tracing::info!(
            items = items.len(),
            matched = results.iter().filter(|r| r.is_matched()).count(),
            unmatched = self.order.unmatched().len(),
            "Order submission resolved"
        );
        self.last_results = results;
        self.snapshot()
    }

    // =========================================================================
    // BROWSING (merge mode)
    // =========================================================================

    /// Add one unit of a catalog product.
    ///
    /// # Errors
    /// Returns `ProductNotFound` if the id is not in the current catalog.
    pub fn add_one(
        &mut self,
        product_id: &ProductId,
        variant_hint: Option<&str>,
    ) -> Result<VariantKey, GrocerError> {
        let product = self
            .index
            .get(product_id)
            .ok_or_else(|| GrocerError::ProductNotFound(product_id.clone()))?;
        let key = Reconciler::add_one(&mut self.order, product, variant_hint);
        tracing::debug!(variant_key = %key, "Added product to order");
        Ok(key)
    }

    /// Increase a line by one. Absent keys are a no-op returning false.
    pub fn increment_one(&mut self, key: &VariantKey) -> bool {
        Reconciler::increment_one(&mut self.order, key)
    }

    /// Decrease a line by one. Absent keys are a no-op returning false.
    pub fn decrement_one(&mut self, key: &VariantKey) -> bool {
        Reconciler::decrement_one(&mut self.order, key)
    }

    /// Empty the order and forget the pending input.
    pub fn clear(&mut self) {
        Reconciler::clear(&mut self.order);
        self.pending_input.clear();
        self.last_results.clear();
    }

    // =========================================================================
    // CATALOG
    // =========================================================================

    /// Swap in a new catalog snapshot.
    pub fn replace_catalog(&mut self, index: CatalogIndex) {
        tracing::debug!(
            previous = self.index.len(),
            next = index.len(),
            "Replacing session catalog"
        );
        self.index = index;
    }

    /// Suggestions related to the most recent order line.
    #[must_use]
    pub fn recommendations(&self) -> Vec<&Product> {
        Recommender::for_order(&self.index, &self.order, self.recommendation_limit)
    }
}

// =============================================================================
// TESTS
// =============================================================================
