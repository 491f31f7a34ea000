//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Money is always reported in minor units (`total: 1047` is 10.47).

use grocer_core::{ExtractedItem, MatchResult, Order, Product};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Catalog and session status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub product_count: usize,
    pub category_count: usize,
    pub tag_count: usize,
    pub session_count: usize,
}

// =============================================================================
// PRODUCTS
// =============================================================================

/// `GET /products` query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

/// Product JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductJson {
    pub id: String,
    pub name: String,
    pub price: u64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_size: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub available: bool,
}

impl From<&Product> for ProductJson {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.0.clone(),
            name: product.name.clone(),
            price: product.price.minor(),
            category: product.category.clone(),
            pack_size: product.pack_size.clone(),
            tags: product.tags.clone(),
            available: product.available,
        }
    }
}

/// A list of products (search results or recommendations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub count: usize,
    pub products: Vec<ProductJson>,
}

impl ProductsResponse {
    pub fn from_products(products: &[&Product]) -> Self {
        Self {
            count: products.len(),
            products: products.iter().map(|p| ProductJson::from(*p)).collect(),
        }
    }
}

// =============================================================================
// CATALOG REPLACEMENT
// =============================================================================

/// `PUT /catalog` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub success: bool,
    pub product_count: usize,
    pub sessions_updated: usize,
    pub error: Option<String>,
}

impl CatalogResponse {
    pub fn success(product_count: usize, sessions_updated: usize) -> Self {
        Self {
            success: true,
            product_count,
            sessions_updated,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            product_count: 0,
            sessions_updated: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SESSION REQUESTS
// =============================================================================

/// Free-text submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// Structured extraction submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub items: Vec<ExtractedItem>,
}

/// Add one unit of a product from catalog browsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_hint: Option<String>,
}

/// Increment or decrement an existing line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRequest {
    pub variant_key: String,
}

// =============================================================================
// ORDER RESPONSE
// =============================================================================

/// Order line JSON representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineJson {
    pub product_id: String,
    pub variant_key: String,
    pub quantity: u32,
    pub name: String,
    pub unit_price: u64,
    pub line_total: u64,
}

/// Per-item outcome of a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchJson {
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_description: Option<String>,
}

impl From<&MatchResult> for MatchJson {
    fn from(result: &MatchResult) -> Self {
        match result {
            MatchResult::Matched {
                product,
                quantity,
                variant_key,
                tier,
            } => Self {
                matched: true,
                product_id: Some(product.id.0.clone()),
                variant_key: Some(variant_key.0.clone()),
                quantity: Some(*quantity),
                tier: Some(tier.rank()),
                raw_description: None,
            },
            MatchResult::Unmatched { raw_description } => Self {
                matched: false,
                product_id: None,
                variant_key: None,
                quantity: None,
                tier: None,
                raw_description: Some(raw_description.clone()),
            },
        }
    }
}

/// Order snapshot enriched for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    pub order_lines: Vec<OrderLineJson>,
    pub unmatched: Vec<String>,
    pub total: u64,
    pub item_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchJson>,
    pub error: Option<String>,
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        let snapshot = order.snapshot();
        let order_lines = snapshot
            .order_lines
            .into_iter()
            .zip(order.lines())
            .map(|(entry, line)| OrderLineJson {
                product_id: entry.product_id.0,
                variant_key: entry.variant_key.0,
                quantity: entry.quantity,
                name: line.product.name.clone(),
                unit_price: line.product.price.minor(),
                line_total: line.line_total().minor(),
            })
            .collect();

        Self {
            success: true,
            order_lines,
            unmatched: snapshot.unmatched,
            total: order.total().minor(),
            item_count: order.item_count(),
            matches: Vec::new(),
            error: None,
        }
    }

    /// Attach per-item outcomes of the submission that produced this order.
    #[must_use]
    pub fn with_matches(mut self, results: &[MatchResult]) -> Self {
        self.matches = results.iter().map(MatchJson::from).collect();
        self
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            order_lines: Vec::new(),
            unmatched: Vec::new(),
            total: 0,
            item_count: 0,
            matches: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SESSION DELETION
// =============================================================================

/// `DELETE /sessions/{id}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub success: bool,
    pub existed: bool,
    pub error: Option<String>,
}
