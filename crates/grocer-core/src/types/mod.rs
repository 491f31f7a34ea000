//! # Core Type Definitions
//!
//! This module contains the value types shared by every stage of the
//! resolution pipeline:
//! - Catalog identifiers and money (`ProductId`, `Price`)
//! - The catalog record itself (`Product`)
//! - The cart merge key (`VariantKey`)
//! - Error types (`GrocerError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (prices are minor units, never floats)
//! - Implement `Ord` where they key a `BTreeMap`
//! - Use saturating arithmetic for totals to prevent overflow

use crate::normalize::split_pack_size;
use crate::primitives::{
    MINOR_UNIT_DIGITS, MINOR_UNITS_PER_MAJOR, VARIANT_SEPARATOR, VARIANT_WORD_SEPARATOR,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable catalog identifier of a product.
///
/// Unique within one catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    /// Create a new product id.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// PRICE
// =============================================================================

/// Unit price in minor currency units (cents, paise).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(pub u64);

impl Price {
    /// Create a price from minor units.
    #[must_use]
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Get the raw minor-unit value.
    #[must_use]
    pub const fn minor(self) -> u64 {
        self.0
    }

    /// Price of `quantity` units, saturating at `u64::MAX`.
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as u64))
    }

    /// Saturating sum of two prices.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a non-negative decimal string such as `"3.49"`, `"120"` or `".5"`.
    ///
    /// Fractional digits beyond the minor-unit precision are truncated.
    /// Returns `None` for negative, empty, exponent-form or overflowing input.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix('+').unwrap_or(text);
        let (whole, frac) = text.split_once('.').unwrap_or((text, ""));

        if whole.is_empty() && frac.is_empty() {
            return None;
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let padded = frac
            .bytes()
            .chain(std::iter::repeat(b'0'))
            .take(MINOR_UNIT_DIGITS);

        let mut minor: u64 = 0;
        for digit in whole.bytes().chain(padded) {
            minor = minor
                .checked_mul(10)?
                .checked_add(u64::from(digit - b'0'))?;
        }
        Some(Self(minor))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / MINOR_UNITS_PER_MAJOR,
            self.0 % MINOR_UNITS_PER_MAJOR,
            width = MINOR_UNIT_DIGITS
        )
    }
}

// =============================================================================
// PRODUCT
// =============================================================================

/// A purchasable catalog entry.
///
/// Replaced wholesale whenever the catalog is reloaded; never mutated
/// during a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Default pack-size / variant descriptor ("500g", "1 kg").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_size: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Create an available product with no tags, pack size or description.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Price) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            price,
            category: crate::primitives::DEFAULT_CATEGORY.to_string(),
            subcategory: None,
            pack_size: None,
            tags: Vec::new(),
            available: true,
            description: None,
            image_url: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    #[must_use]
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    #[must_use]
    pub fn with_pack_size(mut self, pack_size: impl Into<String>) -> Self {
        self.pack_size = Some(pack_size.into());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

// =============================================================================
// VARIANT KEY
// =============================================================================

/// Cart merge key: product id plus resolved pack-size descriptor.
///
/// Keys of distinct products differ only while no product id contains
/// `VARIANT_SEPARATOR` (catalog ingestion and indexing drop such ids) and
/// no descriptor contains `:`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantKey(pub String);

impl VariantKey {
    /// Wrap an already-formed key (e.g. one echoed back by a client).
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Derive the key for `id`.
    ///
    /// The descriptor is the explicit `hint` when present, else the
    /// product's `default_pack`, else nothing. It is lower-cased and split
    /// on whitespace and `:`; a `<number> <unit>` pair is fused (`1 kg` and
    /// `1kg` agree) and other words are joined with `-`. A descriptor with
    /// no words left yields the bare id.
    #[must_use]
    pub fn derive(id: &ProductId, hint: Option<&str>, default_pack: Option<&str>) -> Self {
        let descriptor = hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .or_else(|| default_pack.map(str::trim).filter(|p| !p.is_empty()))
            .and_then(canonical_descriptor);

        match descriptor {
            Some(d) => Self(format!("{}{}{}", id.as_str(), VARIANT_SEPARATOR, d)),
            None => Self(id.as_str().to_string()),
        }
    }

    /// Derive the key for a product, using its default pack size as fallback.
    #[must_use]
    pub fn for_product(product: &Product, hint: Option<&str>) -> Self {
        Self::derive(&product.id, hint, product.pack_size.as_deref())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonical_descriptor(descriptor: &str) -> Option<String> {
    let words: Vec<String> = descriptor
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        return None;
    }
    if let [number, unit] = words.as_slice()
        && let Some(fused) = split_pack_size(number, unit)
    {
        return Some(fused);
    }
    Some(words.join(VARIANT_WORD_SEPARATOR))
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Grocer system.
///
/// Resolution outcomes (unmatched items, empty catalogs, decrementing an
/// absent line) are values, not errors. These variants cover catalog
/// ingestion, configuration and I/O at the edges.
#[derive(Debug, Error)]
pub enum GrocerError {
    /// A raw catalog record could not be turned into a `Product`.
    #[error("Invalid product record: {0}")]
    InvalidProduct(String),

    /// The requested product id is not in the current catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Input exceeded a hard size limit.
    #[error("Input too large: {actual} exceeds maximum {max}")]
    InputTooLarge { actual: usize, max: usize },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A configuration file or value was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// TESTS
// =============================================================================
