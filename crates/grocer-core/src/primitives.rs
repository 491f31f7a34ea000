//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Grocer CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//!
//! ## Groups
//!
//! 1. **Parsing limits**: bound how much free text one submission may carry.
//! 2. **Vocabulary**: stop-words and pack-size units used by tokenization.
//! 3. **Keys and money**: variant-key separators and minor-unit precision.

// =============================================================================
// PARSING LIMITS
// =============================================================================

/// Quantity assumed when a line carries no leading number.
pub const DEFAULT_QUANTITY: u32 = 1;

/// Upper bound for a single line's quantity.
///
/// Larger leading numbers are clamped, never rejected.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// Maximum number of non-blank lines considered per submission.
///
/// Lines past this limit are ignored.
pub const MAX_INPUT_LINES: usize = 500;

/// Maximum byte length of a single input line.
///
/// Longer lines are truncated at the nearest char boundary.
pub const MAX_LINE_LENGTH: usize = 512;

/// Maximum number of raw records accepted in one catalog load.
pub const MAX_CATALOG_PRODUCTS: usize = 100_000;

/// Default number of recommendations returned for an order.
pub const RECOMMENDATION_LIMIT: usize = 3;

/// Category assigned to catalog records that carry none.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

// =============================================================================
// VOCABULARY
// =============================================================================

/// Words ignored when counting description tokens for word-overlap matching.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "of", "the", "some", "for", "with", "to", "in", "please", "i", "need",
    "want", "get", "buy", "me", "my", "x",
];

/// Units recognised in pack-size hints ("500g", "1 kg", "2 pcs").
pub const PACK_UNITS: &[&str] = &[
    "g", "gm", "gms", "kg", "mg", "ml", "l", "ltr", "lb", "lbs", "oz", "pc", "pcs", "pack",
    "dozen",
];

/// Words shorter than this are never singularized ("gas", "bus").
pub const MIN_SINGULAR_LENGTH: usize = 4;

// =============================================================================
// KEYS AND MONEY
// =============================================================================

/// Separator between product id and pack-size descriptor in a variant key.
pub const VARIANT_SEPARATOR: &str = "::";

/// Replacement for whitespace runs inside a pack-size descriptor.
pub const VARIANT_WORD_SEPARATOR: &str = "-";

/// Number of fractional digits carried by `Price`.
pub const MINOR_UNIT_DIGITS: usize = 2;

/// Minor units per major currency unit (10^MINOR_UNIT_DIGITS).
pub const MINOR_UNITS_PER_MAJOR: u64 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minor_units_match_digit_count() {
        assert_eq!(MINOR_UNITS_PER_MAJOR, 10u64.pow(MINOR_UNIT_DIGITS as u32));
    }

    #[test]
    fn default_quantity_within_bounds() {
        assert!(DEFAULT_QUANTITY >= 1);
        assert!(DEFAULT_QUANTITY <= MAX_LINE_QUANTITY);
    }

    #[test]
    fn vocabulary_is_lowercase() {
        for word in STOP_WORDS.iter().chain(PACK_UNITS) {
            assert_eq!(*word, word.to_lowercase());
        }
    }
}
