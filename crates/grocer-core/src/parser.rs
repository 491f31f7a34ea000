//! # Line Parser
//!
//! Turns free text into `RequestedItem` records, one per non-blank line.
//!
//! - A leading digit run followed by whitespace is the quantity
//! - Without one, the quantity defaults to 1
//! - A pack-size token (`500g`, `1 kg`) inside the description becomes the
//!   variant hint
//! - No unit arithmetic: `5 kg rice` is quantity 5 of `kg rice`
//!
//! Parsing is lazy and restartable: `RequestedItems` borrows the text and
//! every `iter()` re-scans it from the first line.

use crate::normalize::{fused_pack_size, split_pack_size};
use crate::primitives::{DEFAULT_QUANTITY, MAX_INPUT_LINES, MAX_LINE_LENGTH, MAX_LINE_QUANTITY};
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUESTED ITEM
// =============================================================================

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    /// Lower-cased text after the quantity, as the user wrote it.
    pub raw: String,
    /// Description used for matching (variant hint removed).
    pub description: String,
    /// Requested count, always at least 1.
    pub quantity: u32,
    /// Explicit pack-size hint, canonicalized (`1 kg` → `1kg`).
    pub variant_hint: Option<String>,
}

impl RequestedItem {
    /// Create an item with no variant hint.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: u32) -> Self {
        let description = description.into();
        Self {
            raw: description.clone(),
            description,
            quantity: quantity.clamp(DEFAULT_QUANTITY, MAX_LINE_QUANTITY),
            variant_hint: None,
        }
    }

    #[must_use]
    pub fn with_variant_hint(mut self, hint: impl Into<String>) -> Self {
        self.variant_hint = Some(hint.into());
        self
    }
}

// =============================================================================
// STRUCTURED EXTRACTION INPUT
// =============================================================================

/// Quantity as delivered by an upstream extraction step: `2` or `"5 kg"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedQuantity {
    Count(u64),
    Text(String),
}

/// One record from an upstream structured extraction step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    #[serde(alias = "product_name", alias = "name")]
    pub productname: String,
    #[serde(default)]
    pub quantity: Option<ExtractedQuantity>,
}

// =============================================================================
// PARSER
// =============================================================================

/// Stateless line parser.
pub struct LineParser;

impl LineParser {
    /// Parse free text into a restartable sequence of requested items.
    #[must_use]
    pub fn parse(text: &str) -> RequestedItems<'_> {
        RequestedItems { text }
    }

    /// Parse a single line. Blank lines yield `None`.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<RequestedItem> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let bounded = truncate_at_char_boundary(trimmed, MAX_LINE_LENGTH);
        if bounded.len() < trimmed.len() {
            tracing::warn!(
                length = trimmed.len(),
                max = MAX_LINE_LENGTH,
                "Truncating over-long input line"
            );
        }

        let lowered = bounded.trim_end().to_lowercase();
        let (quantity, rest) =
            split_leading_quantity(&lowered).unwrap_or((DEFAULT_QUANTITY, lowered.as_str()));
        let (description, variant_hint) = split_variant_hint(rest);

        Some(RequestedItem {
            raw: rest.to_string(),
            description,
            quantity,
            variant_hint,
        })
    }

    /// Convert structured extraction records into requested items.
    ///
    /// Only the leading digit run of a textual quantity is used; trailing
    /// unit text is discarded. Records with a blank name are skipped.
    #[must_use]
    pub fn from_extraction(items: &[ExtractedItem]) -> Vec<RequestedItem> {
        items
            .iter()
            .filter_map(|item| {
                let name = item.productname.trim().to_lowercase();
                if name.is_empty() {
                    tracing::warn!("Skipping extracted item with blank product name");
                    return None;
                }

                let quantity = match &item.quantity {
                    None => DEFAULT_QUANTITY,
                    Some(ExtractedQuantity::Count(n)) => {
                        clamp_quantity(u32::try_from(*n).unwrap_or(u32::MAX))
                    }
                    Some(ExtractedQuantity::Text(text)) => Self::leading_quantity(text),
                };
                let (description, variant_hint) = split_variant_hint(&name);

                Some(RequestedItem {
                    raw: name,
                    description,
                    quantity,
                    variant_hint,
                })
            })
            .take(MAX_INPUT_LINES)
            .collect()
    }

    /// Quantity from the leading digit run of `text` (`"5 kg"` → 5).
    ///
    /// No digits, or a zero count, yields the default quantity.
    #[must_use]
    pub fn leading_quantity(text: &str) -> u32 {
        let digits: String = text
            .trim_start()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return DEFAULT_QUANTITY;
        }
        clamp_quantity(saturating_parse(&digits))
    }
}

/// Borrowed, lazily parsed view over a free-text submission.
#[derive(Debug, Clone, Copy)]
pub struct RequestedItems<'a> {
    text: &'a str,
}

impl<'a> RequestedItems<'a> {
    /// Start a fresh pass over the text.
    #[must_use]
    pub fn iter(&self) -> RequestedItemIter<'a> {
        RequestedItemIter {
            lines: self.text.lines(),
            emitted: 0,
        }
    }

    /// Collect one full pass.
    #[must_use]
    pub fn to_vec(&self) -> Vec<RequestedItem> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &RequestedItems<'a> {
    type Item = RequestedItem;
    type IntoIter = RequestedItemIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator produced by `RequestedItems::iter`.
#[derive(Debug, Clone)]
pub struct RequestedItemIter<'a> {
    lines: std::str::Lines<'a>,
    emitted: usize,
}

impl Iterator for RequestedItemIter<'_> {
    type Item = RequestedItem;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= MAX_INPUT_LINES {
            if self.lines.any(|l| !l.trim().is_empty()) {
                tracing::warn!(max = MAX_INPUT_LINES, "Ignoring input lines past the limit");
            }
            return None;
        }

        for line in self.lines.by_ref() {
            if let Some(item) = LineParser::parse_line(line) {
                self.emitted += 1;
                return Some(item);
            }
        }
        None
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// `"12 eggs"` → `(12, "eggs")`. Requires whitespace after the digits.
fn split_leading_quantity(line: &str) -> Option<(u32, &str)> {
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }

    let (digits, rest) = line.split_at(digits_end);
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }

    Some((clamp_quantity(saturating_parse(digits)), rest))
}

/// Pull the first pack-size token out of a description.
///
/// The hint is only taken when something remains to match on.
fn split_variant_hint(text: &str) -> (String, Option<String>) {
    let words: Vec<&str> = text.split_whitespace().collect();

    let mut found = None;
    for (i, word) in words.iter().enumerate() {
        if let Some(hint) = fused_pack_size(word) {
            found = Some((i, 1, hint));
            break;
        }
        if let Some(hint) = words.get(i + 1).and_then(|unit| split_pack_size(word, unit)) {
            found = Some((i, 2, hint));
            break;
        }
    }

    match found {
        Some((start, width, hint)) if words.len() > width => {
            let remaining: Vec<&str> = words
                .iter()
                .enumerate()
                .filter(|(i, _)| *i < start || *i >= start + width)
                .map(|(_, w)| *w)
                .collect();
            (remaining.join(" "), Some(hint))
        }
        _ => (words.join(" "), None),
    }
}

fn saturating_parse(digits: &str) -> u32 {
    digits.bytes().fold(0u32, |acc, b| {
        acc.saturating_mul(10).saturating_add(u32::from(b - b'0'))
    })
}

fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(DEFAULT_QUANTITY, MAX_LINE_QUANTITY)
}

fn truncate_at_char_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_item_per_non_blank_line_in_order() {
        let items = LineParser::parse("2 avocados\n\n   \n1 loaf of bread\nmilk\n").to_vec();
        let descriptions: Vec<_> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["avocados", "loaf of bread", "milk"]);
        assert_eq!(
            items.iter().map(|i| i.quantity).collect::<Vec<_>>(),
            vec![2, 1, 1]
        );
    }

    #[test]
    fn missing_quantity_defaults_to_one_and_lowercases() {
        let item = LineParser::parse_line("  Greek Yogurt ").expect("item");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.description, "greek yogurt");
        assert_eq!(item.raw, "greek yogurt");
    }

    #[test]
    fn digits_without_whitespace_are_not_a_quantity() {
        let item = LineParser::parse_line("7up").expect("item");
        assert_eq!(item.quantity, 1);
        assert_eq!(item.description, "7up");

        let bare = LineParser::parse_line("42").expect("item");
        assert_eq!(bare.quantity, 1);
        assert_eq!(bare.description, "42");
    }

    #[test]
    fn unit_after_quantity_stays_in_description() {
        let item = LineParser::parse_line("5 kg rice").expect("item");
        assert_eq!(item.quantity, 5);
        assert_eq!(item.description, "kg rice");
        assert_eq!(item.variant_hint, None);
    }

    #[test]
    fn pack_size_becomes_variant_hint() {
        let fused = LineParser::parse_line("2 Almond Milk 500ml").expect("item");
        assert_eq!(fused.quantity, 2);
        assert_eq!(fused.description, "almond milk");
        assert_eq!(fused.variant_hint.as_deref(), Some("500ml"));
        assert_eq!(fused.raw, "almond milk 500ml");

        let split = LineParser::parse_line("basmati rice 1 kg").expect("item");
        assert_eq!(split.description, "basmati rice");
        assert_eq!(split.variant_hint.as_deref(), Some("1kg"));
    }

    #[test]
    fn lone_pack_size_is_kept_as_description() {
        let item = LineParser::parse_line("500g").expect("item");
        assert_eq!(item.description, "500g");
        assert_eq!(item.variant_hint, None);
    }

    #[test]
    fn quantity_is_clamped() {
        assert_eq!(LineParser::parse_line("0 eggs").expect("item").quantity, 1);
        assert_eq!(
            LineParser::parse_line("99999999999999 eggs")
                .expect("item")
                .quantity,
            MAX_LINE_QUANTITY
        );
    }

    #[test]
    fn parse_is_restartable() {
        let parsed = LineParser::parse("eggs\nmilk");
        let first: Vec<_> = parsed.iter().collect();
        let second: Vec<_> = (&parsed).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn windows_line_endings() {
        let items = LineParser::parse("3 eggs\r\nmilk\r\n").to_vec();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].description, "eggs");
        assert_eq!(items[1].description, "milk");
    }

    #[test]
    fn input_line_limit() {
        let text = "milk\n".repeat(MAX_INPUT_LINES + 10);
        assert_eq!(LineParser::parse(&text).iter().count(), MAX_INPUT_LINES);
    }

    #[test]
    fn long_lines_are_truncated_on_char_boundary() {
        let line = "é".repeat(MAX_LINE_LENGTH);
        let item = LineParser::parse_line(&line).expect("item");
        assert!(item.raw.len() <= MAX_LINE_LENGTH);
    }

    #[test]
    fn leading_quantity_takes_digit_run_only() {
        assert_eq!(LineParser::leading_quantity("5 kg"), 5);
        assert_eq!(LineParser::leading_quantity("12"), 12);
        assert_eq!(LineParser::leading_quantity("kg"), 1);
        assert_eq!(LineParser::leading_quantity(""), 1);
        assert_eq!(LineParser::leading_quantity("0"), 1);
    }

    #[test]
    fn extraction_records_convert() {
        let items = vec![
            ExtractedItem {
                productname: "Basmati Rice".to_string(),
                quantity: Some(ExtractedQuantity::Text("5 kg".to_string())),
            },
            ExtractedItem {
                productname: "  ".to_string(),
                quantity: None,
            },
            ExtractedItem {
                productname: "Toor Dal 1kg".to_string(),
                quantity: Some(ExtractedQuantity::Count(2)),
            },
        ];

        let requested = LineParser::from_extraction(&items);
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0].description, "basmati rice");
        assert_eq!(requested[0].quantity, 5);
        assert_eq!(requested[1].description, "toor dal");
        assert_eq!(requested[1].quantity, 2);
        assert_eq!(requested[1].variant_hint.as_deref(), Some("1kg"));
    }

    #[test]
    fn extraction_json_shape() {
        let json = r#"[{"productname":"Milk","quantity":"2 l"},{"product_name":"Eggs","quantity":12},{"name":"Salt"}]"#;
        let items: Vec<ExtractedItem> = serde_json::from_str(json).expect("parse");
        let requested = LineParser::from_extraction(&items);
        assert_eq!(
            requested.iter().map(|r| r.quantity).collect::<Vec<_>>(),
            vec![2, 12, 1]
        );
    }
}
