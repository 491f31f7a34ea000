//! # Normalization Module
//!
//! Text folding and tokenization shared by the index, parser and matcher.
//!
//! - Folding is lower-case, trimmed, with internal whitespace collapsed
//! - Tokens split on anything that is not alphanumeric
//! - Singular forms use a small suffix table, no dictionary

use crate::primitives::{MIN_SINGULAR_LENGTH, PACK_UNITS, STOP_WORDS};

/// Fold text for case-insensitive comparison.
#[must_use]
pub fn fold(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the text contains at least one alphanumeric character.
#[must_use]
pub fn has_alphanumeric(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Split folded text into alphanumeric tokens.
#[must_use]
pub fn tokens(folded: &str) -> Vec<&str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Tokens that carry meaning: stop-words removed.
#[must_use]
pub fn significant_tokens(folded: &str) -> Vec<&str> {
    tokens(folded)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

#[must_use]
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Singular form of a lower-case word.
///
/// Only purely alphabetic words of at least `MIN_SINGULAR_LENGTH` chars
/// are rewritten.
#[must_use]
pub fn singular(word: &str) -> String {
    if word.chars().count() < MIN_SINGULAR_LENGTH || !word.chars().all(char::is_alphabetic) {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{stem}y");
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{stem}o");
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    for suffix in ["shes", "ches", "xes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with("ss") || word.ends_with("us") {
        return word.to_string();
    }

    word.strip_suffix('s')
        .map_or_else(|| word.to_string(), str::to_string)
}

/// Singularize every whitespace-separated word of folded text.
#[must_use]
pub fn singular_phrase(folded: &str) -> String {
    folded
        .split(' ')
        .map(singular)
        .collect::<Vec<_>>()
        .join(" ")
}

// =============================================================================
// PACK SIZES
// =============================================================================

#[must_use]
pub fn is_pack_unit(token: &str) -> bool {
    PACK_UNITS.contains(&token)
}

/// A plain decimal count: `5`, `1.5`. No sign, no exponent.
#[must_use]
pub fn is_pack_number(token: &str) -> bool {
    let mut dots = 0;
    for c in token.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1
        && token.starts_with(|c: char| c.is_ascii_digit())
        && token.ends_with(|c: char| c.is_ascii_digit())
}

/// Canonical pack size for a fused token like `500g` or `1.5l`.
#[must_use]
pub fn fused_pack_size(token: &str) -> Option<String> {
    let split = token.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
    let (number, unit) = token.split_at(split);
    (is_pack_number(number) && is_pack_unit(unit)).then(|| format!("{number}{unit}"))
}

/// Canonical pack size for a token pair like `1` `kg`.
#[must_use]
pub fn split_pack_size(number: &str, unit: &str) -> Option<String> {
    (is_pack_number(number) && is_pack_unit(unit)).then(|| format!("{number}{unit}"))
}

// =============================================================================
// TESTS
// =============================================================================
