//! # Ingestor Module
//!
//! Catalog record validation and ingestion.
//!
//! - Accept raw JSON product records from the catalog source
//! - Reject records that cannot become a `Product`
//! - Fill documented defaults; no semantic enrichment
//! - Never fail a whole load because of one bad record

use crate::primitives::{DEFAULT_CATEGORY, MAX_CATALOG_PRODUCTS, VARIANT_SEPARATOR};
use crate::{GrocerError, Price, Product, ProductId};
use serde_json::{Map, Value};

/// The Ingestor turns raw catalog JSON into validated products.
pub struct Ingestor;

impl Ingestor {
    /// Parse a catalog document.
    ///
    /// Accepts either a bare array of records or `{ "products": [...] }`.
    /// Invalid records are skipped with a warning.
    ///
    /// # Errors
    /// - `DeserializationError` if the bytes are not JSON of either shape
    /// - `InputTooLarge` if the document holds more than
    ///   `MAX_CATALOG_PRODUCTS` records
    pub fn products_from_json(bytes: &[u8]) -> Result<Vec<Product>, GrocerError> {
        let document: Value = serde_json::from_slice(bytes)
            .map_err(|e| GrocerError::DeserializationError(e.to_string()))?;

        let records = match document {
            Value::Array(records) => records,
            Value::Object(mut object) => match object.remove("products") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(GrocerError::DeserializationError(
                        "expected an array or an object with a \"products\" array".to_string(),
                    ));
                }
            },
            _ => {
                return Err(GrocerError::DeserializationError(
                    "catalog must be a JSON array or object".to_string(),
                ));
            }
        };

        if records.len() > MAX_CATALOG_PRODUCTS {
            return Err(GrocerError::InputTooLarge {
                actual: records.len(),
                max: MAX_CATALOG_PRODUCTS,
            });
        }

        let mut products = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match Self::product_from_value(index, record) {
                Ok(product) => products.push(product),
                Err(e) => tracing::warn!(record = index, error = %e, "Skipping catalog record"),
            }
        }

        tracing::debug!(
            records = records.len(),
            accepted = products.len(),
            "Catalog document ingested"
        );
        Ok(products)
    }

    /// Convert one raw record at position `index` into a `Product`.
    ///
    /// # Errors
    /// Returns `InvalidProduct` when the record is not an object, has no
    /// usable name, or has a missing, negative or unparseable price.
    pub fn product_from_value(index: usize, record: &Value) -> Result<Product, GrocerError> {
        let Value::Object(fields) = record else {
            return Err(GrocerError::InvalidProduct(format!(
                "record {} is not an object",
                index + 1
            )));
        };

        let name = text_field(fields, &["name", "productname"]).unwrap_or_default();
        if name.is_empty() {
            return Err(GrocerError::InvalidProduct(format!(
                "record {} has no name",
                index + 1
            )));
        }

        let id = text_field(fields, &["id"]).unwrap_or_else(|| format!("p{}", index + 1));

        let price = fields
            .get("price")
            .and_then(price_value)
            .ok_or_else(|| GrocerError::InvalidProduct(format!("{name}: invalid price")))?;

        let mut product = Product::new(id, name, price)
            .with_category(
                text_field(fields, &["category"]).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            )
            .with_tags(string_list(fields.get("tags")))
            .with_availability(
                bool_field(fields, &["inStock", "in_stock", "available"]).unwrap_or(true),
            );

        if let Some(subcategory) = text_field(fields, &["subcategory"]) {
            product = product.with_subcategory(subcategory);
        }
        if let Some(pack_size) = text_field(fields, &["packSize", "pack_size"]) {
            product = product.with_pack_size(pack_size);
        }
        if let Some(description) = text_field(fields, &["description"]) {
            product = product.with_description(description);
        }
        product.image_url = text_field(fields, &["image", "imageUrl", "image_url"]);

        Self::validate(&product)?;
        Ok(product)
    }

    /// Validate a product before it enters an index.
    ///
    /// A product is valid if its id and name are non-blank and the id does
    /// not contain the variant separator.
    ///
    /// # Errors
    /// Returns `InvalidProduct` otherwise.
    pub fn validate(product: &Product) -> Result<(), GrocerError> {
        if product.id.as_str().trim().is_empty() {
            return Err(GrocerError::InvalidProduct(format!(
                "{}: empty id",
                product.name
            )));
        }
        if product.id.as_str().contains(VARIANT_SEPARATOR) {
            return Err(GrocerError::InvalidProduct(format!(
                "{}: id contains '{}'",
                product.id, VARIANT_SEPARATOR
            )));
        }
        if product.name.trim().is_empty() {
            return Err(GrocerError::InvalidProduct(format!(
                "{}: empty name",
                product.id
            )));
        }
        Ok(())
    }

    /// Parse a product id string as supplied by a caller.
    ///
    /// # Errors
    /// Returns `ProductNotFound` for a blank id, since it can never resolve.
    pub fn product_id(raw: &str) -> Result<ProductId, GrocerError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GrocerError::ProductNotFound(ProductId::new(trimmed)));
        }
        Ok(ProductId::new(trimmed))
    }
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// First non-blank string (or number, rendered) among `keys`.
fn text_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn bool_field(fields: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| fields.get(*key)?.as_bool())
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Price from a JSON number or decimal string, without float arithmetic.
fn price_value(value: &Value) -> Option<Price> {
    match value {
        Value::Number(n) => Price::parse_decimal(&n.to_string()),
        Value::String(s) => Price::parse_decimal(s),
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_array_and_wrapped_object() {
        let bare = br#"[{"id":"p001","name":"Organic Avocado","price":1.99}]"#;
        let wrapped = br#"{"products":[{"id":"p001","name":"Organic Avocado","price":1.99}]}"#;

        let a = Ingestor::products_from_json(bare).expect("bare");
        let b = Ingestor::products_from_json(wrapped).expect("wrapped");
        assert_eq!(a, b);
        assert_eq!(a[0].price, Price(199));
    }

    #[test]
    fn fills_documented_defaults() {
        let json = br#"[{"productname":"Basmati Rice","price":"8.99","packSize":"1 kg"}]"#;
        let products = Ingestor::products_from_json(json).expect("parse");

        let rice = &products[0];
        assert_eq!(rice.id.as_str(), "p1");
        assert_eq!(rice.name, "Basmati Rice");
        assert_eq!(rice.category, DEFAULT_CATEGORY);
        assert_eq!(rice.pack_size.as_deref(), Some("1 kg"));
        assert!(rice.available);
        assert!(rice.tags.is_empty());
    }

    #[test]
    fn reads_stock_tags_and_image() {
        let json = br#"[{"id":"p007","name":"Greek Yogurt","price":4.29,
            "category":"Dairy","tags":["protein"," "],"inStock":false,
            "image":"https://img.example/yogurt.jpg"}]"#;
        let products = Ingestor::products_from_json(json).expect("parse");

        assert!(!products[0].available);
        assert_eq!(products[0].tags, vec!["protein".to_string()]);
        assert!(products[0].image_url.is_some());
    }

    #[test]
    fn skips_bad_records_but_keeps_the_rest() {
        let json = br#"[
            {"id":"a","name":"","price":1},
            {"id":"b","name":"Eggs","price":-1},
            {"id":"c","name":"Milk"},
            42,
            {"id":"d","name":"Bread","price":"3.99"}
        ]"#;
        let products = Ingestor::products_from_json(json).expect("parse");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "d");
    }

    #[test]
    fn synthetic_ids_use_record_position() {
        let json = br#"[{"name":"A","price":1},{"id":"x","name":"B","price":1},{"name":"C","price":1}]"#;
        let ids: Vec<String> = Ingestor::products_from_json(json)
            .expect("parse")
            .into_iter()
            .map(|p| p.id.0)
            .collect();
        assert_eq!(ids, vec!["p1", "x", "p3"]);
    }

    #[test]
    fn rejects_wrong_document_shape() {
        assert!(matches!(
            Ingestor::products_from_json(b"\"nope\""),
            Err(GrocerError::DeserializationError(_))
        ));
        assert!(matches!(
            Ingestor::products_from_json(br#"{"items":[]}"#),
            Err(GrocerError::DeserializationError(_))
        ));
        assert!(Ingestor::products_from_json(b"{not json").is_err());
    }

    #[test]
    fn empty_catalog_is_valid() {
        assert!(Ingestor::products_from_json(b"[]").expect("parse").is_empty());
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let blank_name = Product::new("p1", "  ", Price(1));
        let blank_id = Product::new(" ", "Milk", Price(1));
        assert!(Ingestor::validate(&blank_name).is_err());
        assert!(Ingestor::validate(&blank_id).is_err());
        assert!(Ingestor::validate(&Product::new("p1", "Milk", Price(1))).is_ok());
    }

    #[test]
    fn validate_rejects_ids_holding_the_variant_separator() {
        let spoofed = Product::new("p1::500g", "Toor Dal", Price(1));
        assert!(matches!(
            Ingestor::validate(&spoofed),
            Err(GrocerError::InvalidProduct(_))
        ));
        assert!(Ingestor::validate(&Product::new("p1:500g", "Toor Dal", Price(1))).is_ok());
    }

    #[test]
    fn skips_record_whose_id_looks_like_a_variant_key() {
        let json = br#"[
            {"id":"p1","name":"Basmati Rice","price":1},
            {"id":"p1::500g","name":"Toor Dal","price":2}
        ]"#;
        let products = Ingestor::products_from_json(json).expect("parse");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].name, "Basmati Rice");
    }

    #[test]
    fn product_id_trims_and_rejects_blank() {
        assert_eq!(
            Ingestor::product_id(" p001 ").expect("id"),
            ProductId::new("p001")
        );
        assert!(matches!(
            Ingestor::product_id("   "),
            Err(GrocerError::ProductNotFound(_))
        ));
    }
}
