//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use grocer::api::{self, AppState, OrderResponse, ProductJson, ProductsResponse};
use grocer::config::GrocerConfig;
use grocer_core::{
    CatalogIndex, GrocerError, Ingestor, MatchResult, Product, Recommender, Session,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum catalog file size (50 MB).
const MAX_CATALOG_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Maximum shopping list file size (1 MB).
const MAX_LIST_FILE_SIZE: u64 = 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GrocerError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GrocerError::IoError(format!("Cannot read file metadata: {}", e)))?;

    let actual = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if metadata.len() > max_size {
        return Err(GrocerError::InputTooLarge {
            actual,
            max: usize::try_from(max_size).unwrap_or(usize::MAX),
        });
    }
    Ok(())
}

/// Canonicalize `path` and ensure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GrocerError> {
    let canonical = path.canonicalize().map_err(|e| {
        GrocerError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GrocerError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// COMMAND CONTEXT
// =============================================================================

/// Settings shared by every command.
#[derive(Debug)]
pub struct CommandContext {
    pub config: GrocerConfig,
    pub catalog_path: Option<PathBuf>,
    pub json_mode: bool,
    pub verbose: bool,
}

impl CommandContext {
    /// Load the configured catalog, or an empty one when none is configured.
    pub fn load_catalog(&self) -> Result<CatalogIndex, GrocerError> {
        match &self.catalog_path {
            Some(path) => load_catalog(path),
            None => {
                tracing::warn!("No catalog configured; starting with an empty catalog");
                Ok(CatalogIndex::new())
            }
        }
    }

    fn session(&self) -> Result<Session, GrocerError> {
        Ok(
            Session::with_options(self.load_catalog()?, self.config.match_options())
                .with_recommendation_limit(self.config.matching.recommendation_limit),
        )
    }
}

/// Read and index a JSON catalog file.
pub fn load_catalog(path: &Path) -> Result<CatalogIndex, GrocerError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, MAX_CATALOG_FILE_SIZE)?;

    let bytes = std::fs::read(&canonical)
        .map_err(|e| GrocerError::IoError(format!("Cannot read catalog: {}", e)))?;
    let products = Ingestor::products_from_json(&bytes)?;
    Ok(CatalogIndex::build(products))
}

fn print_json(value: &impl serde::Serialize) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    ctx: &CommandContext,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), GrocerError> {
    let catalog = ctx.load_catalog()?;
    let host = host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = port.unwrap_or(ctx.config.server.port);

    println!("Grocer Order Matching Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    match &ctx.catalog_path {
        Some(path) => println!("  Catalog:  {} ({} products)", path.display(), catalog.len()),
        None => println!("  Catalog:  (empty)"),
    }
    println!();
    println!("Endpoints:");
    println!("  GET    /health                          - Health check");
    println!("  GET    /status                          - Catalog status");
    println!("  GET    /products?q=                     - Search products");
    println!("  PUT    /catalog                         - Replace catalog");
    println!("  POST   /sessions/{{id}}/submit            - Resolve free text");
    println!("  POST   /sessions/{{id}}/extraction        - Resolve structured items");
    println!("  POST   /sessions/{{id}}/cart/{{op}}         - add | increment | decrement | clear");
    println!("  GET    /sessions/{{id}}/order             - Current order");
    println!("  GET    /sessions/{{id}}/recommendations   - Related products");
    println!("  DELETE /sessions/{{id}}                   - Drop session");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::with_config(catalog, &ctx.config);
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show catalog summary.
pub fn cmd_status(ctx: &CommandContext) -> Result<(), GrocerError> {
    let catalog = ctx.load_catalog()?;
    let categories = catalog.category_counts();
    let available = catalog.products().iter().filter(|p| p.available).count();

    if ctx.json_mode {
        let output = serde_json::json!({
            "catalog": ctx.catalog_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            "product_count": catalog.len(),
            "available_count": available,
            "category_count": categories.len(),
            "tag_count": catalog.tag_count(),
            "categories": categories,
        });
        print_json(&output);
        return Ok(());
    }

    println!("Grocer Catalog Status");
    println!("=====================");
    match &ctx.catalog_path {
        Some(path) => println!("Catalog: {}", path.display()),
        None => println!("Catalog: (none)"),
    }
    println!();
    println!("Products:   {}", catalog.len());
    println!("Available:  {}", available);
    println!("Categories: {}", categories.len());
    println!("Tags:       {}", catalog.tag_count());

    if ctx.verbose {
        println!();
        println!("By category:");
        for (category, count) in &categories {
            println!("  {:<28} {}", category, count);
        }
    }

    Ok(())
}

// =============================================================================
// RESOLVE COMMAND
// =============================================================================

/// Parse, match and reconcile a shopping list.
pub fn cmd_resolve(
    ctx: &CommandContext,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), GrocerError> {
    let text = match (text, file) {
        (Some(t), _) => t,
        (None, Some(path)) => {
            let canonical = validate_file_path(&path)?;
            validate_file_size(&canonical, MAX_LIST_FILE_SIZE)?;
            std::fs::read_to_string(&canonical)
                .map_err(|e| GrocerError::IoError(format!("Cannot read list: {}", e)))?
        }
        (None, None) => {
            return Err(GrocerError::IoError(
                "Provide a list with --text or --file".to_string(),
            ));
        }
    };

    let mut session = ctx.session()?;
    session.submit_text(&text);

    if ctx.json_mode {
        let response =
            OrderResponse::from_order(session.order()).with_matches(session.last_results());
        print_json(&response);
        return Ok(());
    }

    println!("Matches");
    println!("=======");
    for result in session.last_results() {
        match result {
            MatchResult::Matched {
                product,
                quantity,
                variant_key,
                tier,
            } => println!(
                "  [tier {} {:<8}] {:>4} x {:<32} {}",
                tier.rank(),
                tier.name(),
                quantity,
                product.name,
                variant_key
            ),
            MatchResult::Unmatched { raw_description } => {
                println!("  [unmatched      ]        {}", raw_description);
            }
        }
    }

    let order = session.order();
    println!();
    println!("Order");
    println!("=====");
    for line in order.lines() {
        println!(
            "  {:>4} x {:<32} {:>10}",
            line.quantity,
            line.product.name,
            line.line_total().to_string()
        );
    }
    if !order.unmatched().is_empty() {
        println!();
        println!("Unmatched: {}", order.unmatched().join(", "));
    }
    println!();
    println!("Items: {}", order.item_count());
    println!("Total: {}", order.total());

    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Search the catalog.
pub fn cmd_search(ctx: &CommandContext, query: &str) -> Result<(), GrocerError> {
    let catalog = ctx.load_catalog()?;
    let found = catalog.search(query);
    print_products(ctx, &found);
    Ok(())
}

// =============================================================================
// RECOMMEND COMMAND
// =============================================================================

/// Show products sharing a tag with `product`.
pub fn cmd_recommend(
    ctx: &CommandContext,
    product: &str,
    limit: Option<usize>,
) -> Result<(), GrocerError> {
    let catalog = ctx.load_catalog()?;
    let id = Ingestor::product_id(product)?;
    if catalog.get(&id).is_none() {
        return Err(GrocerError::ProductNotFound(id));
    }

    let limit = limit.unwrap_or(ctx.config.matching.recommendation_limit);
    let related = Recommender::similar_to(&catalog, &id, limit);
    print_products(ctx, &related);
    Ok(())
}

fn print_products(ctx: &CommandContext, products: &[&Product]) {
    if ctx.json_mode {
        print_json(&ProductsResponse::from_products(products));
        return;
    }

    if products.is_empty() {
        println!("No products found");
        return;
    }

    for product in products {
        let json = ProductJson::from(*product);
        let stock = if json.available { "" } else { " (out of stock)" };
        println!(
            "  {:<8} {:<32} {:>10}  {}{}",
            json.id,
            json.name,
            product.price.to_string(),
            json.category,
            stock
        );
        if ctx.verbose && !json.tags.is_empty() {
            println!("           tags: {}", json.tags.join(", "));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grocer_core::ProductId;
    use std::io::Write;

    fn catalog_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"p001","name":"Organic Hass Avocado","price":1.5,"tags":["fruit"]}},
               {{"id":"p002","name":"Whole Wheat Bread","price":"3.25"}}]"#
        )
        .unwrap();
        file
    }

    fn context(path: Option<PathBuf>) -> CommandContext {
        CommandContext {
            config: GrocerConfig::default(),
            catalog_path: path,
            json_mode: true,
            verbose: false,
        }
    }

    #[test]
    fn loads_catalog_file() {
        let file = catalog_file();
        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get(&ProductId::new("p002")).unwrap().price.minor(),
            325
        );
    }

    #[test]
    fn missing_catalog_is_empty() {
        assert!(context(None).load_catalog().unwrap().is_empty());
    }

    #[test]
    fn directory_is_not_a_catalog() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_catalog(dir.path()),
            Err(GrocerError::IoError(_))
        ));
    }

    #[test]
    fn resolve_requires_input() {
        let file = catalog_file();
        let ctx = context(Some(file.path().to_path_buf()));
        assert!(cmd_resolve(&ctx, None, None).is_err());
        assert!(cmd_resolve(&ctx, Some("2 avocados".to_string()), None).is_ok());
    }

    #[test]
    fn recommend_unknown_product_fails() {
        let file = catalog_file();
        let ctx = context(Some(file.path().to_path_buf()));
        assert!(matches!(
            cmd_recommend(&ctx, "p999", None),
            Err(GrocerError::ProductNotFound(_))
        ));
    }
}
