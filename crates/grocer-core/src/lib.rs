//! # grocer-core
//!
//! The deterministic order-resolution engine for Grocer.
//!
//! This crate turns free-text grocery orders into a reconciled cart:
//! - `catalog`: immutable, queryable index over one catalog snapshot
//! - `parser`: free text and structured extraction → requested items
//! - `matcher`: tiered resolution of requested items to products
//! - `reconciler`: replace/merge semantics over order state
//!
//! ## Architectural Constraints
//!
//! - No async, no network, no storage: pure functions over owned values
//! - Integer money only; no floating point anywhere in the engine
//! - Every lookup returns candidates in catalog order, so the same catalog
//!   and the same input always produce the same order

// =============================================================================
// MODULES
// =============================================================================

pub mod catalog;
pub mod ingestor;
pub mod matcher;
pub mod normalize;
pub mod order;
pub mod parser;
pub mod primitives;
pub mod recommend;
pub mod reconciler;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{GrocerError, Price, Product, ProductId, VariantKey};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use catalog::CatalogIndex;
pub use ingestor::Ingestor;
pub use matcher::{MatchOptions, MatchResult, MatchTier, Matcher, match_items};
pub use order::{Order, OrderLine, OrderSnapshot, SnapshotLine};
pub use parser::{
    ExtractedItem, ExtractedQuantity, LineParser, RequestedItem, RequestedItemIter,
    RequestedItems,
};
pub use recommend::Recommender;
pub use reconciler::{ReconcileMode, Reconciler};
pub use session::Session;
