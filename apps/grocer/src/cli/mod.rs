//! # Grocer CLI Module
//!
//! This module implements the CLI interface for Grocer.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show catalog summary
//! - `resolve` - Match a shopping list against the catalog
//! - `search` - Search the catalog
//! - `recommend` - Show products related to a product

mod commands;

use clap::{Parser, Subcommand};
use grocer::config::GrocerConfig;
use grocer_core::GrocerError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Grocer - Order Matching Server
///
/// Resolves free-text grocery lists against a product catalog and keeps a
/// reconciled order per shopper session.
#[derive(Parser, Debug)]
#[command(name = "grocer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the JSON product catalog (overrides `[catalog] path`)
    #[arg(short = 'C', long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides `[server] host`)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides `[server] port`)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show catalog summary
    Status,

    /// Match a shopping list against the catalog
    Resolve {
        /// Inline shopping list; use newlines to separate items
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// File holding the shopping list, one item per line
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Search the catalog by name, description, category or tag
    Search {
        /// Search text; empty lists every product
        #[arg(default_value = "")]
        query: String,
    },

    /// Show products related to a product
    Recommend {
        /// Product id to anchor on
        #[arg(short, long)]
        product: String,

        /// Maximum number of suggestions (overrides `[matching] recommendation_limit`)
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GrocerError> {
    let config = GrocerConfig::load_or_default(cli.config.as_deref())?;
    let ctx = CommandContext {
        catalog_path: cli.catalog.or_else(|| config.catalog.path.clone()),
        config,
        json_mode: cli.json_mode,
        verbose: cli.verbose,
    };

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&ctx, host, port).await,
        Some(Commands::Status) => cmd_status(&ctx),
        Some(Commands::Resolve { text, file }) => cmd_resolve(&ctx, text, file),
        Some(Commands::Search { query }) => cmd_search(&ctx, &query),
        Some(Commands::Recommend { product, limit }) => cmd_recommend(&ctx, &product, limit),
        None => {
            // No subcommand - show status by default
            cmd_status(&ctx)
        }
    }
}
