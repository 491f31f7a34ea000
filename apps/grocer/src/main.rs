//! # Grocer - Order Matching Server
//!
//! The main binary for the Grocer order-matching engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based), one order per session id
//! - CLI interface for resolving shopping lists against a catalog
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │             apps/grocer (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐        ┌─────────────┐      │
//! │   │   CLI       │        │   HTTP API  │      │
//! │   │  (clap)     │        │   (axum)    │      │
//! │   └──────┬──────┘        └──────┬──────┘      │
//! │          └───────────┬──────────┘             │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  grocer-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! grocer --catalog demos/catalog.json server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! grocer --catalog demos/catalog.json status
//! grocer --catalog demos/catalog.json resolve --text "2 avocados"
//! grocer --catalog demos/catalog.json recommend --product p001
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    // GROCER_LOG_FORMAT=json switches logs to machine-parseable output.
    let log_format = std::env::var("GROCER_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "grocer=info,grocer_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Grocer startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗ ██████╗  ██████╗  ██████╗███████╗██████╗
  ██╔════╝ ██╔══██╗██╔═══██╗██╔════╝██╔════╝██╔══██╗
  ██║  ███╗██████╔╝██║   ██║██║     █████╗  ██████╔╝
  ██║   ██║██╔══██╗██║   ██║██║     ██╔══╝  ██╔══██╗
  ╚██████╔╝██║  ██║╚██████╔╝╚██████╗███████╗██║  ██║
   ╚═════╝ ╚═╝  ╚═╝ ╚═════╝  ╚═════╝╚══════╝╚═╝  ╚═╝

  Order Matching Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
