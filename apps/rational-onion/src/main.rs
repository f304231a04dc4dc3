//! # Rational Onion - Argument Graph Integrity Engine
//!
//! The main binary for Rational Onion.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for argument graph operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              apps/rational-onion (THE BINARY)        │
//! │                                                      │
//! │   ┌─────────────┐          ┌──────────────────────┐  │
//! │   │   CLI       │          │   HTTP API (axum)    │  │
//! │   │  (clap)     │          │   + store pool       │  │
//! │   └──────┬──────┘          └──────────┬───────────┘  │
//! │          └──────────────┬─────────────┘              │
//! │                         ▼                            │
//! │               ┌─────────────────────┐                │
//! │               │ rational-onion-core │                │
//! │               │   (THE ENGINE)      │                │
//! │               └─────────────────────┘                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! rational-onion server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! rational-onion insert --claim "Main" --grounds "G1" --warrant "W1"
//! rational-onion relate -s node-4 -t node-1 --type SUPPORTS
//! rational-onion verify --strict
//! ```

use clap::Parser;
use rational_onion::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing. ONION_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ONION_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "rational_onion=debug,rational_onion_core=debug,tower_http=debug"
    } else {
        "rational_onion=info,rational_onion_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Rational Onion startup banner.
fn print_banner() {
    println!(
        r#"
   ___       _   _                   _    ___       _
  | _ \__ _ | |_(_)___ _ _  __ _ ___| |  / _ \ _ _ (_)___ _ _
  |   / _` ||  _| / _ \ ' \/ _` |___| | | (_) | ' \| / _ \ ' \
  |_|_\__,_| \__|_\___/_||_\__,_|   |_|  \___/|_||_|_\___/_||_|

  Argument Graph Integrity Engine v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
