//! # Rational Onion CLI Module
//!
//! This module implements the CLI interface for Rational Onion.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `insert` - Insert a Toulmin argument
//! - `relate` - Create a relationship between two nodes
//! - `verify` - Verify the graph or one argument
//! - `visualize` - Export nodes and edges as JSON
//! - `status` - Show graph status
//! - `reset` - Delete every node and edge

mod commands;

use crate::error::AppError;
use crate::settings::Settings;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Rational Onion - Argument Graph Integrity Engine
///
/// Stores Toulmin arguments as a graph and checks it for cycles,
/// disallowed relationships and orphaned claims.
#[derive(Parser, Debug)]
#[command(name = "rational-onion")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging (when RUST_LOG is not set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML settings file (also ONION_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the graph database (overrides settings)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory" (volatile)
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

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
        /// Host to bind to (overrides settings)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides settings)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Insert a Toulmin argument
    Insert {
        /// The central assertion
        #[arg(long)]
        claim: String,

        /// Evidence supporting the claim
        #[arg(long)]
        grounds: String,

        /// Reasoning connecting grounds to claim
        #[arg(long)]
        warrant: String,

        /// Optional counter-argument
        #[arg(long)]
        rebuttal: Option<String>,
    },

    /// Create a relationship between two existing nodes
    Relate {
        /// Source node ID
        #[arg(short, long)]
        source: String,

        /// Target node ID
        #[arg(short, long)]
        target: String,

        /// Relationship type (SUPPORTS, JUSTIFIES, CHALLENGES)
        #[arg(short = 't', long = "type")]
        relationship_type: String,
    },

    /// Verify the whole graph, or one argument
    Verify {
        /// Claim ID of the argument to verify
        #[arg(short, long)]
        argument_id: Option<String>,

        /// Exit with an error when verification fails
        #[arg(long)]
        strict: bool,
    },

    /// Export nodes and edges as JSON
    Visualize {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show graph status
    Status,

    /// Delete every node and edge
    Reset {
        /// Required: confirm the reset
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve settings from the file, the environment and the global flags.
pub fn resolve_settings(cli: &Cli) -> Result<Settings, AppError> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(database) = &cli.database {
        settings.database.clone_from(database);
    }
    if let Some(backend) = &cli.backend {
        settings.backend = backend.parse()?;
    }
    Ok(settings)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let settings = resolve_settings(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(settings, host, port).await,
        Some(Commands::Insert {
            claim,
            grounds,
            warrant,
            rebuttal,
        }) => cmd_insert(&settings, json_mode, claim, grounds, warrant, rebuttal),
        Some(Commands::Relate {
            source,
            target,
            relationship_type,
        }) => cmd_relate(&settings, json_mode, &source, &target, &relationship_type),
        Some(Commands::Verify {
            argument_id,
            strict,
        }) => cmd_verify(&settings, json_mode, argument_id.as_deref(), strict),
        Some(Commands::Visualize { output }) => cmd_visualize(&settings, output.as_deref()),
        Some(Commands::Status) => cmd_status(&settings, json_mode),
        Some(Commands::Reset { force }) => cmd_reset(&settings, json_mode, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&settings, json_mode)
        }
    }
}
