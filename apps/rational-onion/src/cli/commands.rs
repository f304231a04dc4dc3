//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//! Every command opens the configured store, runs one engine operation
//! and prints the result as text or, with `--json-mode`, as JSON.

use crate::api;
use crate::error::AppError;
use crate::settings::{Backend, Settings};
use rational_onion_core::{ArgumentDraft, NodeId, Session, VerificationReport};
use serde::Serialize;
use std::path::Path;

// =============================================================================
// HELPERS
// =============================================================================

/// Open the session described by `settings`.
pub fn open_session(settings: &Settings) -> Result<Session, AppError> {
    let engine = settings.engine.clone();
    let session = match settings.backend {
        Backend::Memory => Session::with_config(engine)?,
        Backend::Redb => Session::with_redb(&settings.database, engine)?,
    };
    tracing::debug!(
        backend = %settings.backend,
        database = %settings.database.display(),
        "session opened"
    );
    Ok(session)
}

fn to_json(value: &impl Serialize) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Io(format!("JSON encoding failed: {}", e)))
}

fn print_json(value: &impl Serialize) -> Result<(), AppError> {
    println!("{}", to_json(value)?);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    mut settings: Settings,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    if let Some(host) = host {
        settings.host = host;
    }
    if let Some(port) = port {
        settings.port = port;
    }
    let session = open_session(&settings)?;

    println!("Rational Onion Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", settings.host);
    println!("  Port:       {}", settings.port);
    println!("  Backend:    {}", settings.backend);
    println!("  Database:   {:?}", settings.database);
    println!("  Rate limit: {}", settings.rate_limit);
    println!("  Pool size:  {}", settings.pool_size);
    println!();
    println!("Endpoints:");
    println!("  POST /insert-argument          - Insert an argument");
    println!("  POST /create-relationship      - Link two nodes");
    println!("  GET  /verify-argument-structure - Verify the whole graph");
    println!("  POST /verify-argument-structure - Verify one argument");
    println!("  GET  /visualize-argument-dag   - Export nodes and edges");
    println!("  GET  /status                   - Get graph status");
    println!("  GET  /health                   - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(settings, session).await
}

// =============================================================================
// INSERT / RELATE COMMANDS
// =============================================================================

/// Insert a Toulmin argument.
pub fn cmd_insert(
    settings: &Settings,
    json_mode: bool,
    claim: String,
    grounds: String,
    warrant: String,
    rebuttal: Option<String>,
) -> Result<(), AppError> {
    let mut session = open_session(settings)?;
    let draft = ArgumentDraft {
        claim,
        grounds,
        warrant,
        rebuttal,
    };
    let outcome = session.insert_argument(&draft)?;

    if json_mode {
        return print_json(&api::InsertArgumentResponse::new(outcome, draft));
    }

    println!("{}", outcome.message);
    println!("  Argument ID: {}", outcome.argument_id);
    println!("  Grounds ID:  {}", outcome.record.grounds_id);
    println!("  Warrant ID:  {}", outcome.record.warrant_id);
    if let Some(rebuttal_id) = &outcome.record.rebuttal_id {
        println!("  Rebuttal ID: {}", rebuttal_id);
    }
    Ok(())
}

/// Create a relationship between two existing nodes.
pub fn cmd_relate(
    settings: &Settings,
    json_mode: bool,
    source: &str,
    target: &str,
    relationship_type: &str,
) -> Result<(), AppError> {
    let mut session = open_session(settings)?;
    let outcome = session.create_relationship(
        &NodeId::new(source),
        &NodeId::new(target),
        relationship_type,
    )?;

    if json_mode {
        return print_json(&api::CreateRelationshipResponse {
            message: outcome.message,
            relationship_id: outcome.relationship_id,
        });
    }

    println!("{}", outcome.message);
    println!("  Relationship ID: {}", outcome.relationship_id);
    Ok(())
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

fn print_report(report: &VerificationReport) {
    println!("Argument Structure Verification");
    println!("===============================");
    if let Some(argument_id) = &report.argument_id {
        println!("Argument: {}", argument_id);
    }
    println!("Status:   {:?}", report.status);
    println!("Valid:    {}", report.is_valid);
    println!("Message:  {}", report.message);
    println!("Cycles:   {}", report.has_cycles);

    if !report.cycle.is_empty() {
        let path: Vec<&str> = report.cycle.iter().map(NodeId::as_str).collect();
        println!("  {}", path.join(" -> "));
    }
    if !report.invalid_relationships.is_empty() {
        println!("Invalid relationships:");
        for rel in &report.invalid_relationships {
            println!(
                "  {} {} -[{}]-> {}",
                rel.id, rel.source, rel.relationship_type, rel.target
            );
        }
    }
    if !report.orphaned_nodes.is_empty() {
        println!("Orphaned claims:");
        for orphan in &report.orphaned_nodes {
            println!("  {} {:?}", orphan.id, orphan.text);
        }
    }
}

/// Verify the graph, or the argument rooted at `argument_id`.
///
/// With `strict`, a failed verification is returned as a `GraphError`
/// after the report has been printed.
pub fn cmd_verify(
    settings: &Settings,
    json_mode: bool,
    argument_id: Option<&str>,
    strict: bool,
) -> Result<(), AppError> {
    let session = open_session(settings)?;
    let argument_id = argument_id.map(NodeId::new);
    let report = session.verify_structure(argument_id.as_ref())?;

    if json_mode {
        print_json(&report)?;
    } else {
        print_report(&report);
    }

    if strict {
        report.into_result()?;
    }
    Ok(())
}

// =============================================================================
// VISUALIZE COMMAND
// =============================================================================

/// Export nodes and edges as JSON, to stdout or a file.
pub fn cmd_visualize(settings: &Settings, output: Option<&Path>) -> Result<(), AppError> {
    let session = open_session(settings)?;
    let view = session.visualize()?;
    let json = to_json(&view)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).map_err(|e| {
                AppError::Io(format!("Cannot write '{}': {}", path.display(), e))
            })?;
            println!(
                "Wrote {} nodes and {} edges to {:?}",
                view.nodes.len(),
                view.edges.len(),
                path
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph status.
pub fn cmd_status(settings: &Settings, json_mode: bool) -> Result<(), AppError> {
    let session = open_session(settings)?;
    let node_count = session.node_count()?;
    let edge_count = session.edge_count()?;

    if json_mode {
        return print_json(&serde_json::json!({
            "database": settings.database.to_string_lossy(),
            "backend": settings.backend.to_string(),
            "node_count": node_count,
            "edge_count": edge_count,
        }));
    }

    println!("Rational Onion Graph Status");
    println!("===========================");
    println!("Database: {:?}", settings.database);
    println!("Backend:  {}", settings.backend);
    println!();
    println!("Nodes: {}", node_count);
    println!("Edges: {}", edge_count);
    Ok(())
}

// =============================================================================
// RESET COMMAND
// =============================================================================

/// Delete every node and edge. Refuses without `force`.
pub fn cmd_reset(settings: &Settings, json_mode: bool, force: bool) -> Result<(), AppError> {
    if !force {
        return Err(AppError::Refused(
            "Reset deletes every argument. Use --force to confirm.".to_string(),
        ));
    }

    let mut session = open_session(settings)?;
    let nodes = session.node_count()?;
    let edges = session.edge_count()?;
    session.reset()?;

    if json_mode {
        return print_json(&serde_json::json!({
            "reset": true,
            "nodes_deleted": nodes,
            "edges_deleted": edges,
        }));
    }

    println!("Deleted {} nodes and {} edges.", nodes, edges);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
