//! # Engine Primitives
//!
//! Fixed constants of the engine. Field-length limits here are only the
//! defaults of `EngineConfig`; the effective limits are configuration.

/// Default maximum claim length, in characters.
pub const DEFAULT_MAX_CLAIM_LENGTH: usize = 500;

/// Default maximum grounds length, in characters.
pub const DEFAULT_MAX_GROUNDS_LENGTH: usize = 1000;

/// Default maximum warrant length, in characters.
pub const DEFAULT_MAX_WARRANT_LENGTH: usize = 500;

/// Prefix of store-assigned node identifiers.
pub const NODE_ID_PREFIX: &str = "node-";

/// Prefix of store-assigned edge identifiers.
pub const EDGE_ID_PREFIX: &str = "edge-";

/// Maximum length of a relationship type label accepted from callers.
///
/// Longer labels are rejected outright instead of being echoed back in
/// error details.
pub const MAX_RELATIONSHIP_TYPE_LENGTH: usize = 64;

// =============================================================================
// MESSAGES
// =============================================================================

pub const ARGUMENT_INSERTED_MESSAGE: &str = "Argument successfully inserted.";
pub const RELATIONSHIP_CREATED_MESSAGE: &str = "Relationship successfully created.";
pub const EMPTY_GRAPH_MESSAGE: &str = "No arguments found in database";
pub const GRAPH_VERIFIED_MESSAGE: &str = "Graph structure verified successfully";
pub const ARGUMENT_VERIFIED_MESSAGE: &str = "Argument structure verified successfully";
pub const CYCLE_DETECTED_MESSAGE: &str = "Cycle detected in argument graph";
pub const INVALID_TYPES_MESSAGE: &str = "Invalid relationship types found";
pub const ORPHANED_NODES_MESSAGE: &str = "Orphaned nodes found in argument graph";

/// Format a store-assigned identifier from a counter value.
#[must_use]
pub fn format_id(prefix: &str, counter: u64) -> String {
    format!("{}{:012}", prefix, counter)
}
