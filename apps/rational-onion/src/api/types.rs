//! # API Types
//!
//! Request and response bodies for the HTTP API. Verification reports and
//! graph views are served as the engine's own serializable types.

use rational_onion_core::{ArgumentDraft, EdgeId, InsertionOutcome, NodeId};
use serde::{Deserialize, Serialize};

// =============================================================================
// INSERT ARGUMENT
// =============================================================================

/// Request to insert a Toulmin argument.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsertArgumentRequest {
    pub claim: String,
    pub grounds: String,
    pub warrant: String,
    #[serde(default)]
    pub rebuttal: Option<String>,
}

impl From<InsertArgumentRequest> for ArgumentDraft {
    fn from(req: InsertArgumentRequest) -> Self {
        Self {
            claim: req.claim,
            grounds: req.grounds,
            warrant: req.warrant,
            rebuttal: req.rebuttal,
        }
    }
}

/// Response after inserting an argument. Echoes the stored components.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsertArgumentResponse {
    pub message: String,
    pub argument_id: NodeId,
    pub claim: String,
    pub grounds: String,
    pub warrant: String,
    pub rebuttal: Option<String>,
}

impl InsertArgumentResponse {
    /// Build the echo from the outcome and the draft that produced it.
    #[must_use]
    pub fn new(outcome: InsertionOutcome, draft: ArgumentDraft) -> Self {
        Self {
            message: outcome.message,
            argument_id: outcome.argument_id,
            claim: draft.claim,
            grounds: draft.grounds,
            warrant: draft.warrant,
            rebuttal: draft.rebuttal,
        }
    }
}

// =============================================================================
// CREATE RELATIONSHIP
// =============================================================================

/// Request to link two existing nodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateRelationshipRequest {
    /// Missing ids deserialize as blank and are rejected by field name.
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub target_id: String,
    pub relationship_type: String,
}

/// Response after creating a relationship.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateRelationshipResponse {
    pub message: String,
    pub relationship_id: EdgeId,
}

// =============================================================================
// VERIFY
// =============================================================================

/// Body of `POST /verify-argument-structure`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub argument_id: Option<String>,
}

/// Query parameters shared by both verification routes.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct VerifyParams {
    /// Answer a failed verification with a `graph_error` instead of a report.
    #[serde(default)]
    pub strict: bool,
}

// =============================================================================
// SERVICE
// =============================================================================

/// Response for `GET /`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Response for `GET /health`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Response for `GET /status`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatusResponse {
    pub backend: String,
    pub persistent: bool,
    pub node_count: usize,
    pub edge_count: usize,
    pub pool_size: usize,
    pub auth_enabled: bool,
}
