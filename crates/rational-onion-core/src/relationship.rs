//! # Relationship Service
//!
//! Creates typed, directed edges between existing nodes.
//!
//! Checks run in a fixed order, each failing with a field-scoped
//! validation error:
//! 1. the type label is in the configured allow-list (`relationship_type`)
//! 2. neither endpoint id is blank (`source_id` / `target_id`)
//! 3. both endpoints exist (`source_id/target_id`)
//! 4. the edge is not a self-loop
//!
//! Identical requests create parallel edges; nothing is deduplicated.

use crate::graph::GraphStore;
use crate::primitives::{MAX_RELATIONSHIP_TYPE_LENGTH, RELATIONSHIP_CREATED_MESSAGE};
use crate::{EdgeId, EngineConfig, NodeId, OnionError, RelationshipType};
use serde::{Deserialize, Serialize};

/// Result of a successful relationship creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipOutcome {
    pub relationship_id: EdgeId,
    pub message: String,
}

/// The RelationshipService validates and persists edges.
#[derive(Debug, Clone)]
pub struct RelationshipService {
    allowed: Vec<RelationshipType>,
}

impl RelationshipService {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            allowed: config.relationship_types.clone(),
        }
    }

    /// Resolve a caller-supplied label against the allow-list.
    pub fn resolve_type(&self, label: &str) -> Result<RelationshipType, OnionError> {
        if label.chars().count() > MAX_RELATIONSHIP_TYPE_LENGTH {
            return Err(OnionError::validation(
                "relationship_type",
                format!(
                    "Invalid relationship type: label exceeds {} characters",
                    MAX_RELATIONSHIP_TYPE_LENGTH
                ),
            ));
        }

        let relationship_type = RelationshipType::parse(label);
        if !self.allowed.contains(&relationship_type) {
            let allowed = self
                .allowed
                .iter()
                .map(RelationshipType::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(OnionError::validation(
                "relationship_type",
                format!(
                    "Invalid relationship type: {}. Must be one of: {}",
                    label, allowed
                ),
            ));
        }

        Ok(relationship_type)
    }

    /// Create an edge `source -[label]-> target`.
    pub fn create(
        &self,
        store: &mut dyn GraphStore,
        source: &NodeId,
        target: &NodeId,
        label: &str,
    ) -> Result<RelationshipOutcome, OnionError> {
        let relationship_type = self.resolve_type(label).inspect_err(|e| {
            tracing::debug!(error = %e, "relationship rejected");
        })?;

        for (field, id) in [("source_id", source), ("target_id", target)] {
            if id.is_blank() {
                return Err(OnionError::validation(
                    field,
                    format!("{} is required", field),
                ));
            }
        }

        for id in [source, target] {
            if !store.contains_node(id)? {
                tracing::debug!(node_id = %id, "relationship endpoint missing");
                return Err(OnionError::validation(
                    "source_id/target_id",
                    format!("Node not found: {}", id),
                ));
            }
        }

        if source == target {
            return Err(OnionError::validation(
                "source_id/target_id",
                "Self-referential relationships are not allowed",
            ));
        }

        // Endpoints are re-checked inside the store write; a node removed by
        // a concurrent reset surfaces as NotFound rather than a dangling edge.
        let relationship_id = store.insert_edge(source, target, relationship_type.clone())?;

        tracing::info!(
            relationship_id = %relationship_id,
            source = %source,
            target = %target,
            relationship_type = %relationship_type,
            "relationship created"
        );

        Ok(RelationshipOutcome {
            relationship_id,
            message: RELATIONSHIP_CREATED_MESSAGE.to_string(),
        })
    }
}
