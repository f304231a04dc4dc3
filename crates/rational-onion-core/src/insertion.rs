//! # Insertion Service
//!
//! Validates an argument draft and writes it to any graph store in a
//! single store transaction.

use crate::graph::GraphStore;
use crate::primitives::ARGUMENT_INSERTED_MESSAGE;
use crate::validator::ComponentValidator;
use crate::{ArgumentDraft, EngineConfig, InsertedArgument, NodeId, OnionError};
use serde::{Deserialize, Serialize};

/// Result of a successful insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionOutcome {
    pub argument_id: NodeId,
    pub message: String,
    /// Everything the write created.
    pub record: InsertedArgument,
}

/// The InsertionService creates argument nodes and their structural edges.
#[derive(Debug, Clone, Copy)]
pub struct InsertionService {
    validator: ComponentValidator,
}

impl InsertionService {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            validator: ComponentValidator::new(config),
        }
    }

    /// Insert an argument.
    ///
    /// Validation runs first, so a rejected draft never touches the store.
    /// A store failure surfaces as `OnionError::Database` and is not retried.
    pub fn insert(
        &self,
        store: &mut dyn GraphStore,
        draft: &ArgumentDraft,
    ) -> Result<InsertionOutcome, OnionError> {
        if let Err(e) = self.validator.validate(draft) {
            tracing::debug!(error = %e, "argument rejected");
            return Err(e);
        }

        let record = store.insert_argument(draft).inspect_err(|e| {
            tracing::error!(error = %e, "argument insertion failed");
        })?;

        tracing::info!(
            argument_id = %record.argument_id,
            edges = record.edges.len(),
            has_rebuttal = record.rebuttal_id.is_some(),
            "argument inserted"
        );

        Ok(InsertionOutcome {
            argument_id: record.argument_id.clone(),
            message: ARGUMENT_INSERTED_MESSAGE.to_string(),
            record,
        })
    }
}
