//! # Component Validator
//!
//! Field checks for an argument draft. Runs before any store access.
//!
//! - Claim, grounds and warrant must be non-empty
//! - Each is bounded by its configured maximum (counted in characters)
//! - Fields are checked in order claim → grounds → warrant; the first
//!   offending field wins
//! - The rebuttal is optional and unconstrained

use crate::{ArgumentDraft, EngineConfig, OnionError};

/// Validates argument drafts against configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentValidator {
    max_claim_length: usize,
    max_grounds_length: usize,
    max_warrant_length: usize,
}

impl ComponentValidator {
    /// Build a validator from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_claim_length: config.max_claim_length,
            max_grounds_length: config.max_grounds_length,
            max_warrant_length: config.max_warrant_length,
        }
    }

    /// Validate a draft. Returns the first field-scoped failure.
    pub fn validate(&self, draft: &ArgumentDraft) -> Result<(), OnionError> {
        let fields = [
            ("claim", draft.claim.as_str(), self.max_claim_length),
            ("grounds", draft.grounds.as_str(), self.max_grounds_length),
            ("warrant", draft.warrant.as_str(), self.max_warrant_length),
        ];

        for (field, value, max) in fields {
            Self::check_field(field, value, max)?;
        }

        Ok(())
    }

    fn check_field(field: &'static str, value: &str, max: usize) -> Result<(), OnionError> {
        if value.is_empty() {
            return Err(OnionError::validation(
                field,
                format!("{} must not be empty", field),
            ));
        }

        let length = value.chars().count();
        if length > max {
            return Err(OnionError::validation(
                field,
                format!(
                    "{} exceeds maximum length of {} characters (got {})",
                    field, max, length
                ),
            ));
        }

        Ok(())
    }
}
