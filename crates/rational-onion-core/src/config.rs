//! # Engine Configuration
//!
//! An immutable configuration object handed to the validator, the
//! relationship service and the verifier at construction time.

use crate::primitives::{
    DEFAULT_MAX_CLAIM_LENGTH, DEFAULT_MAX_GROUNDS_LENGTH, DEFAULT_MAX_WARRANT_LENGTH,
};
use crate::{OnionError, RelationshipType};
use serde::{Deserialize, Serialize};

/// Engine settings.
///
/// Deserializes with defaults for any missing key, so a partial TOML
/// `[engine]` table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum claim length in characters.
    pub max_claim_length: usize,
    /// Maximum grounds length in characters.
    pub max_grounds_length: usize,
    /// Maximum warrant length in characters.
    pub max_warrant_length: usize,
    /// Types the relationship service accepts from callers.
    pub relationship_types: Vec<RelationshipType>,
    /// Types allowed on edges leaving a claim during global verification.
    pub global_allowed_types: Vec<RelationshipType>,
    /// Types allowed on edges leaving a claim during per-argument verification.
    pub scoped_allowed_types: Vec<RelationshipType>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_claim_length: DEFAULT_MAX_CLAIM_LENGTH,
            max_grounds_length: DEFAULT_MAX_GROUNDS_LENGTH,
            max_warrant_length: DEFAULT_MAX_WARRANT_LENGTH,
            relationship_types: vec![
                RelationshipType::Supports,
                RelationshipType::Challenges,
                RelationshipType::Justifies,
            ],
            global_allowed_types: vec![RelationshipType::Supports, RelationshipType::Justifies],
            scoped_allowed_types: vec![
                RelationshipType::Supports,
                RelationshipType::Justifies,
                RelationshipType::Challenges,
            ],
        }
    }
}

impl EngineConfig {
    /// Check that every limit is positive and every allow-list is non-empty.
    pub fn validate(&self) -> Result<(), OnionError> {
        let limits = [
            ("max_claim_length", self.max_claim_length),
            ("max_grounds_length", self.max_grounds_length),
            ("max_warrant_length", self.max_warrant_length),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(OnionError::validation(
                    key,
                    format!("{} must be a positive integer", key),
                ));
            }
        }

        let lists = [
            ("relationship_types", &self.relationship_types),
            ("global_allowed_types", &self.global_allowed_types),
            ("scoped_allowed_types", &self.scoped_allowed_types),
        ];
        for (key, list) in lists {
            if list.is_empty() {
                return Err(OnionError::validation(
                    key,
                    format!("{} must not be empty", key),
                ));
            }
        }

        Ok(())
    }
}
