//! # Error Taxonomy
//!
//! Every failure in the engine is one of four kinds:
//!
//! | Kind               | Meaning                                   | Caller action            |
//! |--------------------|-------------------------------------------|--------------------------|
//! | `validation_error` | Field-level input problem                 | Fix the input            |
//! | `graph_error`      | Structural violation found by verification| Restructure the graph    |
//! | `database_error`   | Persistence or connectivity failure       | Retry reads after backoff|
//! | `not_found`        | Referenced node does not exist            | Use an existing id       |
//!
//! The classifier is stateless: `OnionError::kind()` and `OnionError::details()`
//! are pure functions of the error value, and `ErrorReport` is the stable
//! serializable form surfaced to callers.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// ERROR KIND
// =============================================================================

/// Stable machine-readable classification of an `OnionError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    GraphError,
    DatabaseError,
    NotFound,
}

impl ErrorKind {
    /// The wire name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::GraphError => "graph_error",
            Self::DatabaseError => "database_error",
            Self::NotFound => "not_found",
        }
    }

    /// Whether the caller can resolve the failure by changing its request.
    #[must_use]
    pub const fn is_client_fixable(self) -> bool {
        !matches!(self, Self::DatabaseError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors that can occur in the argument graph engine.
///
/// - No silent failures, no substituted fallback payloads
/// - All fallible operations return `Result<T, OnionError>`
/// - None of these are retried internally
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnionError {
    /// Input rejected before any write was attempted.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Structural violation discovered during verification.
    #[error("{message}")]
    Graph {
        message: String,
        details: BTreeMap<String, String>,
    },

    /// The store failed or was unreachable.
    #[error("Database operation '{operation}' failed: {cause}")]
    Database { operation: String, cause: String },

    /// A referenced node does not exist.
    #[error("Node not found: {0}")]
    NotFound(NodeId),
}

impl OnionError {
    /// Build a field-scoped validation error.
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a graph-structure error.
    #[must_use]
    pub fn graph(message: impl Into<String>, details: BTreeMap<String, String>) -> Self {
        Self::Graph {
            message: message.into(),
            details,
        }
    }

    /// Build a persistence error for the named operation.
    #[must_use]
    pub fn database(operation: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            cause: cause.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Graph { .. } => ErrorKind::GraphError,
            Self::Database { .. } => ErrorKind::DatabaseError,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }

    /// Per-kind detail map.
    ///
    /// Validation errors carry `field`; database errors carry `operation`
    /// and `cause`; not-found errors carry `node_id`.
    #[must_use]
    pub fn details(&self) -> BTreeMap<String, String> {
        let mut details = BTreeMap::new();
        match self {
            Self::Validation { field, .. } => {
                details.insert("field".to_string(), field.clone());
            }
            Self::Graph { details: d, .. } => {
                details.extend(d.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Self::Database { operation, cause } => {
                details.insert("operation".to_string(), operation.clone());
                details.insert("cause".to_string(), cause.clone());
            }
            Self::NotFound(id) => {
                details.insert("node_id".to_string(), id.to_string());
            }
        }
        details
    }

    /// The stable report surfaced to callers.
    #[must_use]
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error_type: self.kind(),
            message: self.to_string(),
            details: self.details(),
        }
    }
}

/// Map a storage-layer failure into a `DatabaseError` for `operation`.
pub(crate) fn store_failure<E: std::fmt::Display>(
    operation: &'static str,
) -> impl FnOnce(E) -> OnionError {
    move |e| OnionError::database(operation, e.to_string())
}

// =============================================================================
// ERROR REPORT
// =============================================================================

/// Serializable `{error_type, message, details}` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error_type: ErrorKind,
    pub message: String,
    #[serde(default)]
    pub details: BTreeMap<String, String>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_details_name_field() {
        let err = OnionError::validation("claim", "claim must not be empty");
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert_eq!(err.details().get("field").map(String::as_str), Some("claim"));
        assert_eq!(err.to_string(), "claim must not be empty");
    }

    #[test]
    fn database_details_carry_operation_and_cause() {
        let err = OnionError::database("insert_argument", "disk full");
        let details = err.details();
        assert_eq!(err.kind(), ErrorKind::DatabaseError);
        assert_eq!(
            details.get("operation").map(String::as_str),
            Some("insert_argument")
        );
        assert_eq!(details.get("cause").map(String::as_str), Some("disk full"));
        assert!(!err.kind().is_client_fixable());
    }

    #[test]
    fn not_found_reports_node() {
        let err = OnionError::NotFound(NodeId::new("node-9"));
        let report = err.report();
        assert_eq!(report.error_type, ErrorKind::NotFound);
        assert_eq!(
            report.details.get("node_id").map(String::as_str),
            Some("node-9")
        );
    }

    #[test]
    fn graph_error_keeps_details() {
        let mut details = BTreeMap::new();
        details.insert("cycle".to_string(), "a -> b -> a".to_string());
        let err = OnionError::graph("Cycle detected in argument graph", details);
        assert_eq!(err.kind(), ErrorKind::GraphError);
        assert_eq!(
            err.details().get("cycle").map(String::as_str),
            Some("a -> b -> a")
        );
    }

    #[test]
    fn kind_wire_names() {
        assert_eq!(ErrorKind::ValidationError.as_str(), "validation_error");
        assert_eq!(ErrorKind::GraphError.as_str(), "graph_error");
        assert_eq!(ErrorKind::DatabaseError.as_str(), "database_error");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
    }
}
