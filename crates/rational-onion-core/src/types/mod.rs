//! # Core Type Definitions
//!
//! This module contains the data model of the argument graph:
//! - Opaque identifiers (`NodeId`, `EdgeId`)
//! - Node classification (`NodeKind`) and stored nodes (`ArgumentNode`)
//! - Relationship labels (`RelationshipType`) and stored edges (`Relationship`)
//! - Insertion input and output (`ArgumentDraft`, `InsertedArgument`)
//!
//! ## Identifier Guarantees
//!
//! Identifiers are assigned by the store and must be treated as opaque
//! strings. Nothing in the engine parses them or relies on their ordering
//! beyond using them as `BTreeMap` keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque identifier of a node in the argument graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier is empty or whitespace only.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque identifier of a relationship (edge).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// NODE KIND
// =============================================================================

/// The Toulmin role a node plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// The central assertion of an argument.
    Claim,
    /// Evidence supporting a claim.
    Grounds,
    /// Reasoning connecting grounds to a claim.
    Warrant,
    /// A counter-argument or exception.
    Rebuttal,
}

impl NodeKind {
    /// The label used in visualization payloads and CLI output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Claim => "Claim",
            Self::Grounds => "Grounds",
            Self::Warrant => "Warrant",
            Self::Rebuttal => "Rebuttal",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// RELATIONSHIP TYPE
// =============================================================================

/// Label of a directed relationship.
///
/// The closed set of known labels is modelled as variants. Any other label
/// that reaches the store is preserved verbatim in `Other` so that the
/// verifier can report it instead of losing it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipType {
    Supports,
    Justifies,
    Challenges,
    HasGround,
    HasWarrant,
    Cites,
    Other(String),
}

impl RelationshipType {
    /// Parse a label. Matching is exact; unknown labels become `Other`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label {
            "SUPPORTS" => Self::Supports,
            "JUSTIFIES" => Self::Justifies,
            "CHALLENGES" => Self::Challenges,
            "HAS_GROUND" => Self::HasGround,
            "HAS_WARRANT" => Self::HasWarrant,
            "CITES" => Self::Cites,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire label of this relationship type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Supports => "SUPPORTS",
            Self::Justifies => "JUSTIFIES",
            Self::Challenges => "CHALLENGES",
            Self::HasGround => "HAS_GROUND",
            Self::HasWarrant => "HAS_WARRANT",
            Self::Cites => "CITES",
            Self::Other(label) => label,
        }
    }

    /// Argumentative edges are the only ones considered by cycle and orphan checks.
    #[must_use]
    pub fn is_argumentative(&self) -> bool {
        matches!(self, Self::Supports | Self::Justifies)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for RelationshipType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RelationshipType> for String {
    fn from(t: RelationshipType) -> Self {
        t.as_str().to_string()
    }
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// A node as persisted by the store. Nodes are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ArgumentNode {
    /// Create a node record stamped with the current time.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// A directed, typed edge as persisted by the store. Edges are immutable
/// and parallel duplicates are kept as distinct records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relationship_type: RelationshipType,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Create an edge record stamped with the current time.
    #[must_use]
    pub fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            id,
            source,
            target,
            relationship_type,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// INSERTION INPUT / OUTPUT
// =============================================================================

/// The text of a Toulmin argument before it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDraft {
    pub claim: String,
    pub grounds: String,
    pub warrant: String,
    #[serde(default)]
    pub rebuttal: Option<String>,
}

impl ArgumentDraft {
    /// Create a draft without a rebuttal.
    #[must_use]
    pub fn new(
        claim: impl Into<String>,
        grounds: impl Into<String>,
        warrant: impl Into<String>,
    ) -> Self {
        Self {
            claim: claim.into(),
            grounds: grounds.into(),
            warrant: warrant.into(),
            rebuttal: None,
        }
    }

    /// Attach a rebuttal.
    #[must_use]
    pub fn with_rebuttal(mut self, rebuttal: impl Into<String>) -> Self {
        self.rebuttal = Some(rebuttal.into());
        self
    }
}

/// Identifiers of everything a single argument insertion wrote.
///
/// The claim node id is the argument id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedArgument {
    pub argument_id: NodeId,
    pub grounds_id: NodeId,
    pub warrant_id: NodeId,
    pub rebuttal_id: Option<NodeId>,
    pub edges: Vec<EdgeId>,
}

/// The edge a satellite component gets towards its claim.
///
/// Grounds support the claim, the warrant justifies it, a rebuttal challenges it.
#[must_use]
pub const fn component_link(kind: NodeKind) -> Option<RelationshipType> {
    match kind {
        NodeKind::Grounds => Some(RelationshipType::Supports),
        NodeKind::Warrant => Some(RelationshipType::Justifies),
        NodeKind::Rebuttal => Some(RelationshipType::Challenges),
        NodeKind::Claim => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_type_parse_is_exact() {
        assert_eq!(RelationshipType::parse("SUPPORTS"), RelationshipType::Supports);
        assert_eq!(
            RelationshipType::parse("supports"),
            RelationshipType::Other("supports".to_string())
        );
        assert_eq!(RelationshipType::parse("CITES"), RelationshipType::Cites);
    }

    #[test]
    fn relationship_type_classification() {
        assert!(RelationshipType::Supports.is_argumentative());
        assert!(RelationshipType::Justifies.is_argumentative());
        assert!(!RelationshipType::Challenges.is_argumentative());
        assert!(!RelationshipType::HasGround.is_argumentative());
    }

    #[test]
    fn relationship_type_label_conversion() {
        assert_eq!(String::from(RelationshipType::HasWarrant), "HAS_WARRANT");
        let unknown = RelationshipType::Other("INVALID_TYPE".into());
        assert_eq!(String::from(unknown.clone()), "INVALID_TYPE");
        assert_eq!(RelationshipType::from("INVALID_TYPE".to_string()), unknown);
    }

    #[test]
    fn blank_node_id() {
        assert!(NodeId::new("   ").is_blank());
        assert!(!NodeId::new("node-1").is_blank());
    }

    #[test]
    fn component_links() {
        assert_eq!(
            component_link(NodeKind::Grounds),
            Some(RelationshipType::Supports)
        );
        assert_eq!(
            component_link(NodeKind::Rebuttal),
            Some(RelationshipType::Challenges)
        );
        assert_eq!(component_link(NodeKind::Claim), None);
    }
}
