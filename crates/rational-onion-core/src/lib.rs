//! # rational-onion-core
//!
//! The Argument Graph Integrity Engine for Rational Onion.
//!
//! Arguments follow the Toulmin model: a claim, the grounds supporting it,
//! the warrant justifying it and an optional rebuttal challenging it. Each
//! component is a node; grounds, warrant and rebuttal are linked to their
//! claim by `SUPPORTS`, `JUSTIFIES` and `CHALLENGES` edges. Claims can then be
//! linked to each other with typed relationships.
//!
//! The engine guarantees:
//! - Validation always runs before any store write
//! - An argument and its structural edges are written in one transaction
//! - Verification is read-only and reports cycles, disallowed edge types
//!   and orphaned claims, in that order
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - Deterministic traversal order (BTreeMap only)
//! - Identifiers are opaque strings assigned by the store

// =============================================================================
// MODULES
// =============================================================================

pub mod config;
pub mod error;
pub mod graph;
pub mod insertion;
pub mod primitives;
pub mod relationship;
pub mod session;
pub mod storage;
pub mod types;
pub mod validator;
pub mod verifier;
pub mod visualize;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use config::EngineConfig;
pub use error::{ErrorKind, ErrorReport, OnionError};
pub use types::{
    ArgumentDraft, ArgumentNode, EdgeId, InsertedArgument, NodeId, NodeKind, Relationship,
    RelationshipType,
};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use graph::{Graph, GraphSnapshot, GraphStore};
pub use insertion::{InsertionOutcome, InsertionService};
pub use relationship::{RelationshipOutcome, RelationshipService};
pub use session::{Session, StorageBackend};
pub use storage::RedbGraph;
pub use validator::ComponentValidator;
pub use verifier::{
    InvalidRelationship, OrphanedNode, StructuralVerifier, VerificationReport, VerificationStatus,
};
pub use visualize::{GraphView, ViewEdge, ViewNode};
