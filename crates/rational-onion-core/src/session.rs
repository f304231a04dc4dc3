//! # Session Module
//!
//! The engine facade: one storage backend plus the services configured
//! from a single `EngineConfig`.
//!
//! ## Storage Backends
//!
//! - `InMemory`: uses the in-memory `Graph` (fast, volatile)
//! - `Persistent`: uses `RedbGraph` for disk-backed ACID storage
//!
//! A Session holds no per-request state. Every operation reads or writes
//! through the backend and returns.

use crate::graph::{Graph, GraphStore};
use crate::insertion::{InsertionOutcome, InsertionService};
use crate::relationship::{RelationshipOutcome, RelationshipService};
use crate::storage::RedbGraph;
use crate::verifier::{StructuralVerifier, VerificationReport};
use crate::visualize::GraphView;
use crate::{ArgumentDraft, EngineConfig, NodeId, OnionError};
use std::path::Path;

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory graph (fast, volatile).
    InMemory(Graph),
    /// Disk-backed graph using redb (ACID, persistent).
    Persistent(RedbGraph),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(Graph::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn GraphStore {
        match self {
            Self::InMemory(graph) => graph,
            Self::Persistent(redb) => redb,
        }
    }

    fn store_mut(&mut self) -> &mut dyn GraphStore {
        match self {
            Self::InMemory(graph) => graph,
            Self::Persistent(redb) => redb,
        }
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbGraph holds the database handle.

/// A Session binds a storage backend to the configured engine services.
#[derive(Debug)]
pub struct Session {
    backend: StorageBackend,
    config: EngineConfig,
    insertion: InsertionService,
    relationships: RelationshipService,
    verifier: StructuralVerifier,
}

impl Default for Session {
    fn default() -> Self {
        Self::build(StorageBackend::default(), EngineConfig::default())
    }
}

impl Session {
    /// Create a new empty session with in-memory storage and default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory session with the given configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, OnionError> {
        config.validate()?;
        Ok(Self::build(StorageBackend::default(), config))
    }

    /// Create a session with an existing in-memory graph.
    #[must_use]
    pub fn with_graph(graph: Graph) -> Self {
        Self::build(StorageBackend::InMemory(graph), EngineConfig::default())
    }

    /// Create a session with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self, OnionError> {
        config.validate()?;
        let redb = RedbGraph::open(path)?;
        Ok(Self::build(StorageBackend::Persistent(redb), config))
    }

    fn build(backend: StorageBackend, config: EngineConfig) -> Self {
        Self {
            insertion: InsertionService::new(&config),
            relationships: RelationshipService::new(&config),
            verifier: StructuralVerifier::new(&config),
            backend,
            config,
        }
    }

    /// Check if this session uses persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The configuration the services were built from.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // =========================================================================
    // ENGINE OPERATIONS
    // =========================================================================

    /// Validate and insert a Toulmin argument.
    pub fn insert_argument(
        &mut self,
        draft: &ArgumentDraft,
    ) -> Result<InsertionOutcome, OnionError> {
        self.insertion.insert(self.backend.store_mut(), draft)
    }

    /// Validate and create a relationship between two existing nodes.
    pub fn create_relationship(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: &str,
    ) -> Result<RelationshipOutcome, OnionError> {
        self.relationships
            .create(self.backend.store_mut(), source, target, relationship_type)
    }

    /// Verify the whole graph, or the argument rooted at `argument_id`.
    pub fn verify_structure(
        &self,
        argument_id: Option<&NodeId>,
    ) -> Result<VerificationReport, OnionError> {
        let snapshot = self.backend.store().snapshot()?;
        self.verifier.verify(&snapshot, argument_id)
    }

    /// Export the current graph for rendering.
    pub fn visualize(&self) -> Result<GraphView, OnionError> {
        let snapshot = self.backend.store().snapshot()?;
        Ok(GraphView::from_snapshot(&snapshot))
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> Result<usize, OnionError> {
        self.backend.store().node_count()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> Result<usize, OnionError> {
        self.backend.store().edge_count()
    }

    /// Administrative reset: delete every node and edge.
    pub fn reset(&mut self) -> Result<(), OnionError> {
        self.backend.store_mut().clear()?;
        tracing::warn!(persistent = self.is_persistent(), "argument graph reset");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
