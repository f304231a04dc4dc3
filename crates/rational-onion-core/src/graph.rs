//! # Graph Store
//!
//! The persistence abstraction over a labeled-node / typed-edge graph, and
//! the in-memory implementation used for tests and the `memory` backend.
//!
//! All data structures use `BTreeMap` for deterministic ordering.

use crate::primitives::{EDGE_ID_PREFIX, NODE_ID_PREFIX, format_id};
use crate::types::component_link;
use crate::{
    ArgumentDraft, ArgumentNode, EdgeId, InsertedArgument, NodeId, NodeKind, OnionError,
    Relationship, RelationshipType,
};
use std::collections::BTreeMap;

// =============================================================================
// GRAPHSTORE TRAIT
// =============================================================================

/// The GraphStore trait defines the store operations the engine relies on.
///
/// All fallible operations return `Result<T, OnionError>` so that in-memory
/// and persistent backends are used uniformly. Persistence failures are
/// always `OnionError::Database`.
pub trait GraphStore {
    /// Write a claim with its grounds, warrant and optional rebuttal, plus
    /// the edges linking them to the claim, as one all-or-nothing write.
    fn insert_argument(&mut self, draft: &ArgumentDraft) -> Result<InsertedArgument, OnionError>;

    /// Insert a single node. Returns the store-assigned identifier.
    fn insert_node(&mut self, kind: NodeKind, text: &str) -> Result<NodeId, OnionError>;

    /// Insert a directed edge. Both endpoints must exist.
    ///
    /// Parallel edges are never merged: every call yields a new edge.
    fn insert_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: RelationshipType,
    ) -> Result<EdgeId, OnionError>;

    /// Lookup a node by id.
    fn lookup(&self, id: &NodeId) -> Result<Option<ArgumentNode>, OnionError>;

    /// Check if a node exists.
    fn contains_node(&self, id: &NodeId) -> Result<bool, OnionError> {
        Ok(self.lookup(id)?.is_some())
    }

    /// All nodes in deterministic order.
    fn nodes(&self) -> Result<Vec<ArgumentNode>, OnionError>;

    /// All edges in deterministic order.
    fn edges(&self) -> Result<Vec<Relationship>, OnionError>;

    /// Total number of nodes.
    fn node_count(&self) -> Result<usize, OnionError>;

    /// Total number of edges.
    fn edge_count(&self) -> Result<usize, OnionError>;

    /// Read the whole graph into an adjacency view for traversal.
    fn snapshot(&self) -> Result<GraphSnapshot, OnionError> {
        Ok(GraphSnapshot::build(self.nodes()?, self.edges()?))
    }

    /// Administrative reset: delete every node and edge.
    ///
    /// Identifier counters are not rewound, so ids are never reused.
    fn clear(&mut self) -> Result<(), OnionError>;
}

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The in-memory graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Node storage: NodeId -> ArgumentNode
    nodes: BTreeMap<NodeId, ArgumentNode>,

    /// Edge storage: EdgeId -> Relationship
    edges: BTreeMap<EdgeId, Relationship>,

    /// Next node counter value
    next_node_id: u64,

    /// Next edge counter value
    next_edge_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId::new(format_id(NODE_ID_PREFIX, self.next_node_id));
        self.next_node_id = self.next_node_id.saturating_add(1);
        id
    }

    fn allocate_edge_id(&mut self) -> EdgeId {
        let id = EdgeId::new(format_id(EDGE_ID_PREFIX, self.next_edge_id));
        self.next_edge_id = self.next_edge_id.saturating_add(1);
        id
    }

    fn push_node(&mut self, kind: NodeKind, text: &str) -> NodeId {
        let id = self.allocate_node_id();
        self.nodes
            .insert(id.clone(), ArgumentNode::new(id.clone(), kind, text));
        id
    }

    fn push_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: RelationshipType,
    ) -> EdgeId {
        let id = self.allocate_edge_id();
        let edge = Relationship::new(id.clone(), source.clone(), target.clone(), relationship_type);
        self.edges.insert(id.clone(), edge);
        id
    }
}

impl GraphStore for Graph {
    fn insert_argument(&mut self, draft: &ArgumentDraft) -> Result<InsertedArgument, OnionError> {
        // Nothing below can fail, so the write is trivially all-or-nothing.
        let argument_id = self.push_node(NodeKind::Claim, &draft.claim);
        let mut edges = Vec::with_capacity(3);

        let mut satellite = |graph: &mut Self, kind: NodeKind, text: &str| {
            let id = graph.push_node(kind, text);
            if let Some(link) = component_link(kind) {
                edges.push(graph.push_edge(&id, &argument_id, link));
            }
            id
        };

        let grounds_id = satellite(self, NodeKind::Grounds, &draft.grounds);
        let warrant_id = satellite(self, NodeKind::Warrant, &draft.warrant);
        let rebuttal_id = draft
            .rebuttal
            .as_deref()
            .map(|text| satellite(self, NodeKind::Rebuttal, text));

        Ok(InsertedArgument {
            argument_id,
            grounds_id,
            warrant_id,
            rebuttal_id,
            edges,
        })
    }

    fn insert_node(&mut self, kind: NodeKind, text: &str) -> Result<NodeId, OnionError> {
        Ok(self.push_node(kind, text))
    }

    fn insert_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: RelationshipType,
    ) -> Result<EdgeId, OnionError> {
        for endpoint in [source, target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(OnionError::NotFound(endpoint.clone()));
            }
        }
        Ok(self.push_edge(source, target, relationship_type))
    }

    fn lookup(&self, id: &NodeId) -> Result<Option<ArgumentNode>, OnionError> {
        Ok(self.nodes.get(id).cloned())
    }

    fn contains_node(&self, id: &NodeId) -> Result<bool, OnionError> {
        Ok(self.nodes.contains_key(id))
    }

    fn nodes(&self) -> Result<Vec<ArgumentNode>, OnionError> {
        Ok(self.nodes.values().cloned().collect())
    }

    fn edges(&self) -> Result<Vec<Relationship>, OnionError> {
        Ok(self.edges.values().cloned().collect())
    }

    fn node_count(&self) -> Result<usize, OnionError> {
        Ok(self.nodes.len())
    }

    fn edge_count(&self) -> Result<usize, OnionError> {
        Ok(self.edges.len())
    }

    fn clear(&mut self) -> Result<(), OnionError> {
        self.nodes.clear();
        self.edges.clear();
        Ok(())
    }
}

// =============================================================================
// SNAPSHOT (ADJACENCY VIEW)
// =============================================================================

/// A read-only adjacency-list view of the graph, keyed by opaque node id.
///
/// Built once per verification from whatever the store returns; it never
/// writes back.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: BTreeMap<NodeId, ArgumentNode>,
    edges: Vec<Relationship>,
    /// node -> indices into `edges` of edges leaving it
    outgoing: BTreeMap<NodeId, Vec<usize>>,
    /// node -> indices into `edges` of edges entering it
    incoming: BTreeMap<NodeId, Vec<usize>>,
}

impl GraphSnapshot {
    /// Index nodes and edges.
    #[must_use]
    pub fn build(nodes: Vec<ArgumentNode>, edges: Vec<Relationship>) -> Self {
        let mut outgoing: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        let mut incoming: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
        for (index, edge) in edges.iter().enumerate() {
            outgoing.entry(edge.source.clone()).or_default().push(index);
            incoming.entry(edge.target.clone()).or_default().push(index);
        }

        Self {
            nodes: nodes.into_iter().map(|n| (n.id.clone(), n)).collect(),
            edges,
            outgoing,
            incoming,
        }
    }

    /// True when the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&ArgumentNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes in deterministic order.
    pub fn nodes(&self) -> impl Iterator<Item = &ArgumentNode> {
        self.nodes.values()
    }

    /// All nodes of the given kind.
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &ArgumentNode> {
        self.nodes.values().filter(move |n| n.kind == kind)
    }

    /// All edges in store order.
    #[must_use]
    pub fn edges(&self) -> &[Relationship] {
        &self.edges
    }

    /// Edges leaving `id`.
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Relationship> + '_ {
        self.indexed(self.outgoing.get(id))
    }

    /// Edges entering `id`.
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &Relationship> + '_ {
        self.indexed(self.incoming.get(id))
    }

    /// Targets of argumentative edges leaving `id`, in edge order.
    pub fn argumentative_successors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.outgoing(id)
            .filter(|e| e.relationship_type.is_argumentative())
            .map(|e| &e.target)
    }

    /// Whether any argumentative edge touches `id`, in either direction.
    #[must_use]
    pub fn has_argumentative_edge(&self, id: &NodeId) -> bool {
        self.outgoing(id)
            .chain(self.incoming(id))
            .any(|e| e.relationship_type.is_argumentative())
    }

    fn indexed<'a>(
        &'a self,
        indices: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        indices
            .into_iter()
            .flatten()
            .filter_map(|&i| self.edges.get(i))
    }
}

// =============================================================================
// TESTS
// =============================================================================

/// A store whose reads see `inner` and whose writes always fail, as an
/// unreachable database would.
#[cfg(test)]
pub(crate) struct UnwritableStore {
    pub(crate) inner: Graph,
}

#[cfg(test)]
impl UnwritableStore {
    pub(crate) const CAUSE: &'static str = "database is read-only";
}

#[cfg(test)]
impl GraphStore for UnwritableStore {
    fn insert_argument(&mut self, _: &ArgumentDraft) -> Result<InsertedArgument, OnionError> {
        Err(OnionError::database("insert_argument", Self::CAUSE))
    }

    fn insert_node(&mut self, _: NodeKind, _: &str) -> Result<NodeId, OnionError> {
        Err(OnionError::database("insert_node", Self::CAUSE))
    }

    fn insert_edge(
        &mut self,
        _: &NodeId,
        _: &NodeId,
        _: RelationshipType,
    ) -> Result<EdgeId, OnionError> {
        Err(OnionError::database("insert_edge", Self::CAUSE))
    }

    fn lookup(&self, id: &NodeId) -> Result<Option<ArgumentNode>, OnionError> {
        self.inner.lookup(id)
    }

    fn nodes(&self) -> Result<Vec<ArgumentNode>, OnionError> {
        self.inner.nodes()
    }

    fn edges(&self) -> Result<Vec<Relationship>, OnionError> {
        self.inner.edges()
    }

    fn node_count(&self) -> Result<usize, OnionError> {
        self.inner.node_count()
    }

    fn edge_count(&self) -> Result<usize, OnionError> {
        self.inner.edge_count()
    }

    fn clear(&mut self) -> Result<(), OnionError> {
        Err(OnionError::database("clear", Self::CAUSE))
    }
}
