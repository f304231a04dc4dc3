//! # Structural Verifier
//!
//! Read-only integrity checks over a `GraphSnapshot`.
//!
//! Checks run in priority order and stop at the first violation:
//! 1. cycle through argumentative edges (`SUPPORTS` / `JUSTIFIES`)
//! 2. an edge leaving a `Claim` whose type is outside the allowed set
//! 3. a `Claim` with no incident argumentative edge (orphan)
//!
//! Global mode walks the whole graph. Scoped mode looks only for a cycle
//! through the given node, and limits the type and orphan checks to the
//! nodes reachable from it. A scoped node that does not exist is reported as
//! `NotFound` once the structural checks have come back clean.
//!
//! The verifier never writes. Cycle detection is an iterative depth-first
//! search so that long chains cannot overflow the stack.

use crate::graph::GraphSnapshot;
use crate::primitives::{
    ARGUMENT_VERIFIED_MESSAGE, CYCLE_DETECTED_MESSAGE, EMPTY_GRAPH_MESSAGE,
    GRAPH_VERIFIED_MESSAGE, INVALID_TYPES_MESSAGE, ORPHANED_NODES_MESSAGE,
};
use crate::{EdgeId, EngineConfig, NodeId, NodeKind, OnionError, RelationshipType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// REPORT
// =============================================================================

/// Overall verdict of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Success,
    Failure,
}

/// A claim with no incident argumentative edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedNode {
    pub id: NodeId,
    pub text: String,
}

/// An edge leaving a claim with a type outside the allowed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRelationship {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub relationship_type: RelationshipType,
}

/// The first violation found, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Violation {
    Cycle(Vec<NodeId>),
    InvalidTypes(Vec<InvalidRelationship>),
    Orphans(Vec<OrphanedNode>),
}

/// Result of a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub status: VerificationStatus,
    pub message: String,
    pub is_valid: bool,
    pub has_cycles: bool,
    pub orphaned_nodes: Vec<OrphanedNode>,
    /// The offending path, first node repeated at the end.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_relationships: Vec<InvalidRelationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument_id: Option<NodeId>,
}

impl VerificationReport {
    fn valid(message: &str, argument_id: Option<&NodeId>) -> Self {
        Self {
            status: VerificationStatus::Success,
            message: message.to_string(),
            is_valid: true,
            has_cycles: false,
            orphaned_nodes: Vec::new(),
            cycle: Vec::new(),
            invalid_relationships: Vec::new(),
            argument_id: argument_id.cloned(),
        }
    }

    fn violated(violation: Violation, argument_id: Option<&NodeId>) -> Self {
        let mut report = Self {
            status: VerificationStatus::Failure,
            message: String::new(),
            is_valid: false,
            has_cycles: false,
            orphaned_nodes: Vec::new(),
            cycle: Vec::new(),
            invalid_relationships: Vec::new(),
            argument_id: argument_id.cloned(),
        };
        match violation {
            Violation::Cycle(path) => {
                report.message = CYCLE_DETECTED_MESSAGE.to_string();
                report.has_cycles = true;
                report.cycle = path;
            }
            Violation::InvalidTypes(edges) => {
                report.message = INVALID_TYPES_MESSAGE.to_string();
                report.invalid_relationships = edges;
            }
            Violation::Orphans(nodes) => {
                report.message = ORPHANED_NODES_MESSAGE.to_string();
                report.orphaned_nodes = nodes;
            }
        }
        report
    }

    /// Turn a failed report into `OnionError::Graph`.
    ///
    /// Valid reports pass through unchanged.
    pub fn into_result(self) -> Result<Self, OnionError> {
        if self.is_valid {
            return Ok(self);
        }

        let mut details = BTreeMap::new();
        details.insert("has_cycles".to_string(), self.has_cycles.to_string());
        if let Some(id) = &self.argument_id {
            details.insert("argument_id".to_string(), id.to_string());
        }
        if !self.cycle.is_empty() {
            let path = self
                .cycle
                .iter()
                .map(NodeId::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            details.insert("cycle".to_string(), path);
        }
        if !self.invalid_relationships.is_empty() {
            let types = self
                .invalid_relationships
                .iter()
                .map(|r| format!("{} -[{}]-> {}", r.source, r.relationship_type, r.target))
                .collect::<Vec<_>>()
                .join(", ");
            details.insert("invalid_relationships".to_string(), types);
        }
        if !self.orphaned_nodes.is_empty() {
            let ids = self
                .orphaned_nodes
                .iter()
                .map(|n| n.id.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            details.insert("orphaned_nodes".to_string(), ids);
        }

        Err(OnionError::graph(self.message, details))
    }
}

// =============================================================================
// VERIFIER
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current DFS path.
    Active,
    /// Fully explored, known to reach no cycle.
    Done,
}

/// The StructuralVerifier checks acyclicity, edge types and orphans.
#[derive(Debug, Clone)]
pub struct StructuralVerifier {
    global_allowed: Vec<RelationshipType>,
    scoped_allowed: Vec<RelationshipType>,
}

impl StructuralVerifier {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            global_allowed: config.global_allowed_types.clone(),
            scoped_allowed: config.scoped_allowed_types.clone(),
        }
    }

    /// Verify the whole graph, or only the part around `argument_id`.
    pub fn verify(
        &self,
        snapshot: &GraphSnapshot,
        argument_id: Option<&NodeId>,
    ) -> Result<VerificationReport, OnionError> {
        let report = match argument_id {
            None => self.verify_global(snapshot),
            Some(id) => self.verify_scoped(snapshot, id)?,
        };

        if report.is_valid {
            tracing::debug!(
                nodes = snapshot.node_count(),
                edges = snapshot.edge_count(),
                argument_id = argument_id.map(NodeId::as_str),
                "graph verified"
            );
        } else {
            tracing::warn!(
                argument_id = argument_id.map(NodeId::as_str),
                has_cycles = report.has_cycles,
                orphans = report.orphaned_nodes.len(),
                invalid_relationships = report.invalid_relationships.len(),
                "{}",
                report.message
            );
        }

        Ok(report)
    }

    fn verify_global(&self, snapshot: &GraphSnapshot) -> VerificationReport {
        if snapshot.is_empty() {
            return VerificationReport::valid(EMPTY_GRAPH_MESSAGE, None);
        }

        let violation = find_cycle(snapshot)
            .map(Violation::Cycle)
            .or_else(|| {
                let claims = snapshot.nodes_of_kind(NodeKind::Claim).map(|n| &n.id);
                invalid_edges(snapshot, claims, &self.global_allowed).map(Violation::InvalidTypes)
            })
            .or_else(|| {
                let claims = snapshot.nodes_of_kind(NodeKind::Claim).map(|n| &n.id);
                orphans(snapshot, claims).map(Violation::Orphans)
            });

        match violation {
            Some(v) => VerificationReport::violated(v, None),
            None => VerificationReport::valid(GRAPH_VERIFIED_MESSAGE, None),
        }
    }

    fn verify_scoped(
        &self,
        snapshot: &GraphSnapshot,
        argument_id: &NodeId,
    ) -> Result<VerificationReport, OnionError> {
        let reachable = reachable_claims(snapshot, argument_id);

        let violation = find_cycle_through(snapshot, argument_id)
            .map(Violation::Cycle)
            .or_else(|| {
                invalid_edges(snapshot, reachable.iter().copied(), &self.scoped_allowed)
                    .map(Violation::InvalidTypes)
            })
            .or_else(|| orphans(snapshot, reachable.iter().copied()).map(Violation::Orphans));

        if let Some(v) = violation {
            return Ok(VerificationReport::violated(v, Some(argument_id)));
        }

        if !snapshot.contains(argument_id) {
            return Err(OnionError::NotFound(argument_id.clone()));
        }

        Ok(VerificationReport::valid(
            ARGUMENT_VERIFIED_MESSAGE,
            Some(argument_id),
        ))
    }
}

// =============================================================================
// CHECKS
// =============================================================================

/// Find any cycle of argumentative edges.
///
/// Roots are visited in id order and successors in edge order, so the
/// reported path is deterministic for a given graph.
fn find_cycle(snapshot: &GraphSnapshot) -> Option<Vec<NodeId>> {
    let mut marks: BTreeMap<&NodeId, Mark> = BTreeMap::new();

    for root in snapshot.nodes().map(|n| &n.id) {
        if marks.contains_key(root) {
            continue;
        }

        marks.insert(root, Mark::Active);
        let mut stack: Vec<(&NodeId, Vec<&NodeId>)> = vec![(root, pending_successors(snapshot, root))];

        while let Some((_, pending)) = stack.last_mut() {
            let Some(next) = pending.pop() else {
                if let Some((finished, _)) = stack.pop() {
                    marks.insert(finished, Mark::Done);
                }
                continue;
            };

            match marks.get(next) {
                Some(Mark::Active) => {
                    let start = stack.iter().position(|(id, _)| *id == next).unwrap_or(0);
                    let mut cycle: Vec<NodeId> =
                        stack[start..].iter().map(|(id, _)| (*id).clone()).collect();
                    cycle.push(next.clone());
                    return Some(cycle);
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::Active);
                    stack.push((next, pending_successors(snapshot, next)));
                }
            }
        }
    }

    None
}

/// Argumentative successors in reverse edge order, ready to be popped.
fn pending_successors<'a>(snapshot: &'a GraphSnapshot, id: &NodeId) -> Vec<&'a NodeId> {
    let mut next: Vec<&'a NodeId> = snapshot.argumentative_successors(id).collect();
    next.reverse();
    next
}

/// Find a cycle of argumentative edges that starts and ends at `origin`.
fn find_cycle_through(snapshot: &GraphSnapshot, origin: &NodeId) -> Option<Vec<NodeId>> {
    let mut parent: BTreeMap<&NodeId, &NodeId> = BTreeMap::new();
    let mut queue: VecDeque<&NodeId> = VecDeque::new();

    for next in snapshot.argumentative_successors(origin) {
        if next == origin {
            return Some(vec![origin.clone(), origin.clone()]);
        }
        if !parent.contains_key(next) {
            parent.insert(next, origin);
            queue.push_back(next);
        }
    }

    while let Some(current) = queue.pop_front() {
        for next in snapshot.argumentative_successors(current) {
            if next == origin {
                let mut chain = vec![current.clone()];
                let mut cursor = current;
                while let Some(&up) = parent.get(cursor) {
                    if up == origin {
                        break;
                    }
                    chain.push(up.clone());
                    cursor = up;
                }
                chain.reverse();

                let mut path = Vec::with_capacity(chain.len() + 2);
                path.push(origin.clone());
                path.extend(chain);
                path.push(origin.clone());
                return Some(path);
            }
            if !parent.contains_key(next) {
                parent.insert(next, current);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Claims reachable from `start` over outgoing edges of any type,
/// `start` included.
fn reachable_claims<'a>(snapshot: &'a GraphSnapshot, start: &'a NodeId) -> BTreeSet<&'a NodeId> {
    let mut seen: BTreeSet<&NodeId> = BTreeSet::new();
    let mut queue: VecDeque<&NodeId> = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        for edge in snapshot.outgoing(current) {
            if seen.insert(&edge.target) {
                queue.push_back(&edge.target);
            }
        }
    }

    seen.into_iter()
        .filter(|id| {
            snapshot
                .node(id)
                .is_some_and(|node| node.kind == NodeKind::Claim)
        })
        .collect()
}

fn invalid_edges<'a>(
    snapshot: &'a GraphSnapshot,
    claims: impl Iterator<Item = &'a NodeId>,
    allowed: &[RelationshipType],
) -> Option<Vec<InvalidRelationship>> {
    let invalid: Vec<InvalidRelationship> = claims
        .flat_map(|id| snapshot.outgoing(id))
        .filter(|edge| !allowed.contains(&edge.relationship_type))
        .map(|edge| InvalidRelationship {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            relationship_type: edge.relationship_type.clone(),
        })
        .collect();

    (!invalid.is_empty()).then_some(invalid)
}

fn orphans<'a>(
    snapshot: &'a GraphSnapshot,
    claims: impl Iterator<Item = &'a NodeId>,
) -> Option<Vec<OrphanedNode>> {
    let orphaned: Vec<OrphanedNode> = claims
        .filter(|id| !snapshot.has_argumentative_edge(id))
        .filter_map(|id| snapshot.node(id))
        .map(|node| OrphanedNode {
            id: node.id.clone(),
            text: node.text.clone(),
        })
        .collect();

    (!orphaned.is_empty()).then_some(orphaned)
}

// =============================================================================
// TESTS
// =============================================================================
