//! # Graph Export for Visualization
//!
//! A read-only `{nodes, edges}` view of the current graph, shaped for a
//! renderer. Every edge is exported, including ones the verifier would
//! reject. Layout is left to the consumer.

use crate::graph::GraphSnapshot;
use crate::{EdgeId, NodeId, NodeKind, RelationshipType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewNode {
    pub id: NodeId,
    /// Serialized as its display label (`Claim`, `Grounds`, ...).
    #[serde(alias = "label")]
    pub kind: NodeKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
}

/// The exported graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    /// Build a view from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let nodes = snapshot
            .nodes()
            .map(|n| ViewNode {
                id: n.id.clone(),
                kind: n.kind,
                text: n.text.clone(),
            })
            .collect();

        let edges = snapshot
            .edges()
            .iter()
            .map(|e| ViewEdge {
                id: e.id.clone(),
                source: e.source.clone(),
                target: e.target.clone(),
                relationship_type: e.relationship_type.clone(),
            })
            .collect();

        Self { nodes, edges }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphStore};
    use crate::ArgumentDraft;

    #[test]
    fn empty_graph_exports_nothing() {
        let snapshot = Graph::new().snapshot().expect("snapshot");
        let view = GraphView::from_snapshot(&snapshot);
        assert!(view.is_empty());
        assert!(view.edges.is_empty());
    }

    #[test]
    fn exports_nodes_and_all_edges() {
        let mut graph = Graph::new();
        let inserted = graph
            .insert_argument(&ArgumentDraft::new("Main", "G1", "W1"))
            .expect("insert");
        let other = graph.insert_node(NodeKind::Claim, "Other").expect("insert");
        graph
            .insert_edge(
                &other,
                &inserted.argument_id,
                RelationshipType::parse("INVALID_TYPE"),
            )
            .expect("edge");

        let view = GraphView::from_snapshot(&graph.snapshot().expect("snapshot"));

        assert_eq!(view.nodes.len(), 4);
        assert_eq!(view.edges.len(), 3);
        assert!(
            view.edges
                .iter()
                .any(|e| e.relationship_type.as_str() == "INVALID_TYPE")
        );
        let claim = view
            .nodes
            .iter()
            .find(|n| n.id == inserted.argument_id)
            .expect("claim");
        assert_eq!(claim.kind, NodeKind::Claim);
        assert_eq!(claim.text, "Main");
    }
}
