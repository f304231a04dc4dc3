//! # redb-backed Graph Storage
//!
//! A disk-backed argument store using the redb embedded database.
//!
//! redb gives us:
//! - ACID transactions (an argument and its edges commit together or not at all)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded. Identifier counters live in the metadata
//! table and are advanced in the same transaction as the records they name.

use crate::error::store_failure;
use crate::graph::{GraphSnapshot, GraphStore};
use crate::primitives::{EDGE_ID_PREFIX, NODE_ID_PREFIX, format_id};
use crate::types::component_link;
use crate::{
    ArgumentDraft, ArgumentNode, EdgeId, InsertedArgument, NodeId, NodeKind, OnionError,
    Relationship, RelationshipType,
};
use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition, TableError, WriteTransaction,
};
use std::path::Path;

/// Table for nodes: NodeId -> postcard ArgumentNode
const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");

/// Table for edges: EdgeId -> postcard Relationship
const EDGES: TableDefinition<&str, &[u8]> = TableDefinition::new("edges");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_NODE_KEY: &str = "next_node_id";
const NEXT_EDGE_KEY: &str = "next_edge_id";

/// A disk-backed argument graph store using redb.
pub struct RedbGraph {
    /// The redb database handle.
    db: Database,
    /// Next node counter, mirrored from the metadata table after each commit.
    next_node_id: u64,
    /// Next edge counter, mirrored from the metadata table after each commit.
    next_edge_id: u64,
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph")
            .field("next_node_id", &self.next_node_id)
            .field("next_edge_id", &self.next_edge_id)
            .finish_non_exhaustive()
    }
}

/// Pending writes of one transaction. Counters are local until commit.
struct Batch<'txn> {
    txn: &'txn WriteTransaction,
    next_node_id: u64,
    next_edge_id: u64,
}

impl Batch<'_> {
    fn node(&mut self, kind: NodeKind, text: &str) -> Result<NodeId, OnionError> {
        let id = NodeId::new(format_id(NODE_ID_PREFIX, self.next_node_id));
        let node = ArgumentNode::new(id.clone(), kind, text);
        let bytes = postcard::to_allocvec(&node).map_err(store_failure("encode_node"))?;

        let mut table = self
            .txn
            .open_table(NODES)
            .map_err(store_failure("open_nodes"))?;
        table
            .insert(id.as_str(), bytes.as_slice())
            .map_err(store_failure("insert_node"))?;

        self.next_node_id = self.next_node_id.saturating_add(1);
        Ok(id)
    }

    fn edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: RelationshipType,
    ) -> Result<EdgeId, OnionError> {
        let id = EdgeId::new(format_id(EDGE_ID_PREFIX, self.next_edge_id));
        let edge = Relationship::new(id.clone(), source.clone(), target.clone(), relationship_type);
        let bytes = postcard::to_allocvec(&edge).map_err(store_failure("encode_edge"))?;

        let mut table = self
            .txn
            .open_table(EDGES)
            .map_err(store_failure("open_edges"))?;
        table
            .insert(id.as_str(), bytes.as_slice())
            .map_err(store_failure("insert_edge"))?;

        self.next_edge_id = self.next_edge_id.saturating_add(1);
        Ok(id)
    }

    fn node_exists(&self, id: &NodeId) -> Result<bool, OnionError> {
        let table = self
            .txn
            .open_table(NODES)
            .map_err(store_failure("open_nodes"))?;
        Ok(table
            .get(id.as_str())
            .map_err(store_failure("lookup_node"))?
            .is_some())
    }

    fn write_counters(&self) -> Result<(), OnionError> {
        let mut meta = self
            .txn
            .open_table(METADATA)
            .map_err(store_failure("open_metadata"))?;
        meta.insert(NEXT_NODE_KEY, self.next_node_id)
            .map_err(store_failure("write_metadata"))?;
        meta.insert(NEXT_EDGE_KEY, self.next_edge_id)
            .map_err(store_failure("write_metadata"))?;
        Ok(())
    }
}

impl RedbGraph {
    /// Open or create an argument database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OnionError> {
        let db = Database::create(path.as_ref()).map_err(store_failure("open_database"))?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(store_failure("open_database"))?;
            let _ = write_txn
                .open_table(NODES)
                .map_err(store_failure("open_nodes"))?;
            let _ = write_txn
                .open_table(EDGES)
                .map_err(store_failure("open_edges"))?;
            let _ = write_txn
                .open_table(METADATA)
                .map_err(store_failure("open_metadata"))?;
            write_txn.commit().map_err(store_failure("open_database"))?;
        }

        // Load metadata
        let (next_node_id, next_edge_id) = {
            let read_txn = db.begin_read().map_err(store_failure("open_database"))?;
            let table = read_txn
                .open_table(METADATA)
                .map_err(store_failure("open_metadata"))?;
            let read = |key: &str| -> Result<u64, OnionError> {
                Ok(table
                    .get(key)
                    .map_err(store_failure("read_metadata"))?
                    .map(|v| v.value())
                    .unwrap_or(0))
            };
            (read(NEXT_NODE_KEY)?, read(NEXT_EDGE_KEY)?)
        };

        tracing::debug!(
            path = %path.as_ref().display(),
            next_node_id,
            next_edge_id,
            "opened redb argument store"
        );

        Ok(Self {
            db,
            next_node_id,
            next_edge_id,
        })
    }

    /// Run `f` against a fresh write transaction and commit it.
    ///
    /// Any error from `f` drops the transaction, which aborts every write it
    /// made. Counters are only advanced once the commit has succeeded.
    fn write<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Batch<'_>) -> Result<T, OnionError>,
    ) -> Result<T, OnionError> {
        let txn = self.db.begin_write().map_err(store_failure(operation))?;
        let (value, next_node_id, next_edge_id) = {
            let mut batch = Batch {
                txn: &txn,
                next_node_id: self.next_node_id,
                next_edge_id: self.next_edge_id,
            };
            let value = f(&mut batch)?;
            batch.write_counters()?;
            (value, batch.next_node_id, batch.next_edge_id)
        };
        txn.commit().map_err(store_failure(operation))?;

        self.next_node_id = next_node_id;
        self.next_edge_id = next_edge_id;
        Ok(value)
    }

    fn read_txn(&self) -> Result<ReadTransaction, OnionError> {
        self.db.begin_read().map_err(store_failure("begin_read"))
    }

    fn read_nodes(txn: &ReadTransaction) -> Result<Vec<ArgumentNode>, OnionError> {
        let table = match txn.open_table(NODES) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(store_failure("open_nodes")(e)),
        };
        let mut nodes = Vec::new();
        for entry in table.iter().map_err(store_failure("read_nodes"))? {
            let (_, value) = entry.map_err(store_failure("read_nodes"))?;
            let node: ArgumentNode =
                postcard::from_bytes(value.value()).map_err(store_failure("decode_node"))?;
            nodes.push(node);
        }
        Ok(nodes)
    }

    fn read_edges(txn: &ReadTransaction) -> Result<Vec<Relationship>, OnionError> {
        let table = match txn.open_table(EDGES) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(store_failure("open_edges")(e)),
        };
        let mut edges = Vec::new();
        for entry in table.iter().map_err(store_failure("read_edges"))? {
            let (_, value) = entry.map_err(store_failure("read_edges"))?;
            let edge: Relationship =
                postcard::from_bytes(value.value()).map_err(store_failure("decode_edge"))?;
            edges.push(edge);
        }
        Ok(edges)
    }
}

impl GraphStore for RedbGraph {
    fn insert_argument(&mut self, draft: &ArgumentDraft) -> Result<InsertedArgument, OnionError> {
        self.write("insert_argument", |batch| {
            let argument_id = batch.node(NodeKind::Claim, &draft.claim)?;
            let mut edges = Vec::with_capacity(3);

            let mut components = vec![
                (NodeKind::Grounds, draft.grounds.as_str()),
                (NodeKind::Warrant, draft.warrant.as_str()),
            ];
            if let Some(rebuttal) = draft.rebuttal.as_deref() {
                components.push((NodeKind::Rebuttal, rebuttal));
            }

            let mut ids = Vec::with_capacity(components.len());
            for (kind, text) in components {
                let id = batch.node(kind, text)?;
                if let Some(link) = component_link(kind) {
                    edges.push(batch.edge(&id, &argument_id, link)?);
                }
                ids.push(id);
            }

            let mut ids = ids.into_iter();
            let (Some(grounds_id), Some(warrant_id)) = (ids.next(), ids.next()) else {
                return Err(OnionError::database(
                    "insert_argument",
                    "component nodes were not written",
                ));
            };

            Ok(InsertedArgument {
                argument_id,
                grounds_id,
                warrant_id,
                rebuttal_id: ids.next(),
                edges,
            })
        })
    }

    fn insert_node(&mut self, kind: NodeKind, text: &str) -> Result<NodeId, OnionError> {
        self.write("insert_node", |batch| batch.node(kind, text))
    }

    fn insert_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship_type: RelationshipType,
    ) -> Result<EdgeId, OnionError> {
        self.write("insert_edge", |batch| {
            for endpoint in [source, target] {
                if !batch.node_exists(endpoint)? {
                    return Err(OnionError::NotFound(endpoint.clone()));
                }
            }
            batch.edge(source, target, relationship_type)
        })
    }

    fn lookup(&self, id: &NodeId) -> Result<Option<ArgumentNode>, OnionError> {
        let read_txn = self.read_txn()?;
        let table = read_txn
            .open_table(NODES)
            .map_err(store_failure("open_nodes"))?;
        let Some(value) = table
            .get(id.as_str())
            .map_err(store_failure("lookup_node"))?
        else {
            return Ok(None);
        };
        let node = postcard::from_bytes(value.value()).map_err(store_failure("decode_node"))?;
        Ok(Some(node))
    }

    fn nodes(&self) -> Result<Vec<ArgumentNode>, OnionError> {
        Self::read_nodes(&self.read_txn()?)
    }

    fn edges(&self) -> Result<Vec<Relationship>, OnionError> {
        Self::read_edges(&self.read_txn()?)
    }

    fn node_count(&self) -> Result<usize, OnionError> {
        let read_txn = self.read_txn()?;
        let nodes_table = read_txn
            .open_table(NODES)
            .map_err(store_failure("open_nodes"))?;
        let count = nodes_table.len().map_err(store_failure("count_nodes"))?;
        Ok(count as usize)
    }

    fn edge_count(&self) -> Result<usize, OnionError> {
        let read_txn = self.read_txn()?;
        let edges_table = read_txn
            .open_table(EDGES)
            .map_err(store_failure("open_edges"))?;
        let count = edges_table.len().map_err(store_failure("count_edges"))?;
        Ok(count as usize)
    }

    /// Nodes and edges come from one read transaction, so the view is
    /// consistent even while writers commit.
    fn snapshot(&self) -> Result<GraphSnapshot, OnionError> {
        let read_txn = self.read_txn()?;
        let nodes = Self::read_nodes(&read_txn)?;
        let edges = Self::read_edges(&read_txn)?;
        Ok(GraphSnapshot::build(nodes, edges))
    }

    fn clear(&mut self) -> Result<(), OnionError> {
        self.write("clear", |batch| {
            for definition in [NODES, EDGES] {
                let mut table = batch
                    .txn
                    .open_table(definition)
                    .map_err(store_failure("clear"))?;
                let keys = table
                    .iter()
                    .map_err(store_failure("clear"))?
                    .map(|entry| entry.map(|(key, _)| key.value().to_string()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(store_failure("clear"))?;
                for key in keys {
                    table.remove(key.as_str()).map_err(store_failure("clear"))?;
                }
            }
            Ok(())
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn basic_operations() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let a = graph.insert_node(NodeKind::Claim, "A").expect("insert node");
        let b = graph.insert_node(NodeKind::Claim, "B").expect("insert node");

        assert_ne!(a, b);
        assert_eq!(graph.node_count().expect("count"), 2);

        graph
            .insert_edge(&a, &b, RelationshipType::Supports)
            .expect("insert edge");
        assert_eq!(graph.edge_count().expect("count"), 1);
    }

    #[test]
    fn insert_argument_is_one_commit() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let draft = ArgumentDraft::new("Main", "G1", "W1").with_rebuttal("R1");
        let inserted = graph.insert_argument(&draft).expect("insert");

        assert_eq!(graph.node_count().expect("count"), 4);
        assert_eq!(graph.edge_count().expect("count"), 3);
        let claim = graph
            .lookup(&inserted.argument_id)
            .expect("lookup")
            .expect("present");
        assert_eq!(claim.kind, NodeKind::Claim);
        assert_eq!(claim.text, "Main");
        assert!(inserted.rebuttal_id.is_some());
    }

    #[test]
    fn persistence() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");

        let inserted = {
            let mut graph = RedbGraph::open(&db_path).expect("open db");
            graph
                .insert_argument(&ArgumentDraft::new("Main", "G1", "W1"))
                .expect("insert")
        };

        let mut graph = RedbGraph::open(&db_path).expect("reopen db");
        assert_eq!(graph.node_count().expect("count"), 3);
        assert!(graph.contains_node(&inserted.grounds_id).expect("contains"));

        // Counters survive a reopen, so new ids never collide.
        let next = graph.insert_node(NodeKind::Claim, "Other").expect("insert");
        assert_ne!(next, inserted.argument_id);
        assert_ne!(next, inserted.grounds_id);
        assert_ne!(next, inserted.warrant_id);
    }

    #[test]
    fn missing_endpoint_aborts_edge() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let a = graph.insert_node(NodeKind::Claim, "A").expect("insert");
        let missing = NodeId::new("node-nope");

        let result = graph.insert_edge(&missing, &a, RelationshipType::Supports);
        assert_eq!(result, Err(OnionError::NotFound(missing)));
        assert_eq!(graph.edge_count().expect("count"), 0);
    }

    #[test]
    fn aborted_write_leaves_nothing_behind() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");
        let missing = NodeId::new("node-nope");

        let result = graph.write("insert_edge", |batch| {
            let id = batch.node(NodeKind::Claim, "Dangling")?;
            if !batch.node_exists(&missing)? {
                return Err(OnionError::NotFound(missing.clone()));
            }
            Ok(id)
        });

        assert_eq!(result, Err(OnionError::NotFound(missing)));
        assert_eq!(graph.node_count().expect("count"), 0);
        assert_eq!(graph.next_node_id, 0);

        // The aborted id is handed out again, by memory and after a reopen.
        let first = graph.insert_node(NodeKind::Claim, "A").expect("insert");
        drop(graph);
        let reopened = RedbGraph::open(&db_path).expect("reopen db");
        assert_eq!(reopened.next_node_id, 1);
        assert!(reopened.contains_node(&first).expect("contains"));
    }

    #[test]
    fn unknown_relationship_label_round_trips() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let a = graph.insert_node(NodeKind::Claim, "A").expect("insert");
        let b = graph.insert_node(NodeKind::Claim, "B").expect("insert");
        graph
            .insert_edge(&a, &b, RelationshipType::parse("INVALID_TYPE"))
            .expect("edge");

        let edges = graph.edges().expect("edges");
        assert_eq!(
            edges[0].relationship_type,
            RelationshipType::Other("INVALID_TYPE".to_string())
        );
    }

    #[test]
    fn snapshot_matches_tables() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let inserted = graph
            .insert_argument(&ArgumentDraft::new("Main", "G1", "W1"))
            .expect("insert");
        let snapshot = graph.snapshot().expect("snapshot");

        assert_eq!(snapshot.node_count(), 3);
        assert_eq!(snapshot.edge_count(), 2);
        assert_eq!(
            snapshot.argumentative_successors(&inserted.grounds_id).collect::<Vec<_>>(),
            vec![&inserted.argument_id]
        );
    }

    #[test]
    fn clear_empties_store_and_keeps_counters() {
        let temp = tempdir().expect("temp dir");
        let db_path = temp.path().join("test.redb");
        let mut graph = RedbGraph::open(&db_path).expect("open db");

        let before = graph
            .insert_argument(&ArgumentDraft::new("Main", "G1", "W1"))
            .expect("insert");
        graph.clear().expect("clear");

        assert_eq!(graph.node_count().expect("count"), 0);
        assert_eq!(graph.edge_count().expect("count"), 0);

        let after = graph.insert_node(NodeKind::Claim, "Main").expect("insert");
        assert_ne!(after, before.argument_id);
    }
}
