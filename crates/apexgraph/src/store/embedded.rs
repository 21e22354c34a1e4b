//! Embedded graph store.
//!
//! The full graph lives in memory; every upsert is also written to a key-value
//! [`StorageBackend`] as one atomic batch holding the entity and the header of
//! its collection. The in-memory maps change only after the batch succeeded.

use super::{legacy, missing_endpoint, validate_endpoint, GraphStore};
use crate::error::{GraphError, Result};
use crate::export::write_export;
use crate::graph::{
    Direction, Edge, EdgeAttributes, EdgeKey, EdgeKind, GraphSnapshot, GraphStats, Metadata,
    Node, NodeData, NodeId,
};
use crate::storage::{BatchOperation, MemoryBackend, StorageBackend};
use chrono::{DateTime, Utc};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Version of the node/edge value layout written to the key-value store.
pub const SCHEMA_VERSION: u32 = 2;

const NODE_PREFIX: &str = "node:";
const EDGE_PREFIX: &str = "edge:";
const NODES_HEADER: &[u8] = b"meta:nodes";
const EDGES_HEADER: &[u8] = b"meta:edges";
const KEY_SEPARATOR: char = '\0';

/// Snapshot file names written by [`EmbeddedGraphStore::write_snapshot`].
pub(crate) const NODES_SNAPSHOT_FILE: &str = "nodes.json";
pub(crate) const EDGES_SNAPSHOT_FILE: &str = "edges.json";

/// Header stored next to each collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionHeader {
    schema_version: u32,
    timestamp: DateTime<Utc>,
    count: usize,
}

impl CollectionHeader {
    fn now(count: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            timestamp: Utc::now(),
            count,
        }
    }

    fn to_operation(&self, key: &[u8]) -> Result<BatchOperation> {
        let value = serde_json::to_vec(self).map_err(|e| {
            GraphError::serialization("Failed to serialize collection header", Some(e))
        })?;
        Ok(BatchOperation::Put {
            key: key.to_vec(),
            value,
        })
    }
}

fn node_key(id: &NodeId) -> Vec<u8> {
    format!("{NODE_PREFIX}{id}").into_bytes()
}

fn edge_key(key: &EdgeKey) -> Vec<u8> {
    format!(
        "{EDGE_PREFIX}{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
        key.from, key.kind, key.to
    )
    .into_bytes()
}

struct Inner {
    storage: Box<dyn StorageBackend>,
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    // Adjacency indexes for neighbor lookups
    adjacency_out: HashMap<NodeId, HashSet<EdgeKey>>,
    adjacency_in: HashMap<NodeId, HashSet<EdgeKey>>,
}

impl Inner {
    fn index_edge(&mut self, edge: Edge) {
        let key = edge.key();
        self.adjacency_out
            .entry(key.from.clone())
            .or_default()
            .insert(key.clone());
        self.adjacency_in
            .entry(key.to.clone())
            .or_default()
            .insert(key.clone());
        self.edges.insert(key, edge);
    }

    fn sorted_edges<'a>(&'a self, keys: impl IntoIterator<Item = &'a EdgeKey>) -> Vec<Edge> {
        let mut keys: Vec<&EdgeKey> = keys.into_iter().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.edges.get(key).cloned())
            .collect()
    }

    fn all_nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    fn all_edges(&self) -> Vec<Edge> {
        self.sorted_edges(self.edges.keys())
    }

    fn stats(&self) -> GraphStats {
        GraphStats::tally(
            self.nodes.values().map(Node::kind),
            self.edges.keys().map(|key| key.kind),
        )
    }

    fn rebuild_from_storage(&mut self) -> Result<()> {
        if let Some(value) = self.storage.get(NODES_HEADER)? {
            match serde_json::from_slice::<CollectionHeader>(&value) {
                Ok(header) if header.schema_version > SCHEMA_VERSION => warn!(
                    "Node collection has schema version {} (newer than {SCHEMA_VERSION})",
                    header.schema_version
                ),
                Ok(header) => trace!("Node collection header: {} nodes", header.count),
                Err(e) => warn!("Ignoring unreadable node collection header: {e}"),
            }
        }

        for (_, value) in self.storage.scan_prefix(NODE_PREFIX.as_bytes())? {
            let node: Node = serde_json::from_slice(&value)
                .map_err(|e| GraphError::serialization("Failed to deserialize node", Some(e)))?;
            self.nodes.insert(node.id.clone(), node);
        }

        for (_, value) in self.storage.scan_prefix(EDGE_PREFIX.as_bytes())? {
            let edge: Edge = serde_json::from_slice(&value)
                .map_err(|e| GraphError::serialization("Failed to deserialize edge", Some(e)))?;
            self.index_edge(edge);
        }

        Ok(())
    }

    /// Write a legacy graph into storage in one batch, then index it.
    fn import_legacy(&mut self, graph: legacy::LegacyGraph) -> Result<()> {
        let mut nodes: HashMap<NodeId, Node> = HashMap::new();
        for node in graph.nodes {
            nodes.insert(node.id.clone(), node);
        }

        let mut edges: HashMap<EdgeKey, Edge> = HashMap::new();
        for edge in graph.edges {
            if !nodes.contains_key(&edge.from) || !nodes.contains_key(&edge.to) {
                warn!(
                    "Skipping legacy {} edge {} -> {}: endpoint missing",
                    edge.kind, edge.from, edge.to
                );
                continue;
            }
            edges.insert(edge.key(), edge);
        }

        let mut operations = Vec::with_capacity(nodes.len() + edges.len() + 2);
        for node in nodes.values() {
            let value = serde_json::to_vec(node)
                .map_err(|e| GraphError::serialization("Failed to serialize node", Some(e)))?;
            operations.push(BatchOperation::Put {
                key: node_key(&node.id),
                value,
            });
        }
        for (key, edge) in &edges {
            let value = serde_json::to_vec(edge)
                .map_err(|e| GraphError::serialization("Failed to serialize edge", Some(e)))?;
            operations.push(BatchOperation::Put {
                key: edge_key(key),
                value,
            });
        }
        operations.push(CollectionHeader::now(nodes.len()).to_operation(NODES_HEADER)?);
        operations.push(CollectionHeader::now(edges.len()).to_operation(EDGES_HEADER)?);

        self.storage.write_batch(operations)?;

        info!(
            "Migrated {} nodes and {} edges from legacy layout {}",
            nodes.len(),
            edges.len(),
            graph.layout
        );
        self.nodes = nodes;
        for edge in edges.into_values() {
            self.index_edge(edge);
        }
        Ok(())
    }
}

/// Single-process graph store over a key-value backend.
///
/// All state sits behind one `RwLock`: upserts, `clear` and `persist` take the
/// write lock, reads take the read lock and return owned copies.
pub struct EmbeddedGraphStore {
    inner: RwLock<Inner>,
    data_dir: Option<PathBuf>,
}

impl EmbeddedGraphStore {
    /// Open a store over an existing key-value backend.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] or [`GraphError::Serialization`] if the
    /// stored graph cannot be read back.
    pub fn with_backend(backend: Box<dyn StorageBackend>) -> Result<Self> {
        let mut inner = Inner {
            storage: backend,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            adjacency_out: HashMap::new(),
            adjacency_in: HashMap::new(),
        };
        inner.rebuild_from_storage()?;
        debug!(
            "Loaded embedded graph: {} nodes, {} edges",
            inner.nodes.len(),
            inner.edges.len()
        );

        Ok(Self {
            inner: RwLock::new(inner),
            data_dir: None,
        })
    }

    /// Open a store over `backend` for the graph data directory `data_dir`.
    ///
    /// If the backend holds no nodes and `data_dir` contains a legacy snapshot
    /// layout, that snapshot is migrated into the backend.
    pub fn open_with_backend<P: AsRef<Path>>(
        data_dir: P,
        backend: Box<dyn StorageBackend>,
    ) -> Result<Self> {
        let mut store = Self::with_backend(backend)?;
        store.data_dir = Some(data_dir.as_ref().to_path_buf());

        let inner = store.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if inner.nodes.is_empty() {
            if let Some(graph) = legacy::load(data_dir.as_ref())? {
                inner.import_legacy(graph)?;
            }
        }

        Ok(store)
    }

    /// Open a persistent store in `data_dir`, backed by RocksDB in `data_dir/kv`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Storage`] if the directory or the database cannot be opened.
    #[cfg(feature = "rocksdb-backend")]
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        use crate::storage::RocksDBBackend;

        let data_dir = data_dir.as_ref();
        info!("Opening embedded graph at {data_dir:?}");
        std::fs::create_dir_all(data_dir).map_err(|e| {
            GraphError::storage(format!("Failed to create data directory {data_dir:?}"), Some(e))
        })?;
        let backend = RocksDBBackend::open(data_dir.join("kv"))?;
        Self::open_with_backend(data_dir, Box::new(backend))
    }

    /// Create an in-memory store. All data is lost when the store is dropped.
    pub fn in_memory() -> Result<Self> {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Data directory this store was opened for, if any.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.read().nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.read().edges.len()
    }

    /// Write `nodes.json` and `edges.json` into `dir`, each with a
    /// `{schemaVersion, timestamp, count}` header.
    ///
    /// Each file is written to a temporary file first and renamed over the
    /// target, so a failed write leaves the previous snapshot intact.
    pub fn write_snapshot<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        let (nodes, edges) = {
            let inner = self.read();
            (inner.all_nodes(), inner.all_edges())
        };

        let nodes_doc = serde_json::json!({
            "metadata": CollectionHeader::now(nodes.len()),
            "nodes": nodes,
        });
        let edges_doc = serde_json::json!({
            "metadata": CollectionHeader::now(edges.len()),
            "edges": edges,
        });

        for (file, doc) in [
            (NODES_SNAPSHOT_FILE, nodes_doc),
            (EDGES_SNAPSHOT_FILE, edges_doc),
        ] {
            let contents = serde_json::to_string_pretty(&doc).map_err(|e| {
                GraphError::serialization("Failed to serialize snapshot", Some(e))
            })?;
            write_export(dir.join(file), &contents)?;
        }

        info!(
            "Wrote snapshot of {} nodes and {} edges to {dir:?}",
            nodes.len(),
            edges.len()
        );
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GraphStore for EmbeddedGraphStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    fn upsert_node(&self, id: NodeId, data: NodeData, metadata: Metadata) -> Result<Node> {
        id.validate_for(data.kind())?;
        debug!("Upserting node: id={id}, kind={}", data.kind());

        let mut inner = self.write();
        let existing = inner.nodes.get(&id).map(|n| n.created_at);
        let mut node = Node::new(id, data, metadata);
        if let Some(created_at) = existing {
            node.created_at = created_at;
        }

        let count = inner.nodes.len() + usize::from(existing.is_none());
        let value = serde_json::to_vec(&node)
            .map_err(|e| GraphError::serialization("Failed to serialize node", Some(e)))?;
        inner.storage.write_batch(vec![
            BatchOperation::Put {
                key: node_key(&node.id),
                value,
            },
            CollectionHeader::now(count).to_operation(NODES_HEADER)?,
        ])?;

        inner.nodes.insert(node.id.clone(), node.clone());
        trace!("Node {} stored", node.id);
        Ok(node)
    }

    fn upsert_edge(
        &self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        attributes: EdgeAttributes,
        metadata: Metadata,
    ) -> Result<Edge> {
        validate_endpoint(&from)?;
        validate_endpoint(&to)?;
        debug!("Upserting edge: from={from}, to={to}, kind={kind}");

        let mut inner = self.write();
        for endpoint in [&from, &to] {
            if !inner.nodes.contains_key(endpoint) {
                return Err(missing_endpoint(&from, kind, &to, endpoint));
            }
        }

        let key = EdgeKey::new(from.clone(), kind, to.clone());
        let existing = inner.edges.get(&key).map(|e| e.created_at);
        let mut edge = Edge::new(from, to, kind, attributes, metadata);
        if let Some(created_at) = existing {
            edge.created_at = created_at;
        }

        let count = inner.edges.len() + usize::from(existing.is_none());
        let value = serde_json::to_vec(&edge)
            .map_err(|e| GraphError::serialization("Failed to serialize edge", Some(e)))?;
        inner.storage.write_batch(vec![
            BatchOperation::Put {
                key: edge_key(&key),
                value,
            },
            CollectionHeader::now(count).to_operation(EDGES_HEADER)?,
        ])?;

        inner.index_edge(edge.clone());
        trace!("Edge {} -[{}]-> {} stored", edge.from, edge.kind, edge.to);
        Ok(edge)
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        Ok(self.read().nodes.get(id).cloned())
    }

    fn neighbors(&self, id: &NodeId, direction: Direction) -> Result<Vec<NodeId>> {
        let inner = self.read();
        let mut neighbors = BTreeSet::new();

        if matches!(direction, Direction::Outgoing | Direction::Both) {
            if let Some(out_edges) = inner.adjacency_out.get(id) {
                neighbors.extend(out_edges.iter().map(|key| key.to.clone()));
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            if let Some(in_edges) = inner.adjacency_in.get(id) {
                neighbors.extend(in_edges.iter().map(|key| key.from.clone()));
            }
        }

        Ok(neighbors.into_iter().collect())
    }

    fn edges_from(&self, id: &NodeId) -> Result<Vec<Edge>> {
        let inner = self.read();
        Ok(match inner.adjacency_out.get(id) {
            Some(keys) => inner.sorted_edges(keys),
            None => Vec::new(),
        })
    }

    fn all_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.read().all_nodes())
    }

    fn all_edges(&self) -> Result<Vec<Edge>> {
        Ok(self.read().all_edges())
    }

    fn clear(&self) -> Result<()> {
        let mut inner = self.write();
        info!(
            "Clearing embedded graph ({} nodes, {} edges)",
            inner.nodes.len(),
            inner.edges.len()
        );

        let mut operations: Vec<BatchOperation> = inner
            .nodes
            .keys()
            .map(|id| BatchOperation::Delete { key: node_key(id) })
            .chain(
                inner
                    .edges
                    .keys()
                    .map(|key| BatchOperation::Delete { key: edge_key(key) }),
            )
            .collect();
        operations.push(CollectionHeader::now(0).to_operation(NODES_HEADER)?);
        operations.push(CollectionHeader::now(0).to_operation(EDGES_HEADER)?);
        inner.storage.write_batch(operations)?;

        inner.nodes.clear();
        inner.edges.clear();
        inner.adjacency_out.clear();
        inner.adjacency_in.clear();
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        debug!("Flushing embedded graph to disk");
        self.write().storage.flush()?;
        trace!("Flush complete");
        Ok(())
    }

    fn stats(&self) -> Result<GraphStats> {
        Ok(self.read().stats())
    }

    fn snapshot(&self) -> Result<GraphSnapshot> {
        let inner = self.read();
        Ok(GraphSnapshot {
            nodes: inner.all_nodes(),
            edges: inner.all_edges(),
        })
    }
}
