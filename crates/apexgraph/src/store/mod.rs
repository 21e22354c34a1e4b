//! Graph stores: the capability interface shared by every backend.
//!
//! - [`EmbeddedGraphStore`]: in-process graph over a key-value [`StorageBackend`](crate::storage::StorageBackend)
//! - [`ExternalGraphStore`]: remote Neo4j reached through a [`CypherTransport`]
//!
//! Both backends enforce the same invariants: ids are validated against the
//! node kind, edges are keyed by `(from, kind, to)` and both endpoints must
//! exist, and `createdAt` survives re-upserts.

mod cypher;
mod embedded;
mod external;
mod legacy;
mod memory_transport;

pub use cypher::{return_columns, CypherResponse, CypherStatement, CypherTransport};
#[cfg(feature = "neo4j-bolt")]
pub use cypher::BoltTransport;
pub use embedded::{EmbeddedGraphStore, SCHEMA_VERSION};
pub use external::{statements, ExternalGraphStore};
pub use memory_transport::MemoryTransport;

use crate::error::{GraphError, Result};
use crate::graph::{
    sanitize_part, Direction, Edge, EdgeAttributes, EdgeKind, GraphSnapshot, GraphStats,
    Metadata, Node, NodeData, NodeId,
};
use std::collections::HashSet;

/// Storage capability implemented by the embedded and the external backend.
///
/// All methods take `&self`; implementations serialize writers internally.
pub trait GraphStore: Send + Sync {
    /// Short backend name used in error reports (`local` or `external`).
    fn backend_name(&self) -> &'static str;

    /// Insert or replace the node stored under `id`.
    ///
    /// Attributes and metadata are replaced wholesale; `createdAt` of an
    /// existing node is kept.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] if `id` does not fit `data`'s kind.
    fn upsert_node(&self, id: NodeId, data: NodeData, metadata: Metadata) -> Result<Node>;

    /// Insert or replace the edge keyed by `(from, kind, to)`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] if either endpoint does not exist.
    fn upsert_edge(
        &self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        attributes: EdgeAttributes,
        metadata: Metadata,
    ) -> Result<Edge>;

    /// Look up a node; `Ok(None)` when it does not exist.
    fn get_node(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Distinct neighbor ids of a node in the given direction.
    ///
    /// An unknown node has no neighbors.
    fn neighbors(&self, id: &NodeId, direction: Direction) -> Result<Vec<NodeId>>;

    /// Outgoing edges of a node.
    fn edges_from(&self, id: &NodeId) -> Result<Vec<Edge>>;

    /// Every node.
    fn all_nodes(&self) -> Result<Vec<Node>>;

    /// Every edge.
    fn all_edges(&self) -> Result<Vec<Edge>>;

    /// Remove every node and edge.
    fn clear(&self) -> Result<()>;

    /// Flush pending writes to durable storage.
    fn persist(&self) -> Result<()>;

    /// Node and edge counts per kind.
    fn stats(&self) -> Result<GraphStats> {
        Ok(self.snapshot()?.stats())
    }

    /// Whole graph as an owned snapshot.
    fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(GraphSnapshot {
            nodes: self.all_nodes()?,
            edges: self.all_edges()?,
        })
    }

    /// A class node, its direct successors and the edges leading to them.
    /// The name is sanitized the same way ingestion builds class ids.
    ///
    /// Returns an empty snapshot when the class does not exist.
    fn class_graph(&self, class_name: &str) -> Result<GraphSnapshot> {
        let class_id = NodeId::apex_class(&sanitize_part(class_name));
        let Some(class_node) = self.get_node(&class_id)? else {
            return Ok(GraphSnapshot::empty());
        };

        let edges = self.edges_from(&class_id)?;
        let mut seen = HashSet::new();
        let mut nodes = vec![class_node];
        for edge in &edges {
            if seen.insert(edge.to.clone()) {
                if let Some(node) = self.get_node(&edge.to)? {
                    nodes.push(node);
                }
            }
        }

        Ok(GraphSnapshot { nodes, edges })
    }

    /// Placeholder nodes that no real upsert has filled in yet.
    fn unresolved_placeholders(&self) -> Result<Vec<Node>> {
        let mut placeholders: Vec<Node> = self
            .all_nodes()?
            .into_iter()
            .filter(Node::is_placeholder)
            .collect();
        placeholders.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(placeholders)
    }
}

/// Check an edge endpoint id before looking it up.
pub(crate) fn validate_endpoint(id: &NodeId) -> Result<()> {
    match id.prefix() {
        Some(prefix) if !prefix.is_empty() && id.as_str().len() > prefix.len() + 1 => Ok(()),
        _ => Err(GraphError::validation(format!(
            "edge endpoint '{id}' is not a valid node id"
        ))),
    }
}

/// Error for an edge whose endpoint is not stored.
pub(crate) fn missing_endpoint(from: &NodeId, kind: EdgeKind, to: &NodeId, missing: &NodeId) -> GraphError {
    GraphError::validation(format!(
        "cannot create {kind} edge {from} -> {to}: node '{missing}' does not exist"
    ))
}
