//! JSON snapshot export and re-import.
//!
//! Node shape: `{id, kind, attributes, metadata, createdAt}`.
//! Edge shape: `{from, to, kind, attributes, metadata, createdAt}`.

use crate::error::{GraphError, Result};
use crate::graph::{Edge, EdgeAttributes, EdgeKind, GraphSnapshot, Metadata, Node, NodeData, NodeId, NodeKind};
use crate::store::GraphStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Export a snapshot as pretty-printed JSON.
pub fn to_json(snapshot: &GraphSnapshot) -> Result<String> {
    let nodes: Vec<Value> = snapshot.nodes.iter().map(node_to_json).collect();
    let edges: Vec<Value> = snapshot.edges.iter().map(edge_to_json).collect();

    serde_json::to_string_pretty(&json!({
        "nodes": nodes,
        "edges": edges,
    }))
    .map_err(|e| GraphError::serialization("Failed to serialize graph export", Some(e)))
}

/// Convert node to JSON object
fn node_to_json(node: &Node) -> Value {
    json!({
        "id": node.id,
        "kind": node.kind(),
        "attributes": node.data.attributes_json(),
        "metadata": node.metadata,
        "createdAt": node.created_at,
    })
}

/// Convert edge to JSON object
fn edge_to_json(edge: &Edge) -> Value {
    json!({
        "from": edge.from,
        "to": edge.to,
        "kind": edge.kind,
        "attributes": edge.attributes,
        "metadata": edge.metadata,
        "createdAt": edge.created_at,
    })
}

#[derive(Debug, Deserialize)]
struct ExportDocument {
    #[serde(default)]
    nodes: Vec<ExportedNode>,
    #[serde(default)]
    edges: Vec<ExportedEdge>,
}

#[derive(Debug, Deserialize)]
struct ExportedNode {
    id: NodeId,
    kind: NodeKind,
    #[serde(default)]
    attributes: Value,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct ExportedEdge {
    from: NodeId,
    to: NodeId,
    kind: EdgeKind,
    #[serde(default)]
    attributes: EdgeAttributes,
    #[serde(default)]
    metadata: Metadata,
}

/// Outcome of [`import_json`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Nodes upserted
    pub nodes: usize,
    /// Edges upserted
    pub edges: usize,
    /// Nodes or edges the store rejected
    pub rejected: usize,
}

/// Re-upsert every node, then every edge, of a JSON export into `store`.
///
/// Entries the store rejects (bad id, missing endpoint) are counted and
/// skipped; the rest of the document is still imported.
///
/// # Errors
///
/// Returns [`GraphError::Serialization`] if the document is not a valid export,
/// and any non-validation error raised by the store.
pub fn import_json(store: &dyn GraphStore, text: &str) -> Result<ImportSummary> {
    let document: ExportDocument = serde_json::from_str(text)
        .map_err(|e| GraphError::serialization("Invalid graph export", Some(e)))?;

    let mut summary = ImportSummary::default();

    for node in document.nodes {
        let data = NodeData::from_parts(node.kind, node.attributes)?;
        match store.upsert_node(node.id.clone(), data, node.metadata) {
            Ok(_) => summary.nodes += 1,
            Err(GraphError::Validation { message }) => {
                warn!("Skipping node {}: {message}", node.id);
                summary.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for edge in document.edges {
        match store.upsert_edge(edge.from, edge.to, edge.kind, edge.attributes, edge.metadata) {
            Ok(_) => summary.edges += 1,
            Err(GraphError::Validation { message }) => {
                warn!("Skipping edge: {message}");
                summary.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Imported {} nodes and {} edges ({} rejected)",
        summary.nodes, summary.edges, summary.rejected
    );
    Ok(summary)
}
