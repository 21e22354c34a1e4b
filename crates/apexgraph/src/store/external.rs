//! External graph store backed by Neo4j.
//!
//! Nodes are `(:CodeNode {id, kind, createdAt, attributes, metadata,
//! repository, repositoryId})` with attributes and metadata stored as JSON
//! text. Edges use the [`EdgeKind`] name as relationship type. Every write is a
//! `MERGE` on the same keys the embedded store uses, so both stores hold the
//! same `(id, kind)` pairs and the same `(from, kind, to)` triples.

use super::cypher::{CypherResponse, CypherStatement, CypherTransport, EXTERNAL_BACKEND};
use super::{validate_endpoint, GraphStore};
use crate::error::{GraphError, Result};
use crate::graph::{
    Direction, Edge, EdgeAttributes, EdgeKind, Metadata, Node, NodeData, NodeId, NodeKind,
    REPOSITORY_ID_KEY, REPOSITORY_KEY,
};
use chrono::{DateTime, Utc};
use log::{debug, info, trace};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Statement texts sent by [`ExternalGraphStore`].
pub mod statements {
    use crate::graph::EdgeKind;

    /// Availability probe.
    pub const PING: &str = "RETURN 1 AS ok";

    /// Match-or-create a node by id, replacing its attributes.
    pub const MERGE_NODE: &str = "MERGE (n:CodeNode {id: $id}) \
        ON CREATE SET n.createdAt = $createdAt \
        SET n.kind = $kind, n.attributes = $attributes, n.metadata = $metadata, \
        n.repository = $repository, n.repositoryId = $repositoryId \
        RETURN n.id AS id, n.kind AS kind, n.attributes AS attributes, \
        n.metadata AS metadata, n.createdAt AS createdAt";

    /// Fetch one node.
    pub const GET_NODE: &str = "MATCH (n:CodeNode {id: $id}) \
        RETURN n.id AS id, n.kind AS kind, n.attributes AS attributes, \
        n.metadata AS metadata, n.createdAt AS createdAt";

    /// Fetch every node.
    pub const ALL_NODES: &str = "MATCH (n:CodeNode) \
        RETURN n.id AS id, n.kind AS kind, n.attributes AS attributes, \
        n.metadata AS metadata, n.createdAt AS createdAt ORDER BY id";

    /// Fetch every edge.
    pub const ALL_EDGES: &str = "MATCH (a:CodeNode)-[r]->(b:CodeNode) \
        RETURN a.id AS from, b.id AS to, type(r) AS kind, r.attributes AS attributes, \
        r.metadata AS metadata, r.createdAt AS createdAt ORDER BY from, kind, to";

    /// Fetch the outgoing edges of one node.
    pub const EDGES_FROM: &str = "MATCH (a:CodeNode {id: $id})-[r]->(b:CodeNode) \
        RETURN a.id AS from, b.id AS to, type(r) AS kind, r.attributes AS attributes, \
        r.metadata AS metadata, r.createdAt AS createdAt ORDER BY kind, to";

    /// Successors of one node.
    pub const NEIGHBORS_OUT: &str =
        "MATCH (a:CodeNode {id: $id})-->(b:CodeNode) RETURN DISTINCT b.id AS id ORDER BY id";

    /// Predecessors of one node.
    pub const NEIGHBORS_IN: &str =
        "MATCH (a:CodeNode {id: $id})<--(b:CodeNode) RETURN DISTINCT b.id AS id ORDER BY id";

    /// Successors and predecessors of one node.
    pub const NEIGHBORS_BOTH: &str =
        "MATCH (a:CodeNode {id: $id})--(b:CodeNode) RETURN DISTINCT b.id AS id ORDER BY id";

    /// Remove every code node and its relationships.
    pub const CLEAR: &str = "MATCH (n:CodeNode) DETACH DELETE n";

    /// Match-or-create an edge between two existing nodes.
    ///
    /// Relationship types cannot be parameters, so the kind is part of the
    /// text. Returns no row when an endpoint is missing.
    pub fn merge_edge(kind: EdgeKind) -> String {
        format!(
            "MATCH (a:CodeNode {{id: $from}}), (b:CodeNode {{id: $to}}) \
             MERGE (a)-[r:{kind}]->(b) \
             ON CREATE SET r.createdAt = $createdAt \
             SET r.attributes = $attributes, r.metadata = $metadata \
             RETURN a.id AS from, b.id AS to, type(r) AS kind, r.attributes AS attributes, \
             r.metadata AS metadata, r.createdAt AS createdAt"
        )
    }
}

/// Graph store adapter for a remote Neo4j database.
pub struct ExternalGraphStore {
    transport: Box<dyn CypherTransport>,
    // Single writer per store instance
    write_lock: Mutex<()>,
}

impl ExternalGraphStore {
    /// Wrap a transport. Does not contact the server.
    pub fn new(transport: Box<dyn CypherTransport>) -> Self {
        Self {
            transport,
            write_lock: Mutex::new(()),
        }
    }

    /// Build the transport selected by `config.uri` and probe the server.
    ///
    /// `memory://` selects a fresh [`MemoryTransport`](super::MemoryTransport);
    /// anything else is a Bolt URI (`bolt://`, `neo4j://`).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Backend`] if the server does not answer the probe.
    pub fn connect(config: &crate::config::Neo4jConfig) -> Result<Self> {
        let transport: Box<dyn CypherTransport> = if config.uri.starts_with("memory:") {
            Box::new(super::MemoryTransport::new())
        } else {
            Self::bolt_transport(config)?
        };

        let store = Self::new(transport);
        store.ping()?;
        info!("Connected to external graph at {}", config.uri);
        Ok(store)
    }

    #[cfg(feature = "neo4j-bolt")]
    fn bolt_transport(config: &crate::config::Neo4jConfig) -> Result<Box<dyn CypherTransport>> {
        Ok(Box::new(super::cypher::BoltTransport::connect(config)?))
    }

    #[cfg(not(feature = "neo4j-bolt"))]
    fn bolt_transport(config: &crate::config::Neo4jConfig) -> Result<Box<dyn CypherTransport>> {
        Err(GraphError::Config {
            message: format!(
                "cannot reach {}: built without the neo4j-bolt feature",
                config.uri
            ),
        })
    }

    /// Check that the server answers.
    pub fn ping(&self) -> Result<()> {
        self.transport
            .run(&CypherStatement::new(statements::PING))
            .map(|_| ())
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn query_nodes(&self, statement: CypherStatement) -> Result<Vec<Node>> {
        let response = self.transport.run(&statement)?;
        response.rows.iter().map(|row| node_from_row(row)).collect()
    }

    fn query_edges(&self, statement: CypherStatement) -> Result<Vec<Edge>> {
        let response = self.transport.run(&statement)?;
        response.rows.iter().map(|row| edge_from_row(row)).collect()
    }
}

fn to_json_text<T: serde::Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| GraphError::serialization(format!("Failed to serialize {what}"), Some(e)))
}

fn column<'a>(row: &'a [Value], index: usize, name: &str) -> Result<&'a Value> {
    row.get(index).ok_or_else(|| {
        GraphError::backend(EXTERNAL_BACKEND, format!("row is missing column '{name}'"))
    })
}

fn str_column<'a>(row: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    column(row, index, name)?.as_str().ok_or_else(|| {
        GraphError::backend(EXTERNAL_BACKEND, format!("column '{name}' is not a string"))
    })
}

/// JSON-text column; a missing or null value decodes to `Value::Null`.
fn json_column(row: &[Value], index: usize, name: &str) -> Result<Value> {
    match row.get(index) {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(Value::String(text)) => serde_json::from_str(text).map_err(|e| {
            GraphError::serialization(format!("Column '{name}' is not valid JSON"), Some(e))
        }),
        Some(other) => Ok(other.clone()),
    }
}

fn timestamp_column(row: &[Value], index: usize) -> Result<DateTime<Utc>> {
    match row.get(index).and_then(Value::as_str) {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| GraphError::serialization("Invalid createdAt timestamp", Some(e))),
        None => Ok(Utc::now()),
    }
}

fn metadata_from(value: Value) -> Result<Metadata> {
    match value {
        Value::Null => Ok(Metadata::new()),
        other => serde_json::from_value(other)
            .map_err(|e| GraphError::serialization("Invalid metadata", Some(e))),
    }
}

/// Row layout: `id, kind, attributes, metadata, createdAt`.
fn node_from_row(row: &[Value]) -> Result<Node> {
    let id = NodeId::new(str_column(row, 0, "id")?);
    let kind: NodeKind = str_column(row, 1, "kind")?.parse()?;
    let data = NodeData::from_parts(kind, json_column(row, 2, "attributes")?)?;
    let metadata = metadata_from(json_column(row, 3, "metadata")?)?;

    let mut node = Node::new(id, data, metadata);
    node.created_at = timestamp_column(row, 4)?;
    Ok(node)
}

/// Row layout: `from, to, kind, attributes, metadata, createdAt`.
fn edge_from_row(row: &[Value]) -> Result<Edge> {
    let from = NodeId::new(str_column(row, 0, "from")?);
    let to = NodeId::new(str_column(row, 1, "to")?);
    let kind: EdgeKind = str_column(row, 2, "kind")?.parse()?;
    let attributes: EdgeAttributes = match json_column(row, 3, "attributes")? {
        Value::Null => EdgeAttributes::default(),
        other => serde_json::from_value(other)
            .map_err(|e| GraphError::serialization("Invalid edge attributes", Some(e)))?,
    };
    let metadata = metadata_from(json_column(row, 4, "metadata")?)?;

    let mut edge = Edge::new(from, to, kind, attributes, metadata);
    edge.created_at = timestamp_column(row, 5)?;
    Ok(edge)
}

fn first_row<'a>(response: &'a CypherResponse, what: &str) -> Result<&'a [Value]> {
    response.rows.first().map(Vec::as_slice).ok_or_else(|| {
        GraphError::backend(EXTERNAL_BACKEND, format!("{what} returned no row"))
    })
}

impl GraphStore for ExternalGraphStore {
    fn backend_name(&self) -> &'static str {
        EXTERNAL_BACKEND
    }

    fn upsert_node(&self, id: NodeId, data: NodeData, metadata: Metadata) -> Result<Node> {
        id.validate_for(data.kind())?;
        debug!("Merging external node: id={id}, kind={}", data.kind());

        let statement = CypherStatement::new(statements::MERGE_NODE)
            .param("id", id.as_str())
            .param("kind", data.kind().as_str())
            .param("createdAt", Utc::now().to_rfc3339())
            .param("attributes", to_json_text(&data.attributes_json(), "attributes")?)
            .param("metadata", to_json_text(&metadata, "metadata")?)
            .param("repository", metadata.get(REPOSITORY_KEY))
            .param("repositoryId", metadata.get(REPOSITORY_ID_KEY));

        let _guard = self.lock_writes();
        let response = self.transport.run(&statement)?;
        let node = node_from_row(first_row(&response, "node merge")?)?;
        trace!("External node {} merged", node.id);
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
        debug!("Merging external edge: from={from}, to={to}, kind={kind}");

        let statement = CypherStatement::new(statements::merge_edge(kind))
            .param("from", from.as_str())
            .param("to", to.as_str())
            .param("createdAt", Utc::now().to_rfc3339())
            .param("attributes", to_json_text(&attributes, "edge attributes")?)
            .param("metadata", to_json_text(&metadata, "metadata")?);

        let _guard = self.lock_writes();
        let response = self.transport.run(&statement)?;
        match response.rows.first() {
            Some(row) => edge_from_row(row),
            None => Err(GraphError::validation(format!(
                "cannot create {kind} edge {from} -> {to}: an endpoint does not exist"
            ))),
        }
    }

    fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        let mut nodes =
            self.query_nodes(CypherStatement::new(statements::GET_NODE).param("id", id.as_str()))?;
        Ok(nodes.pop())
    }

    fn neighbors(&self, id: &NodeId, direction: Direction) -> Result<Vec<NodeId>> {
        let text = match direction {
            Direction::Outgoing => statements::NEIGHBORS_OUT,
            Direction::Incoming => statements::NEIGHBORS_IN,
            Direction::Both => statements::NEIGHBORS_BOTH,
        };
        let response = self
            .transport
            .run(&CypherStatement::new(text).param("id", id.as_str()))?;
        response
            .rows
            .iter()
            .map(|row| str_column(row, 0, "id").map(NodeId::new))
            .collect()
    }

    fn edges_from(&self, id: &NodeId) -> Result<Vec<Edge>> {
        self.query_edges(CypherStatement::new(statements::EDGES_FROM).param("id", id.as_str()))
    }

    fn all_nodes(&self) -> Result<Vec<Node>> {
        self.query_nodes(CypherStatement::new(statements::ALL_NODES))
    }

    fn all_edges(&self) -> Result<Vec<Edge>> {
        self.query_edges(CypherStatement::new(statements::ALL_EDGES))
    }

    fn clear(&self) -> Result<()> {
        info!("Clearing external graph");
        let _guard = self.lock_writes();
        self.transport
            .run(&CypherStatement::new(statements::CLEAR))
            .map(|_| ())
    }

    fn persist(&self) -> Result<()> {
        // The server commits every statement
        Ok(())
    }
}
