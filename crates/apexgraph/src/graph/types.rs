//! Core graph types: node and edge kinds, nodes, edges, snapshots and stats.

use super::attributes::{EdgeAttributes, NodeData};
use super::ids::NodeId;
use super::metadata::Metadata;
use crate::error::GraphError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Kind of a node in the code graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    /// Apex class (one per `.cls` file)
    ApexClass,
    /// Method of an Apex class
    ApexMethod,
    /// SOQL query inside an Apex method
    #[serde(rename = "SOQLQuery")]
    SoqlQuery,
    /// DML statement inside an Apex method
    #[serde(rename = "DMLOperation")]
    DmlOperation,
    /// Lightning Web Component (one per component script)
    #[serde(rename = "LWCComponent")]
    LwcComponent,
    /// Class declared in a component script
    JavaScriptClass,
    /// Method of a component script class
    JavaScriptMethod,
    /// Top-level function in a component script
    JavaScriptFunction,
    /// Imported module specifier
    Dependency,
    /// Stand-in for an Apex class referenced before it was ingested
    ApexClassPlaceholder,
    /// Stand-in for an Apex method referenced before it was ingested
    ApexMethodPlaceholder,
}

impl NodeKind {
    /// Every node kind, in declaration order.
    pub const ALL: [NodeKind; 11] = [
        NodeKind::ApexClass,
        NodeKind::ApexMethod,
        NodeKind::SoqlQuery,
        NodeKind::DmlOperation,
        NodeKind::LwcComponent,
        NodeKind::JavaScriptClass,
        NodeKind::JavaScriptMethod,
        NodeKind::JavaScriptFunction,
        NodeKind::Dependency,
        NodeKind::ApexClassPlaceholder,
        NodeKind::ApexMethodPlaceholder,
    ];

    /// Canonical name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::ApexClass => "ApexClass",
            NodeKind::ApexMethod => "ApexMethod",
            NodeKind::SoqlQuery => "SOQLQuery",
            NodeKind::DmlOperation => "DMLOperation",
            NodeKind::LwcComponent => "LWCComponent",
            NodeKind::JavaScriptClass => "JavaScriptClass",
            NodeKind::JavaScriptMethod => "JavaScriptMethod",
            NodeKind::JavaScriptFunction => "JavaScriptFunction",
            NodeKind::Dependency => "Dependency",
            NodeKind::ApexClassPlaceholder => "ApexClassPlaceholder",
            NodeKind::ApexMethodPlaceholder => "ApexMethodPlaceholder",
        }
    }

    /// Id prefix shared by this kind and its placeholder counterpart.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            NodeKind::ApexClass | NodeKind::ApexClassPlaceholder => "class",
            NodeKind::ApexMethod | NodeKind::ApexMethodPlaceholder => "method",
            NodeKind::SoqlQuery => "soql",
            NodeKind::DmlOperation => "dml",
            NodeKind::LwcComponent => "lwc",
            NodeKind::JavaScriptClass => "jsclass",
            NodeKind::JavaScriptMethod => "jsmethod",
            NodeKind::JavaScriptFunction => "jsfunc",
            NodeKind::Dependency => "dep",
        }
    }

    /// Minimum number of `.`-separated parts after the prefix.
    pub(crate) fn min_parts(&self) -> usize {
        match self {
            NodeKind::ApexClass
            | NodeKind::ApexClassPlaceholder
            | NodeKind::LwcComponent
            | NodeKind::Dependency => 1,
            NodeKind::ApexMethod
            | NodeKind::ApexMethodPlaceholder
            | NodeKind::JavaScriptClass
            | NodeKind::JavaScriptFunction => 2,
            NodeKind::SoqlQuery | NodeKind::JavaScriptMethod => 3,
            NodeKind::DmlOperation => 4,
        }
    }

    /// Whether this kind is a placeholder kind.
    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            NodeKind::ApexClassPlaceholder | NodeKind::ApexMethodPlaceholder
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GraphError::validation(format!("unknown node kind '{s}'")))
    }
}

/// Kind of edge (relationship) between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Class owns method (Apex or script)
    HasMethod,
    /// Apex method contains SOQL query
    ContainsSoql,
    /// Apex method contains DML operation
    ContainsDml,
    /// Component imports from a module specifier
    ImportsFrom,
    /// Component declares a class
    HasClass,
    /// Component declares a top-level function
    HasFunction,
    /// Component depends on an Apex class
    DependsOnApexClass,
    /// Component calls an Apex method
    CallsApexMethod,
}

impl EdgeKind {
    /// Every edge kind, in declaration order.
    pub const ALL: [EdgeKind; 8] = [
        EdgeKind::HasMethod,
        EdgeKind::ContainsSoql,
        EdgeKind::ContainsDml,
        EdgeKind::ImportsFrom,
        EdgeKind::HasClass,
        EdgeKind::HasFunction,
        EdgeKind::DependsOnApexClass,
        EdgeKind::CallsApexMethod,
    ];

    /// Canonical name, identical to the serialized form and the Cypher relationship type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::HasMethod => "HAS_METHOD",
            EdgeKind::ContainsSoql => "CONTAINS_SOQL",
            EdgeKind::ContainsDml => "CONTAINS_DML",
            EdgeKind::ImportsFrom => "IMPORTS_FROM",
            EdgeKind::HasClass => "HAS_CLASS",
            EdgeKind::HasFunction => "HAS_FUNCTION",
            EdgeKind::DependsOnApexClass => "DEPENDS_ON_APEX_CLASS",
            EdgeKind::CallsApexMethod => "CALLS_APEX_METHOD",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GraphError::validation(format!("unknown edge kind '{s}'")))
    }
}

/// Direction for neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Follow outgoing edges (from this node)
    Outgoing,
    /// Follow incoming edges (to this node)
    Incoming,
    /// Follow edges in both directions
    Both,
}

/// A node in the code graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Deterministic composite key
    pub id: NodeId,
    /// Kind-specific typed attributes
    pub data: NodeData,
    /// Backend and repository metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// First time this id was stored
    pub created_at: DateTime<Utc>,
}

impl Node {
    /// Create a node stamped with the current time.
    pub fn new(id: NodeId, data: NodeData, metadata: Metadata) -> Self {
        Self {
            id,
            data,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Kind of this node, derived from its attributes.
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Whether this node is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.data.is_placeholder()
    }
}

/// Dedup key of an edge: at most one edge per `(from, kind, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Source node
    pub from: NodeId,
    /// Relationship kind
    pub kind: EdgeKind,
    /// Target node
    pub to: NodeId,
}

impl EdgeKey {
    /// Build a key.
    pub fn new(from: NodeId, kind: EdgeKind, to: NodeId) -> Self {
        Self { from, kind, to }
    }
}

/// A directed edge in the code graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node ID
    pub from: NodeId,
    /// Target node ID
    pub to: NodeId,
    /// Type of relationship
    pub kind: EdgeKind,
    /// Import-derived attributes (empty for structural edges)
    #[serde(default)]
    pub attributes: EdgeAttributes,
    /// Backend and repository metadata
    #[serde(default)]
    pub metadata: Metadata,
    /// First time this key was stored
    pub created_at: DateTime<Utc>,
}

impl Edge {
    /// Create an edge stamped with the current time.
    pub fn new(
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        attributes: EdgeAttributes,
        metadata: Metadata,
    ) -> Self {
        Self {
            from,
            to,
            kind,
            attributes,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Dedup key of this edge.
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.from.clone(), self.kind, self.to.clone())
    }
}

/// Owned copy of (part of) a graph: what `FullGraph` and `ClassGraph` return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Nodes in the snapshot
    pub nodes: Vec<Node>,
    /// Edges in the snapshot
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Empty snapshot, returned when no backend can answer.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the snapshot holds no nodes and no edges.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Node counts, edge counts and totals for this snapshot.
    pub fn stats(&self) -> GraphStats {
        GraphStats::tally(
            self.nodes.iter().map(Node::kind),
            self.edges.iter().map(|e| e.kind),
        )
    }

    /// Sort nodes by id and edges by key so snapshots compare deterministically.
    pub fn sorted(mut self) -> Self {
        self.nodes.sort_by(|a, b| a.id.cmp(&b.id));
        self.edges.sort_by_key(|e| e.key());
        self
    }
}

/// Per-kind counts of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    /// Node count per kind (kinds with zero nodes are omitted)
    pub node_count_by_kind: BTreeMap<NodeKind, usize>,
    /// Edge count per kind (kinds with zero edges are omitted)
    pub edge_count_by_kind: BTreeMap<EdgeKind, usize>,
    /// Total number of nodes
    pub total_nodes: usize,
    /// Total number of edges
    pub total_edges: usize,
}

impl GraphStats {
    /// Count node and edge kinds.
    pub fn tally(
        node_kinds: impl IntoIterator<Item = NodeKind>,
        edge_kinds: impl IntoIterator<Item = EdgeKind>,
    ) -> Self {
        let mut stats = GraphStats::default();
        for kind in node_kinds {
            *stats.node_count_by_kind.entry(kind).or_default() += 1;
            stats.total_nodes += 1;
        }
        for kind in edge_kinds {
            *stats.edge_count_by_kind.entry(kind).or_default() += 1;
            stats.total_edges += 1;
        }
        stats
    }

    /// Number of nodes of one kind.
    pub fn nodes_of(&self, kind: NodeKind) -> usize {
        self.node_count_by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Number of edges of one kind.
    pub fn edges_of(&self, kind: EdgeKind) -> usize {
        self.edge_count_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
