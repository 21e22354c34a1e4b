//! Readers for snapshot layouts written by earlier versions of the graph data
//! directory. They are only read, never written.
//!
//! Three layouts are recognised, checked in this order:
//! 1. `entities.json` + `relations.json`
//! 2. `graph_data.json` holding both collections
//! 3. `entities/*.json` + `relations/*.json`, one file per node or edge
//!
//! Legacy nodes keep their kind in a `type` attribute and their timestamp in
//! `created_at`; both are lifted out before the rest is decoded into typed
//! attributes.

use crate::error::{GraphError, Result};
use crate::graph::{
    Edge, EdgeAttributes, EdgeKind, Metadata, Node, NodeData, NodeId, NodeKind,
    REPOSITORY_ID_KEY, REPOSITORY_KEY,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub(crate) const ENTITIES_FILE: &str = "entities.json";
pub(crate) const RELATIONS_FILE: &str = "relations.json";
pub(crate) const COMBINED_FILE: &str = "graph_data.json";
pub(crate) const ENTITIES_DIR: &str = "entities";
pub(crate) const RELATIONS_DIR: &str = "relations";

/// Nodes and edges recovered from a legacy layout.
#[derive(Debug, Default)]
pub(crate) struct LegacyGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub layout: &'static str,
}

/// Load the first legacy layout present in `dir`, if any.
///
/// # Errors
///
/// Returns an error if a top-level legacy file exists but cannot be read or
/// parsed. Unreadable entries inside a layout are skipped with a warning.
pub(crate) fn load(dir: &Path) -> Result<Option<LegacyGraph>> {
    let entities_file = dir.join(ENTITIES_FILE);
    if entities_file.is_file() {
        let entities = read_json(&entities_file)?;
        let relations_file = dir.join(RELATIONS_FILE);
        let relations = if relations_file.is_file() {
            read_json(&relations_file)?
        } else {
            Value::Null
        };
        return Ok(Some(from_collections(
            entities.get("entities"),
            relations.get("relations"),
            "entities.json + relations.json",
        )));
    }

    let combined_file = dir.join(COMBINED_FILE);
    if combined_file.is_file() {
        let combined = read_json(&combined_file)?;
        return Ok(Some(from_collections(
            combined.get("entities"),
            combined.get("relations"),
            "graph_data.json",
        )));
    }

    let entities_dir = dir.join(ENTITIES_DIR);
    if entities_dir.is_dir() {
        return Ok(Some(from_entity_files(&entities_dir, &dir.join(RELATIONS_DIR))?));
    }

    Ok(None)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| {
        GraphError::storage(format!("Failed to read legacy snapshot {path:?}"), Some(e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        GraphError::serialization(format!("Failed to parse legacy snapshot {path:?}"), Some(e))
    })
}

fn from_collections(
    entities: Option<&Value>,
    relations: Option<&Value>,
    layout: &'static str,
) -> LegacyGraph {
    let mut graph = LegacyGraph {
        layout,
        ..Default::default()
    };

    if let Some(Value::Object(entities)) = entities {
        for (id, entry) in entities {
            push_node(&mut graph, Some(id), entry);
        }
    }

    if let Some(Value::Array(relations)) = relations {
        for entry in relations {
            push_edge(&mut graph, entry);
        }
    }

    graph
}

fn from_entity_files(entities_dir: &Path, relations_dir: &Path) -> Result<LegacyGraph> {
    let mut graph = LegacyGraph {
        layout: "entities/ + relations/",
        ..Default::default()
    };

    for path in json_files(entities_dir)? {
        match read_json(&path) {
            Ok(entry) => push_node(&mut graph, None, &entry),
            Err(e) => warn!("Skipping legacy entity file {path:?}: {e}"),
        }
    }

    if relations_dir.is_dir() {
        for path in json_files(relations_dir)? {
            match read_json(&path) {
                Ok(entry) => push_edge(&mut graph, &entry),
                Err(e) => warn!("Skipping legacy relation file {path:?}: {e}"),
            }
        }
    }

    Ok(graph)
}

fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| GraphError::storage(format!("Failed to list {dir:?}"), Some(e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Accepts both `{node_id, attributes: {...}}` wrappers and bare attribute maps.
fn push_node(graph: &mut LegacyGraph, key: Option<&String>, entry: &Value) {
    let attributes = match entry.get("attributes") {
        Some(Value::Object(attrs)) => attrs.clone(),
        _ => match entry {
            Value::Object(attrs) => attrs.clone(),
            _ => Map::new(),
        },
    };
    let id = entry
        .get("node_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| key.cloned());

    let Some(id) = id else {
        warn!("Skipping legacy entity without an id");
        return;
    };

    match convert_node(NodeId::new(id.clone()), attributes) {
        Ok(node) => graph.nodes.push(node),
        Err(e) => warn!("Skipping legacy entity '{id}': {e}"),
    }
}

fn convert_node(id: NodeId, mut attributes: Map<String, Value>) -> Result<Node> {
    let kind: NodeKind = attributes
        .remove("type")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| GraphError::validation("missing 'type' attribute"))?
        .parse()?;
    id.validate_for(kind)?;

    let created_at = attributes
        .remove("created_at")
        .and_then(|v| v.as_str().and_then(parse_timestamp));
    let metadata = take_repository(&mut attributes);
    let data = NodeData::from_parts(kind, Value::Object(attributes))?;

    let mut node = Node::new(id, data, metadata);
    if let Some(created_at) = created_at {
        node.created_at = created_at;
    }
    Ok(node)
}

/// Accepts `from`/`to`, `from_node`/`to_node` and `source`/`target` endpoint names.
fn push_edge(graph: &mut LegacyGraph, entry: &Value) {
    let endpoint = |names: [&str; 3]| {
        names
            .iter()
            .find_map(|name| entry.get(*name).and_then(Value::as_str))
            .map(NodeId::from)
    };
    let from = endpoint(["from", "from_node", "source"]);
    let to = endpoint(["to", "to_node", "target"]);
    let kind = entry
        .get("type")
        .and_then(Value::as_str)
        .map(str::parse::<EdgeKind>);

    let (Some(from), Some(to), Some(Ok(kind))) = (from, to, kind) else {
        warn!("Skipping legacy relation with missing endpoints or unknown type: {entry}");
        return;
    };

    let mut properties = match entry.get("properties") {
        Some(Value::Object(props)) => props.clone(),
        _ => Map::new(),
    };
    properties.remove("type");
    let created_at = properties
        .remove("created_at")
        .and_then(|v| v.as_str().and_then(parse_timestamp));
    let metadata = take_repository(&mut properties);
    let attributes: EdgeAttributes =
        serde_json::from_value(Value::Object(properties)).unwrap_or_default();

    let mut edge = Edge::new(from, to, kind, attributes, metadata);
    if let Some(created_at) = created_at {
        edge.created_at = created_at;
    }
    debug!("Recovered legacy {kind} edge {} -> {}", edge.from, edge.to);
    graph.edges.push(edge);
}

fn take_repository(attributes: &mut Map<String, Value>) -> Metadata {
    let mut metadata = Metadata::new();
    for key in [REPOSITORY_KEY, REPOSITORY_ID_KEY] {
        if let Some(value) = attributes.remove(key) {
            match value {
                Value::String(s) => metadata.insert(key, s),
                Value::Null => {}
                other => metadata.insert(key, other.to_string()),
            }
        }
    }
    metadata
}

/// Legacy timestamps are naive local ISO-8601 strings; RFC 3339 is accepted too.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
