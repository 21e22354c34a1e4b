//! Integration tests for migrating legacy snapshot layouts into the embedded store.

use apexgraph::{
    EdgeKind, EmbeddedGraphStore, GraphStore, MemoryBackend, NodeId, NodeKind,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn open(dir: &std::path::Path) -> EmbeddedGraphStore {
    EmbeddedGraphStore::open_with_backend(dir, Box::new(MemoryBackend::new())).unwrap()
}

#[test]
fn test_two_file_snapshot() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("entities.json"),
        json!({
            "metadata": {"timestamp": "2024-05-01T08:00:00", "total_entities": 3},
            "entities": {
                "lwc:widget": {"type": "LWCComponent", "name": "widget", "fileName": "widget.js",
                               "repository": "core", "repositoryId": 3},
                "class:Svc": {"type": "ApexClassPlaceholder", "name": "Svc", "placeholder": true,
                              "reason": "referenced before ingestion"},
                "dep:lwc": {"type": "Dependency", "source": "lwc"}
            }
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.path().join("relations.json"),
        json!({
            "metadata": {"total_relations": 3},
            "relations": [
                {"from": "lwc:widget", "to": "class:Svc", "type": "DEPENDS_ON_APEX_CLASS"},
                {"from": "lwc:widget", "to": "dep:lwc", "type": "IMPORTS_FROM",
                 "properties": {"specifiers": ["LightningElement"], "import_path": "lwc"}},
                {"from": "lwc:widget", "to": "class:Gone", "type": "DEPENDS_ON_APEX_CLASS"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let store = open(dir.path());
    assert_eq!(store.node_count(), 3);
    // The edge to a missing node is dropped
    assert_eq!(store.edge_count(), 2);

    let widget = store.get_node(&NodeId::lwc("widget")).unwrap().unwrap();
    assert_eq!(widget.metadata.get("repository"), Some("core"));
    assert_eq!(widget.metadata.get("repositoryId"), Some("3"));

    let placeholders = store.unresolved_placeholders().unwrap();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].kind(), NodeKind::ApexClassPlaceholder);

    let stats = store.stats().unwrap();
    assert_eq!(stats.edges_of(EdgeKind::ImportsFrom), 1);
}

#[test]
fn test_one_file_per_entity() {
    let dir = TempDir::new().unwrap();
    let entities = dir.path().join("entities");
    let relations = dir.path().join("relations");
    fs::create_dir_all(&entities).unwrap();
    fs::create_dir_all(&relations).unwrap();

    fs::write(
        entities.join("class_Foo.json"),
        json!({"node_id": "class:Foo", "attributes": {"type": "ApexClass", "name": "Foo"}})
            .to_string(),
    )
    .unwrap();
    fs::write(
        entities.join("method_Foo.bar.json"),
        json!({"node_id": "method:Foo.bar",
               "attributes": {"type": "ApexMethod", "canonicalName": "Foo.bar", "name": "bar"}})
            .to_string(),
    )
    .unwrap();
    fs::write(entities.join("broken.json"), "{not json").unwrap();
    fs::write(
        relations.join("0.json"),
        json!({"from_node": "class:Foo", "to_node": "method:Foo.bar", "type": "HAS_METHOD"})
            .to_string(),
    )
    .unwrap();

    let store = open(dir.path());
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.edge_count(), 1);
    assert_eq!(
        store.neighbors(&NodeId::apex_class("Foo"), apexgraph::Direction::Outgoing).unwrap(),
        vec![NodeId::apex_method("Foo", "bar")]
    );
}

#[test]
fn test_legacy_ignored_when_store_has_nodes() {
    let dir = TempDir::new().unwrap();
    let backend = MemoryBackend::new();

    // First open migrates, and the backend keeps the result
    fs::write(
        dir.path().join("graph_data.json"),
        json!({"entities": {"class:Foo": {"type": "ApexClass", "name": "Foo"}}, "relations": []})
            .to_string(),
    )
    .unwrap();
    let store =
        EmbeddedGraphStore::open_with_backend(dir.path(), Box::new(backend.clone())).unwrap();
    assert_eq!(store.node_count(), 1);
    store.clear().unwrap();
    store
        .upsert_node(
            NodeId::apex_class("Bar"),
            apexgraph::NodeData::class_placeholder("Bar", "test"),
            apexgraph::Metadata::new(),
        )
        .unwrap();
    drop(store);

    let reopened = EmbeddedGraphStore::open_with_backend(dir.path(), Box::new(backend)).unwrap();
    assert_eq!(reopened.node_count(), 1);
    assert!(reopened.get_node(&NodeId::apex_class("Foo")).unwrap().is_none());
}

#[test]
fn test_malformed_legacy_file_fails_open() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("graph_data.json"), "{truncated").unwrap();

    let result = EmbeddedGraphStore::open_with_backend(dir.path(), Box::new(MemoryBackend::new()));
    assert!(result.is_err());
}
