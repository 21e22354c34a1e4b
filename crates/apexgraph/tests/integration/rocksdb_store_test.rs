//! Integration test for the RocksDB-backed embedded store across sessions.

use apexgraph::graph::{ApexClassAttributes, ApexMethodAttributes};
use apexgraph::{
    EdgeAttributes, EdgeKind, EmbeddedGraphStore, GraphStore, Metadata, NodeData, NodeId,
    NodeKind,
};
use tempfile::TempDir;

fn seed(store: &EmbeddedGraphStore) {
    store
        .upsert_node(
            NodeId::apex_class("Foo"),
            NodeData::ApexClass(ApexClassAttributes {
                name: "Foo".to_string(),
                file_name: "Foo.cls".to_string(),
                ..Default::default()
            }),
            Metadata::new().with("repository", "core").with("repositoryId", "7"),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::apex_method("Foo", "bar"),
            NodeData::ApexMethod(ApexMethodAttributes {
                canonical_name: "Foo.bar".to_string(),
                class_name: "Foo".to_string(),
                name: "bar".to_string(),
                ..Default::default()
            }),
            Metadata::new(),
        )
        .unwrap();
    store
        .upsert_edge(
            NodeId::apex_class("Foo"),
            NodeId::apex_method("Foo", "bar"),
            EdgeKind::HasMethod,
            EdgeAttributes::default(),
            Metadata::new(),
        )
        .unwrap();
}

#[test]
fn test_rocksdb_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("graphdata");

    let created_at;
    {
        let store = EmbeddedGraphStore::open(&data_dir).unwrap();
        seed(&store);
        store.persist().unwrap();
        created_at = store
            .get_node(&NodeId::apex_class("Foo"))
            .unwrap()
            .unwrap()
            .created_at;
    }

    // Reopen and verify data persisted
    {
        let store = EmbeddedGraphStore::open(&data_dir).unwrap();
        assert_eq!(store.node_count(), 2);
        assert_eq!(store.edge_count(), 1);

        let class = store.get_node(&NodeId::apex_class("Foo")).unwrap().unwrap();
        assert_eq!(class.kind(), NodeKind::ApexClass);
        assert_eq!(class.created_at, created_at);
        assert_eq!(class.metadata.get("repositoryId"), Some("7"));

        let edges = store.edges_from(&NodeId::apex_class("Foo")).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].kind, EdgeKind::HasMethod);
    }
}

#[test]
fn test_rocksdb_reingest_keeps_counts() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("graphdata");

    {
        let store = EmbeddedGraphStore::open(&data_dir).unwrap();
        seed(&store);
        store.persist().unwrap();
    }
    {
        let store = EmbeddedGraphStore::open(&data_dir).unwrap();
        seed(&store);
        store.persist().unwrap();
        assert_eq!(store.stats().unwrap().total_nodes, 2);
        assert_eq!(store.stats().unwrap().total_edges, 1);
    }
}

#[test]
fn test_rocksdb_clear_persists() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("graphdata");

    {
        let store = EmbeddedGraphStore::open(&data_dir).unwrap();
        seed(&store);
        store.clear().unwrap();
        store.persist().unwrap();
    }

    let store = EmbeddedGraphStore::open(&data_dir).unwrap();
    assert_eq!(store.node_count(), 0);
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn test_write_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    let store = EmbeddedGraphStore::open(temp_dir.path().join("graphdata")).unwrap();
    seed(&store);

    let snapshot_dir = temp_dir.path().join("snapshot");
    store.write_snapshot(&snapshot_dir).unwrap();

    let nodes: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(snapshot_dir.join("nodes.json")).unwrap())
            .unwrap();
    let edges: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(snapshot_dir.join("edges.json")).unwrap())
            .unwrap();

    assert_eq!(nodes["metadata"]["count"], 2);
    assert_eq!(nodes["metadata"]["schemaVersion"], 2);
    assert!(nodes["metadata"]["timestamp"].is_string());
    assert_eq!(nodes["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(edges["metadata"]["count"], 1);
}
