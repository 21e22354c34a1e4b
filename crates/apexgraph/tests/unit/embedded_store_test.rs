//! Unit tests for the embedded graph store (upsert, dedup, neighbors, stats).

use apexgraph::graph::{ApexClassAttributes, ApexMethodAttributes, SoqlQueryAttributes};
use apexgraph::{
    Direction, EdgeAttributes, EdgeKind, EmbeddedGraphStore, ErrorKind, GraphStore, Metadata,
    NodeData, NodeId, NodeKind,
};

fn class(name: &str) -> NodeData {
    NodeData::ApexClass(ApexClassAttributes {
        name: name.to_string(),
        simple_name: name.to_string(),
        public: true,
        file_name: format!("{name}.cls"),
        ..Default::default()
    })
}

fn method(class_name: &str, name: &str) -> NodeData {
    NodeData::ApexMethod(ApexMethodAttributes {
        canonical_name: format!("{class_name}.{name}"),
        class_name: class_name.to_string(),
        name: name.to_string(),
        return_type: "void".to_string(),
        ..Default::default()
    })
}

fn structural(
    store: &EmbeddedGraphStore,
    from: &NodeId,
    to: &NodeId,
    kind: EdgeKind,
) -> apexgraph::Result<apexgraph::Edge> {
    store.upsert_edge(
        from.clone(),
        to.clone(),
        kind,
        EdgeAttributes::default(),
        Metadata::new(),
    )
}

#[test]
fn test_upsert_and_get_node() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let id = NodeId::apex_class("Foo");

    let node = store
        .upsert_node(id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    assert_eq!(node.kind(), NodeKind::ApexClass);

    let stored = store.get_node(&id).unwrap().unwrap();
    assert_eq!(stored, node);
    assert!(store.get_node(&NodeId::apex_class("Missing")).unwrap().is_none());
}

#[test]
fn test_upsert_node_is_idempotent() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let id = NodeId::apex_class("Foo");

    let first = store
        .upsert_node(id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    let second = store
        .upsert_node(id.clone(), class("Foo"), Metadata::new())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(store.node_count(), 1);
}

#[test]
fn test_upsert_replaces_attributes_wholesale() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let id = NodeId::apex_class("Foo");

    store
        .upsert_node(
            id.clone(),
            NodeData::class_placeholder("Foo", "referenced before ingestion"),
            Metadata::new().with("repository", "core"),
        )
        .unwrap();
    store
        .upsert_node(id.clone(), class("Foo"), Metadata::new())
        .unwrap();

    let node = store.get_node(&id).unwrap().unwrap();
    assert_eq!(node.kind(), NodeKind::ApexClass);
    assert!(!node.is_placeholder());
    assert!(node.metadata.is_empty());
    assert!(store.unresolved_placeholders().unwrap().is_empty());
}

#[test]
fn test_id_kind_mismatch_is_rejected() {
    let store = EmbeddedGraphStore::in_memory().unwrap();

    let err = store
        .upsert_node(NodeId::new("method:Foo.bar"), class("Foo"), Metadata::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = store
        .upsert_node(NodeId::new("class:"), class("Foo"), Metadata::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.node_count(), 0);
}

#[test]
fn test_edge_dedup_by_key() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("Foo");
    let method_id = NodeId::apex_method("Foo", "bar");
    store
        .upsert_node(class_id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    store
        .upsert_node(method_id.clone(), method("Foo", "bar"), Metadata::new())
        .unwrap();

    for _ in 0..3 {
        structural(&store, &class_id, &method_id, EdgeKind::HasMethod).unwrap();
    }
    assert_eq!(store.edge_count(), 1);

    // A different kind between the same pair is a separate edge
    structural(&store, &class_id, &method_id, EdgeKind::CallsApexMethod).unwrap();
    assert_eq!(store.edge_count(), 2);
    assert_eq!(store.edges_from(&class_id).unwrap().len(), 2);
}

#[test]
fn test_edge_requires_endpoints() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("Foo");
    store
        .upsert_node(class_id.clone(), class("Foo"), Metadata::new())
        .unwrap();

    let err = structural(
        &store,
        &class_id,
        &NodeId::apex_method("Foo", "missing"),
        EdgeKind::HasMethod,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.edge_count(), 0);
}

#[test]
fn test_neighbors_by_direction() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("Foo");
    let bar = NodeId::apex_method("Foo", "bar");
    let baz = NodeId::apex_method("Foo", "baz");
    store
        .upsert_node(class_id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    store
        .upsert_node(bar.clone(), method("Foo", "bar"), Metadata::new())
        .unwrap();
    store
        .upsert_node(baz.clone(), method("Foo", "baz"), Metadata::new())
        .unwrap();
    structural(&store, &class_id, &bar, EdgeKind::HasMethod).unwrap();
    structural(&store, &class_id, &baz, EdgeKind::HasMethod).unwrap();
    structural(&store, &class_id, &bar, EdgeKind::CallsApexMethod).unwrap();

    let mut outgoing = store.neighbors(&class_id, Direction::Outgoing).unwrap();
    outgoing.sort();
    assert_eq!(outgoing, vec![bar.clone(), baz.clone()]);

    assert_eq!(
        store.neighbors(&bar, Direction::Incoming).unwrap(),
        vec![class_id.clone()]
    );
    assert_eq!(store.neighbors(&bar, Direction::Both).unwrap(), vec![class_id]);
    assert!(store
        .neighbors(&NodeId::apex_class("Unknown"), Direction::Both)
        .unwrap()
        .is_empty());
}

#[test]
fn test_stats_by_kind() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("Foo");
    let method_id = NodeId::apex_method("Foo", "bar");
    let soql_id = NodeId::soql("Foo", "bar", 0);
    store
        .upsert_node(class_id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    store
        .upsert_node(method_id.clone(), method("Foo", "bar"), Metadata::new())
        .unwrap();
    store
        .upsert_node(
            soql_id.clone(),
            NodeData::SoqlQuery(SoqlQueryAttributes {
                query: "SELECT Id FROM Account".to_string(),
                class_name: "Foo".to_string(),
                method_name: "bar".to_string(),
                ..Default::default()
            }),
            Metadata::new(),
        )
        .unwrap();
    structural(&store, &class_id, &method_id, EdgeKind::HasMethod).unwrap();
    structural(&store, &method_id, &soql_id, EdgeKind::ContainsSoql).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_nodes, 3);
    assert_eq!(stats.total_edges, 2);
    assert_eq!(stats.nodes_of(NodeKind::ApexClass), 1);
    assert_eq!(stats.nodes_of(NodeKind::SoqlQuery), 1);
    assert_eq!(stats.nodes_of(NodeKind::DmlOperation), 0);
    assert_eq!(stats.edges_of(EdgeKind::ContainsSoql), 1);
}

#[test]
fn test_class_graph() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("Foo");
    let method_id = NodeId::apex_method("Foo", "bar");
    store
        .upsert_node(class_id.clone(), class("Foo"), Metadata::new())
        .unwrap();
    store
        .upsert_node(method_id.clone(), method("Foo", "bar"), Metadata::new())
        .unwrap();
    store
        .upsert_node(NodeId::apex_class("Other"), class("Other"), Metadata::new())
        .unwrap();
    structural(&store, &class_id, &method_id, EdgeKind::HasMethod).unwrap();

    let graph = store.class_graph("Foo").unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    assert_eq!(graph.nodes[0].id, class_id);

    assert!(store.class_graph("Nope").unwrap().is_empty());
}

#[test]
fn test_class_graph_sanitizes_name() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let class_id = NodeId::apex_class("ns_Foo");
    store
        .upsert_node(class_id.clone(), class("ns.Foo"), Metadata::new())
        .unwrap();

    let graph = store.class_graph("ns.Foo").unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, class_id);
}

#[test]
fn test_concurrent_readers_see_consistent_graph() {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const CLASSES: usize = 200;
    let store = Arc::new(EmbeddedGraphStore::in_memory().unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut last_nodes = 0;
                while !done.load(Ordering::Acquire) {
                    let snapshot = store.snapshot().unwrap();
                    let ids: HashSet<_> = snapshot.nodes.iter().map(|n| &n.id).collect();
                    for edge in &snapshot.edges {
                        assert!(ids.contains(&edge.from), "dangling edge source {}", edge.from);
                        assert!(ids.contains(&edge.to), "dangling edge target {}", edge.to);
                    }
                    assert!(snapshot.nodes.len() >= last_nodes);
                    last_nodes = snapshot.nodes.len();

                    let stats = store.stats().unwrap();
                    assert!(stats.total_edges * 2 <= stats.total_nodes);
                }
            })
        })
        .collect();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..CLASSES {
                let name = format!("C{i}");
                let class_id = NodeId::apex_class(&name);
                let method_id = NodeId::apex_method(&name, "run");
                store
                    .upsert_node(class_id.clone(), class(&name), Metadata::new())
                    .unwrap();
                store
                    .upsert_node(method_id.clone(), method(&name, "run"), Metadata::new())
                    .unwrap();
                structural(&store, &class_id, &method_id, EdgeKind::HasMethod).unwrap();
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_nodes, CLASSES * 2);
    assert_eq!(stats.total_edges, CLASSES);
}

#[test]
fn test_clear() {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    store
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();
    store.clear().unwrap();

    assert_eq!(store.node_count(), 0);
    assert!(store.snapshot().unwrap().is_empty());
}
