//! The embedded and the external store observe the same node/edge invariants.

use apexgraph::graph::{
    ApexClassAttributes, ApexMethodAttributes, DmlOperationAttributes, LwcComponentAttributes,
};
use apexgraph::{
    Direction, EdgeAttributes, EdgeKind, EmbeddedGraphStore, ErrorKind, ExternalGraphStore,
    GraphStore, MemoryTransport, Metadata, NodeData, NodeId, NodeKind,
};
use std::collections::BTreeSet;

fn stores() -> Vec<Box<dyn GraphStore>> {
    vec![
        Box::new(EmbeddedGraphStore::in_memory().unwrap()),
        Box::new(ExternalGraphStore::new(Box::new(MemoryTransport::new()))),
    ]
}

fn populate(store: &dyn GraphStore) {
    let repo = Metadata::new().with("repository", "core").with("repositoryId", "1");
    store
        .upsert_node(
            NodeId::apex_class("Foo"),
            NodeData::ApexClass(ApexClassAttributes {
                name: "Foo".to_string(),
                public: true,
                ..Default::default()
            }),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::apex_method("Foo", "bar"),
            NodeData::ApexMethod(ApexMethodAttributes {
                canonical_name: "Foo.bar".to_string(),
                class_name: "Foo".to_string(),
                name: "bar".to_string(),
                is_static: true,
                ..Default::default()
            }),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::dml("Foo", "bar", "INSERT", 0),
            NodeData::DmlOperation(DmlOperationAttributes {
                operation_type: "INSERT".to_string(),
                class_name: "Foo".to_string(),
                method_name: "bar".to_string(),
                ordinal: 0,
            }),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::lwc("widget"),
            NodeData::LwcComponent(LwcComponentAttributes {
                name: "widget".to_string(),
                ..Default::default()
            }),
            repo.clone(),
        )
        .unwrap();

    let edges = [
        (NodeId::apex_class("Foo"), NodeId::apex_method("Foo", "bar"), EdgeKind::HasMethod),
        (
            NodeId::apex_method("Foo", "bar"),
            NodeId::dml("Foo", "bar", "INSERT", 0),
            EdgeKind::ContainsDml,
        ),
        (NodeId::lwc("widget"), NodeId::apex_class("Foo"), EdgeKind::DependsOnApexClass),
        (
            NodeId::lwc("widget"),
            NodeId::apex_method("Foo", "bar"),
            EdgeKind::CallsApexMethod,
        ),
    ];
    // Twice, to exercise dedup
    for _ in 0..2 {
        for (from, to, kind) in &edges {
            store
                .upsert_edge(
                    from.clone(),
                    to.clone(),
                    *kind,
                    EdgeAttributes::default(),
                    repo.clone(),
                )
                .unwrap();
        }
    }
}

fn node_keys(store: &dyn GraphStore) -> BTreeSet<(NodeId, NodeKind)> {
    store
        .all_nodes()
        .unwrap()
        .into_iter()
        .map(|n| (n.id.clone(), n.kind()))
        .collect()
}

fn edge_keys(store: &dyn GraphStore) -> BTreeSet<(NodeId, EdgeKind, NodeId)> {
    store
        .all_edges()
        .unwrap()
        .into_iter()
        .map(|e| (e.from, e.kind, e.to))
        .collect()
}

#[test]
fn test_same_nodes_and_edges() {
    let stores = stores();
    for store in &stores {
        populate(store.as_ref());
    }

    assert_eq!(node_keys(stores[0].as_ref()), node_keys(stores[1].as_ref()));
    assert_eq!(edge_keys(stores[0].as_ref()), edge_keys(stores[1].as_ref()));
    assert_eq!(stores[0].stats().unwrap(), stores[1].stats().unwrap());
    assert_eq!(stores[1].all_edges().unwrap().len(), 4);
}

#[test]
fn test_same_node_values() {
    let stores = stores();
    for store in &stores {
        populate(store.as_ref());
    }

    let id = NodeId::apex_method("Foo", "bar");
    let local = stores[0].get_node(&id).unwrap().unwrap();
    let external = stores[1].get_node(&id).unwrap().unwrap();
    assert_eq!(local.data, external.data);
    assert_eq!(local.metadata, external.metadata);
}

#[test]
fn test_same_neighbors_and_class_graph() {
    let stores = stores();
    for store in &stores {
        populate(store.as_ref());
    }

    let method = NodeId::apex_method("Foo", "bar");
    for direction in [Direction::Outgoing, Direction::Incoming, Direction::Both] {
        let mut local = stores[0].neighbors(&method, direction).unwrap();
        let mut external = stores[1].neighbors(&method, direction).unwrap();
        local.sort();
        external.sort();
        assert_eq!(local, external, "{direction:?}");
    }

    let local = stores[0].class_graph("Foo").unwrap().sorted();
    let external = stores[1].class_graph("Foo").unwrap().sorted();
    assert_eq!(local.nodes.len(), 2);
    assert_eq!(
        local.nodes.iter().map(|n| &n.id).collect::<Vec<_>>(),
        external.nodes.iter().map(|n| &n.id).collect::<Vec<_>>()
    );
    assert!(stores[1].class_graph("Missing").unwrap().is_empty());
}

#[test]
fn test_same_rejections() {
    for store in stores() {
        let err = store
            .upsert_edge(
                NodeId::lwc("ghost"),
                NodeId::apex_class("Ghost"),
                EdgeKind::DependsOnApexClass,
                EdgeAttributes::default(),
                Metadata::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", store.backend_name());

        let err = store
            .upsert_node(
                NodeId::new("lwc:widget"),
                NodeData::class_placeholder("widget", "test"),
                Metadata::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{}", store.backend_name());
        assert!(store.all_nodes().unwrap().is_empty());
    }
}

#[test]
fn test_created_at_survives_reupsert() {
    for store in stores() {
        let id = NodeId::apex_class("Svc");
        let placeholder = store
            .upsert_node(
                id.clone(),
                NodeData::class_placeholder("Svc", "referenced before ingestion"),
                Metadata::new(),
            )
            .unwrap();
        let real = store
            .upsert_node(
                id.clone(),
                NodeData::ApexClass(ApexClassAttributes {
                    name: "Svc".to_string(),
                    ..Default::default()
                }),
                Metadata::new(),
            )
            .unwrap();

        assert_eq!(placeholder.created_at, real.created_at, "{}", store.backend_name());
        let stored = store.get_node(&id).unwrap().unwrap();
        assert!(!stored.is_placeholder());
        assert!(store.unresolved_placeholders().unwrap().is_empty());
    }
}

#[test]
fn test_clear_empties_both() {
    for store in stores() {
        populate(store.as_ref());
        store.clear().unwrap();
        store.persist().unwrap();
        assert!(store.snapshot().unwrap().is_empty(), "{}", store.backend_name());
    }
}
