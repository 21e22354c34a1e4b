//! Unit tests for JSON and GEXF export.

use apexgraph::export::{import_json, to_gexf, to_json};
use apexgraph::graph::{ApexClassAttributes, DependencyAttributes, LwcComponentAttributes};
use apexgraph::{
    EdgeAttributes, EdgeKind, EmbeddedGraphStore, GraphStore, Metadata, NodeData, NodeId,
    NodeKind,
};

fn sample_store() -> EmbeddedGraphStore {
    let store = EmbeddedGraphStore::in_memory().unwrap();
    let repo = Metadata::new().with("repository", "core").with("repositoryId", "1");

    store
        .upsert_node(
            NodeId::lwc("widget"),
            NodeData::LwcComponent(LwcComponentAttributes {
                name: "widget".to_string(),
                file_name: "widget.js".to_string(),
                exports: vec!["default".to_string()],
            }),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::dependency("lwc"),
            NodeData::Dependency(DependencyAttributes {
                source: "lwc".to_string(),
            }),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::apex_class("Svc"),
            NodeData::class_placeholder("Svc", "referenced before ingestion"),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_node(
            NodeId::apex_class("Plain"),
            NodeData::ApexClass(ApexClassAttributes {
                name: "Plain & <Simple>".to_string(),
                ..Default::default()
            }),
            Metadata::new(),
        )
        .unwrap();
    store
        .upsert_edge(
            NodeId::lwc("widget"),
            NodeId::dependency("lwc"),
            EdgeKind::ImportsFrom,
            EdgeAttributes::import("lwc", &["LightningElement".to_string()]),
            repo.clone(),
        )
        .unwrap();
    store
        .upsert_edge(
            NodeId::lwc("widget"),
            NodeId::apex_class("Svc"),
            EdgeKind::DependsOnApexClass,
            EdgeAttributes::default(),
            repo,
        )
        .unwrap();
    store
}

#[test]
fn test_json_round_trip_preserves_counts_per_kind() {
    let source = sample_store();
    let snapshot = source.snapshot().unwrap();
    let text = to_json(&snapshot).unwrap();

    let target = EmbeddedGraphStore::in_memory().unwrap();
    let summary = import_json(&target, &text).unwrap();
    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.edges, 2);
    assert_eq!(summary.rejected, 0);

    assert_eq!(target.stats().unwrap(), source.stats().unwrap());
    let placeholder = target.get_node(&NodeId::apex_class("Svc")).unwrap().unwrap();
    assert_eq!(placeholder.kind(), NodeKind::ApexClassPlaceholder);
    assert_eq!(placeholder.metadata.get("repository"), Some("core"));

    let edges = target.edges_from(&NodeId::lwc("widget")).unwrap();
    let import = edges.iter().find(|e| e.kind == EdgeKind::ImportsFrom).unwrap();
    assert_eq!(import.attributes.specifiers, vec!["LightningElement".to_string()]);
}

#[test]
fn test_json_import_is_idempotent() {
    let text = to_json(&sample_store().snapshot().unwrap()).unwrap();
    let target = EmbeddedGraphStore::in_memory().unwrap();

    import_json(&target, &text).unwrap();
    import_json(&target, &text).unwrap();

    assert_eq!(target.node_count(), 4);
    assert_eq!(target.edge_count(), 2);
}

#[test]
fn test_json_import_skips_dangling_edges() {
    let text = r#"{
        "nodes": [
            {"id": "lwc:widget", "kind": "LWCComponent", "attributes": {"name": "widget"}}
        ],
        "edges": [
            {"from": "lwc:widget", "to": "class:Gone", "kind": "DEPENDS_ON_APEX_CLASS"}
        ]
    }"#;
    let target = EmbeddedGraphStore::in_memory().unwrap();
    let summary = import_json(&target, text).unwrap();

    assert_eq!(summary.nodes, 1);
    assert_eq!(summary.edges, 0);
    assert_eq!(summary.rejected, 1);
}

#[test]
fn test_gexf_export() {
    let snapshot = sample_store().snapshot().unwrap();
    let output = to_gexf(&snapshot);

    assert!(output.contains("<gexf xmlns=\"http://gexf.net/1.2\" version=\"1.2\">"));
    assert!(output.contains("<node id=\"lwc:widget\" label=\"widget\">"));
    assert!(output.contains("label=\"Plain &amp; &lt;Simple&gt;\""));
    assert!(output.contains("value=\"ApexClassPlaceholder\""));
    assert!(output.contains("source=\"lwc:widget\" target=\"class:Svc\" label=\"DEPENDS_ON_APEX_CLASS\""));
    assert_eq!(output.matches("<edge id=").count(), 2);
    assert!(output.contains("<attvalue for=\"2\" value=\"core\"/>"));
}
