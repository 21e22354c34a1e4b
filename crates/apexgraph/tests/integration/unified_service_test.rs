//! Integration tests for fan-out writes and fallback reads of the unified service.

use apexgraph::graph::{ApexClassAttributes, LwcComponentAttributes};
use apexgraph::{
    BackendMode, Direction, EdgeAttributes, EdgeKind, EmbeddedGraphStore, EngineConfig, ErrorKind,
    ExportFormat, ExternalGraphStore, GraphError, GraphStore, MemoryTransport, Metadata,
    Neo4jConfig, NodeData, NodeId, NodeKind, StorageKind, UnifiedGraphService,
};
use tempfile::TempDir;

fn class(name: &str) -> NodeData {
    NodeData::ApexClass(ApexClassAttributes {
        name: name.to_string(),
        ..Default::default()
    })
}

fn component(name: &str) -> NodeData {
    NodeData::LwcComponent(LwcComponentAttributes {
        name: name.to_string(),
        ..Default::default()
    })
}

/// Service over both backends plus a handle to flip the external one off.
fn dual_service() -> (UnifiedGraphService, MemoryTransport) {
    let transport = MemoryTransport::new();
    let service = UnifiedGraphService::new(
        Some(Box::new(EmbeddedGraphStore::in_memory().unwrap())),
        Some(Box::new(ExternalGraphStore::new(Box::new(transport.clone())))),
    );
    (service, transport)
}

#[test]
fn test_backend_modes() {
    let (both, _) = dual_service();
    assert_eq!(both.backend_mode(), BackendMode::Both);

    let local = UnifiedGraphService::new(
        Some(Box::new(EmbeddedGraphStore::in_memory().unwrap())),
        None,
    );
    assert_eq!(local.backend_mode(), BackendMode::Local);

    let external = UnifiedGraphService::new(
        None,
        Some(Box::new(ExternalGraphStore::new(Box::new(MemoryTransport::new())))),
    );
    assert_eq!(external.backend_mode(), BackendMode::External);
}

#[test]
fn test_from_config() {
    let service = UnifiedGraphService::from_config(&EngineConfig::in_memory());
    assert_eq!(service.backend_mode(), BackendMode::Local);

    let config = EngineConfig::in_memory().with_neo4j(Neo4jConfig {
        enabled: true,
        uri: "memory://".to_string(),
        ..Default::default()
    });
    assert_eq!(
        UnifiedGraphService::from_config(&config).backend_mode(),
        BackendMode::Both
    );

    let config = EngineConfig::default()
        .with_embedded(false)
        .with_storage(StorageKind::Memory);
    assert_eq!(
        UnifiedGraphService::from_config(&config).backend_mode(),
        BackendMode::None
    );
}

#[test]
fn test_unreachable_external_is_disabled() {
    let config = EngineConfig::in_memory().with_neo4j(Neo4jConfig {
        enabled: true,
        uri: "http://127.0.0.1:9".to_string(),
        timeout: Some(std::time::Duration::from_secs(1)),
        ..Default::default()
    });
    let service = UnifiedGraphService::from_config(&config);
    assert_eq!(service.backend_mode(), BackendMode::Local);
}

#[test]
fn test_writes_reach_every_backend() {
    let (service, _) = dual_service();
    let outcome = service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();
    assert!(outcome.all_succeeded());
    assert!(outcome.failures().is_empty());

    for store in [service.embedded().unwrap(), service.external().unwrap()] {
        assert!(store.get_node(&NodeId::apex_class("Foo")).unwrap().is_some());
    }
}

#[test]
fn test_validation_before_fan_out() {
    let (service, transport) = dual_service();
    let before = transport.statements_run();

    let err = service
        .upsert_node(NodeId::new("class:Foo"), component("Foo"), Metadata::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .upsert_edge(
            NodeId::new("nope"),
            NodeId::apex_class("Foo"),
            EdgeKind::DependsOnApexClass,
            EdgeAttributes::default(),
            Metadata::new(),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(transport.statements_run(), before);
}

#[test]
fn test_one_sided_failure_is_reported_not_rolled_back() {
    let (service, transport) = dual_service();
    transport.set_available(false);

    let outcome = service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();
    let failures = outcome.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].backend, "external");
    assert_eq!(failures[0].kind, ErrorKind::Backend);

    let node = outcome.into_result().unwrap();
    assert_eq!(node.kind(), NodeKind::ApexClass);
    assert!(service
        .embedded()
        .unwrap()
        .get_node(&NodeId::apex_class("Foo"))
        .unwrap()
        .is_some());

    // The backends have diverged until the write is repeated
    transport.set_available(true);
    assert!(service
        .external()
        .unwrap()
        .get_node(&NodeId::apex_class("Foo"))
        .unwrap()
        .is_none());
}

#[test]
fn test_all_backends_failing() {
    let transport = MemoryTransport::new();
    let service = UnifiedGraphService::new(
        None,
        Some(Box::new(ExternalGraphStore::new(Box::new(transport.clone())))),
    );
    transport.set_available(false);

    let outcome = service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();
    assert!(matches!(outcome.into_result(), Err(GraphError::Backend { .. })));
}

#[test]
fn test_reads_fall_back_to_embedded() {
    let (service, transport) = dual_service();
    service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();

    transport.set_available(false);
    let graph = service.full_graph().unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(service.stats().unwrap().graph.total_nodes, 1);
    assert_eq!(service.class_graph("Foo").unwrap().nodes.len(), 1);
    assert!(service.get_node(&NodeId::apex_class("Foo")).unwrap().is_some());
}

#[test]
fn test_external_only_reads_degrade_to_empty() {
    let transport = MemoryTransport::new();
    let service = UnifiedGraphService::new(
        None,
        Some(Box::new(ExternalGraphStore::new(Box::new(transport.clone())))),
    );
    service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();

    transport.set_available(false);
    assert!(service.full_graph().unwrap().nodes.is_empty());
    assert!(service.class_graph("Foo").unwrap().nodes.is_empty());
    assert!(service.get_node(&NodeId::apex_class("Foo")).unwrap().is_none());
    assert!(service
        .neighbors(&NodeId::apex_class("Foo"), Direction::Outgoing)
        .unwrap()
        .is_empty());
    let stats = service.stats().unwrap();
    assert_eq!(stats.graph.total_nodes, 0);
    assert_eq!(stats.backend_mode, BackendMode::External);
}

#[test]
fn test_reads_prefer_external() {
    let (service, _) = dual_service();
    service
        .external()
        .unwrap()
        .upsert_node(NodeId::apex_class("OnlyRemote"), class("OnlyRemote"), Metadata::new())
        .unwrap();

    let graph = service.full_graph().unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].id, NodeId::apex_class("OnlyRemote"));
}

#[test]
fn test_ensure_node_keeps_real_nodes() {
    let (service, _) = dual_service();
    // Only the embedded store knows the real class
    service
        .embedded()
        .unwrap()
        .upsert_node(NodeId::apex_class("Svc"), class("Svc"), Metadata::new())
        .unwrap();

    let outcome = service
        .ensure_node(
            NodeId::apex_class("Svc"),
            NodeData::class_placeholder("Svc", "referenced before ingestion"),
            Metadata::new(),
        )
        .unwrap();
    let local = outcome.local.unwrap().unwrap();
    let external = outcome.external.unwrap().unwrap();
    assert!(!local.is_placeholder());
    assert!(external.is_placeholder());

    let placeholders = service.unresolved_placeholders().unwrap();
    assert_eq!(placeholders.len(), 1);
}

#[test]
fn test_stats_and_clear() {
    let (service, _) = dual_service();
    service
        .upsert_node(NodeId::lwc("widget"), component("widget"), Metadata::new())
        .unwrap();
    service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();
    service
        .upsert_edge(
            NodeId::lwc("widget"),
            NodeId::apex_class("Foo"),
            EdgeKind::DependsOnApexClass,
            EdgeAttributes::default(),
            Metadata::new(),
        )
        .unwrap()
        .into_result()
        .unwrap();

    let stats = service.stats().unwrap();
    assert_eq!(stats.backend_mode, BackendMode::Both);
    assert_eq!(stats.graph.total_edges, 1);
    assert_eq!(stats.graph.edges_of(EdgeKind::DependsOnApexClass), 1);

    assert!(service.clear().all_succeeded());
    assert!(service.persist().all_succeeded());
    assert!(service.full_graph().unwrap().is_empty());
    assert!(service.embedded().unwrap().all_nodes().unwrap().is_empty());
}

#[test]
fn test_export_and_import() {
    let (service, _) = dual_service();
    service
        .upsert_node(NodeId::apex_class("Foo"), class("Foo"), Metadata::new())
        .unwrap();

    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("exports").join("graph.json");
    service.export_to(ExportFormat::Json, &json_path).unwrap();
    service
        .export_to(ExportFormat::Gexf, dir.path().join("graph.gexf"))
        .unwrap();
    assert!(std::fs::read_to_string(dir.path().join("graph.gexf"))
        .unwrap()
        .contains("class:Foo"));

    let fresh = UnifiedGraphService::from_config(&EngineConfig::in_memory());
    let text = std::fs::read_to_string(&json_path).unwrap();
    let summary = fresh.import_json(&text).unwrap().into_result().unwrap();
    assert_eq!(summary.nodes, 1);
    assert_eq!(fresh.stats().unwrap().graph.nodes_of(NodeKind::ApexClass), 1);
}
