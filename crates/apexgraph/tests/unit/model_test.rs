//! Unit tests for node identity and the typed attribute model.

use apexgraph::graph::{sanitize_part, JavaScriptMethodAttributes, JsMethodKind};
use apexgraph::{build_id, EdgeKind, Metadata, NodeData, NodeId, NodeKind, RepositoryTag};

#[test]
fn test_method_id_is_deterministic() {
    let first = NodeId::apex_method("Bar", "foo");
    let second = build_id(NodeKind::ApexMethod, &["Bar", "foo"]);
    assert_eq!(first.as_str(), "method:Bar.foo");
    assert_eq!(first, second);
}

#[test]
fn test_id_formats_per_kind() {
    assert_eq!(NodeId::apex_class("Foo").as_str(), "class:Foo");
    assert_eq!(NodeId::soql("Foo", "bar", 0).as_str(), "soql:Foo.bar.0");
    assert_eq!(
        NodeId::dml("Foo", "bar", "INSERT", 2).as_str(),
        "dml:Foo.bar.INSERT.2"
    );
    assert_eq!(NodeId::lwc("widget").as_str(), "lwc:widget");
    assert_eq!(NodeId::js_class("widget", "Widget").as_str(), "jsclass:widget.Widget");
    assert_eq!(
        NodeId::js_method("widget", "Widget", "connectedCallback").as_str(),
        "jsmethod:widget.Widget.connectedCallback"
    );
    assert_eq!(NodeId::js_function("widget", "helper").as_str(), "jsfunc:widget.helper");
    assert_eq!(NodeId::dependency("lwc").as_str(), "dep:lwc");
}

#[test]
fn test_placeholders_share_the_real_prefix() {
    let id = NodeId::apex_class("Ctrl");
    assert!(id.validate_for(NodeKind::ApexClassPlaceholder).is_ok());
    assert!(id.validate_for(NodeKind::ApexClass).is_ok());
    assert!(NodeId::apex_method("Ctrl", "getData")
        .validate_for(NodeKind::ApexMethodPlaceholder)
        .is_ok());
}

#[test]
fn test_validation_rules() {
    assert!(NodeId::new("Foo").validate_for(NodeKind::ApexClass).is_err());
    assert!(NodeId::new("lwc:Foo").validate_for(NodeKind::ApexClass).is_err());
    assert!(NodeId::new("method:Foo").validate_for(NodeKind::ApexMethod).is_err());
    assert!(NodeId::new("soql:Foo..0").validate_for(NodeKind::SoqlQuery).is_err());
    assert!(NodeId::new("dep:@salesforce/schema/Account.Name")
        .validate_for(NodeKind::Dependency)
        .is_ok());
}

#[test]
fn test_sanitize_part() {
    assert_eq!(sanitize_part("c.widget"), "c_widget");
    assert_eq!(sanitize_part("ns:thing"), "ns_thing");
    assert_eq!(sanitize_part("plain"), "plain");
}

#[test]
fn test_kind_names_round_trip() {
    for kind in NodeKind::ALL {
        assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
    }
    for kind in EdgeKind::ALL {
        assert_eq!(kind.as_str().parse::<EdgeKind>().unwrap(), kind);
    }
    assert!("VisualforcePage".parse::<NodeKind>().is_err());
}

#[test]
fn test_placeholder_attributes() {
    let data = NodeData::method_placeholder("Ctrl", "getData", "referenced before ingestion");
    assert_eq!(data.kind(), NodeKind::ApexMethodPlaceholder);
    assert!(data.is_placeholder());

    let attributes = data.attributes_json();
    assert_eq!(attributes["placeholder"], true);
    assert_eq!(attributes["className"], "Ctrl");
    assert_eq!(attributes["reason"], "referenced before ingestion");
}

#[test]
fn test_js_method_attribute_names() {
    let data = NodeData::JavaScriptMethod(JavaScriptMethodAttributes {
        name: "value".to_string(),
        component: "widget".to_string(),
        class_name: "Widget".to_string(),
        method_kind: JsMethodKind::Get,
        is_async: false,
        is_static: true,
        parameters: vec![],
    });
    let attributes = data.attributes_json();
    assert_eq!(attributes["kind"], "get");
    assert_eq!(attributes["static"], true);
    assert_eq!(attributes["async"], false);

    let rebuilt = NodeData::from_parts(NodeKind::JavaScriptMethod, attributes).unwrap();
    assert_eq!(rebuilt, data);
}

#[test]
fn test_from_parts_rejects_wrong_types() {
    let result = NodeData::from_parts(
        NodeKind::ApexMethod,
        serde_json::json!({"arity": "three"}),
    );
    assert!(result.is_err());
}

#[test]
fn test_repository_metadata() {
    let tag = RepositoryTag::new("core", "42");
    let metadata = Metadata::for_repository(Some(&tag));
    assert_eq!(metadata.repository(), Some(tag));
    assert!(Metadata::for_repository(None).is_empty());

    // Both keys are needed to rebuild a tag
    assert!(Metadata::new().with("repository", "core").repository().is_none());
}
