//! Component script records to graph upserts.

use crate::error::Result;
use crate::resolver::{PlaceholderResolver, Resolution};
use crate::writer::GraphWriter;
use apexgraph::graph::{
    sanitize_part, DependencyAttributes, JavaScriptClassAttributes, JavaScriptFunctionAttributes,
    JavaScriptMethodAttributes, LwcComponentAttributes,
};
use apexgraph::{EdgeAttributes, EdgeKind, NodeData, NodeId};
use apexgraph_record::{ScriptClassRecord, ScriptComponentRecord};

/// Nodes written for one component
pub(crate) struct ScriptMapping {
    /// `None` when the component node was rejected
    pub(crate) component: Option<NodeId>,
    pub(crate) resolutions: Vec<Resolution>,
}

/// Write the component, its imports, classes and functions.
pub(crate) fn map_script_component(
    writer: &mut GraphWriter<'_>,
    resolver: &PlaceholderResolver<'_>,
    record: &ScriptComponentRecord,
) -> Result<ScriptMapping> {
    let component_part = sanitize_part(&record.name);
    let component = NodeId::lwc(&component_part);
    let mut mapping = ScriptMapping {
        component: None,
        resolutions: Vec::new(),
    };

    let stored = writer.node(
        component.clone(),
        NodeData::LwcComponent(LwcComponentAttributes {
            name: record.name.clone(),
            file_name: record.file_name.clone(),
            exports: record.exports.iter().map(|e| e.label().to_string()).collect(),
        }),
    )?;
    if !stored {
        return Ok(mapping);
    }
    mapping.component = Some(component.clone());

    for import in &record.imports {
        let attributes = EdgeAttributes::import(&import.source, &import.specifiers);
        if let Some(dependency) = import.apex_target() {
            let resolution = resolver.resolve_with(writer, &component, &dependency, attributes)?;
            mapping.resolutions.push(resolution);
            continue;
        }

        let dependency = NodeId::dependency(&import.source);
        let data = NodeData::Dependency(DependencyAttributes {
            source: import.source.clone(),
        });
        if writer.node(dependency.clone(), data)? {
            writer.edge(&component, &dependency, EdgeKind::ImportsFrom, attributes)?;
        }
    }

    for class in &record.classes {
        map_class(writer, &component, &component_part, record, class)?;
    }

    for function in &record.functions {
        let id = NodeId::js_function(&component_part, &sanitize_part(&function.name));
        let data = NodeData::JavaScriptFunction(JavaScriptFunctionAttributes {
            name: function.name.clone(),
            component: record.name.clone(),
            is_async: function.is_async,
            parameters: function.parameters.clone(),
        });
        if writer.node(id.clone(), data)? {
            writer.edge(&component, &id, EdgeKind::HasFunction, EdgeAttributes::default())?;
        }
    }

    Ok(mapping)
}

fn map_class(
    writer: &mut GraphWriter<'_>,
    component: &NodeId,
    component_part: &str,
    record: &ScriptComponentRecord,
    class: &ScriptClassRecord,
) -> Result<()> {
    let class_part = sanitize_part(&class.name);
    let id = NodeId::js_class(component_part, &class_part);
    let data = NodeData::JavaScriptClass(JavaScriptClassAttributes {
        name: class.name.clone(),
        component: record.name.clone(),
        super_class: class
            .super_class
            .clone()
            .filter(|name| !name.trim().is_empty()),
        properties: class.properties.iter().map(|p| p.name.clone()).collect(),
    });
    if !writer.node(id.clone(), data)? {
        return Ok(());
    }
    writer.edge(component, &id, EdgeKind::HasClass, EdgeAttributes::default())?;

    for method in &class.methods {
        let method_id =
            NodeId::js_method(component_part, &class_part, &sanitize_part(&method.name));
        let data = NodeData::JavaScriptMethod(JavaScriptMethodAttributes {
            name: method.name.clone(),
            component: record.name.clone(),
            class_name: class.name.clone(),
            method_kind: method.kind,
            is_async: method.is_async,
            is_static: method.is_static,
            parameters: method.parameters.clone(),
        });
        if writer.node(method_id.clone(), data)? {
            writer.edge(&id, &method_id, EdgeKind::HasMethod, EdgeAttributes::default())?;
        }
    }

    Ok(())
}
