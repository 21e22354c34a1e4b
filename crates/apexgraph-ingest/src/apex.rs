//! Apex class records to graph upserts.
//!
//! ```text
//! class:Foo --HAS_METHOD--> method:Foo.bar --CONTAINS_SOQL--> soql:Foo.bar.0
//!                                          --CONTAINS_DML---> dml:Foo.bar.INSERT.0
//! ```

use crate::error::Result;
use crate::writer::GraphWriter;
use apexgraph::graph::{
    sanitize_part, ApexClassAttributes, ApexMethodAttributes, DmlOperationAttributes,
    SoqlQueryAttributes,
};
use apexgraph::{EdgeAttributes, EdgeKind, NodeData, NodeId};
use apexgraph_record::{ApexClassRecord, ApexMethodRecord};

/// Id of the class node for `class_name`, shared with placeholder resolution.
pub(crate) fn class_id(class_name: &str) -> NodeId {
    NodeId::apex_class(&sanitize_part(class_name))
}

/// Id of the method node. Method names are kept as written.
pub(crate) fn method_id(class_name: &str, method_name: &str) -> NodeId {
    NodeId::apex_method(&sanitize_part(class_name), method_name)
}

/// Write the class, its methods, their queries and DML operations.
///
/// Returns the class node id, or `None` when the class node itself was
/// rejected. Method calls recorded by the parser are not turned into edges.
pub(crate) fn map_apex_class(
    writer: &mut GraphWriter<'_>,
    record: &ApexClassRecord,
) -> Result<Option<NodeId>> {
    let id = class_id(&record.name);
    let simple_name = if record.simple_name.is_empty() {
        record.name.clone()
    } else {
        record.simple_name.clone()
    };

    let stored = writer.node(
        id.clone(),
        NodeData::ApexClass(ApexClassAttributes {
            name: record.name.clone(),
            simple_name,
            defining_type: record.defining_type.clone(),
            public: record.public,
            with_sharing: record.with_sharing,
            file_name: record.file_name.clone(),
            super_class_name: record
                .super_class_name
                .clone()
                .filter(|name| !name.trim().is_empty()),
        }),
    )?;
    if !stored {
        return Ok(None);
    }

    for method in &record.methods {
        map_method(writer, &id, &record.name, method)?;
    }

    Ok(Some(id))
}

fn map_method(
    writer: &mut GraphWriter<'_>,
    class: &NodeId,
    class_name: &str,
    method: &ApexMethodRecord,
) -> Result<()> {
    let id = method_id(class_name, &method.name);
    let stored = writer.node(
        id.clone(),
        NodeData::ApexMethod(ApexMethodAttributes {
            canonical_name: format!("{}.{}", class_name, method.name),
            class_name: class_name.to_string(),
            name: method.name.clone(),
            return_type: method.return_type.clone(),
            arity: method.arity,
            public: method.public,
            is_static: method.is_static,
            constructor: method.constructor,
            annotations: method.annotations.clone(),
        }),
    )?;
    if !stored {
        return Ok(());
    }
    writer.edge(class, &id, EdgeKind::HasMethod, EdgeAttributes::default())?;

    let class_part = sanitize_part(class_name);
    for (ordinal, query) in method.soql_queries.iter().enumerate() {
        let soql_id = NodeId::soql(&class_part, &method.name, ordinal);
        let data = NodeData::SoqlQuery(SoqlQueryAttributes {
            query: query.query.clone(),
            canonical_query: query.canonical_or_query().to_string(),
            class_name: class_name.to_string(),
            method_name: method.name.clone(),
            ordinal,
        });
        if writer.node(soql_id.clone(), data)? {
            writer.edge(&id, &soql_id, EdgeKind::ContainsSoql, EdgeAttributes::default())?;
        }
    }

    for (ordinal, operation) in method.dml_operations.iter().enumerate() {
        let operation_type = operation.normalized_type();
        let dml_id = NodeId::dml(&class_part, &method.name, &operation_type, ordinal);
        let data = NodeData::DmlOperation(DmlOperationAttributes {
            operation_type,
            class_name: class_name.to_string(),
            method_name: method.name.clone(),
            ordinal,
        });
        if writer.node(dml_id.clone(), data)? {
            writer.edge(&id, &dml_id, EdgeKind::ContainsDml, EdgeAttributes::default())?;
        }
    }

    Ok(())
}
