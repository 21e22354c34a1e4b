//! Typed attributes per node kind.
//!
//! [`NodeData`] is a tagged union with one variant per [`NodeKind`]; each
//! variant carries only the fields that are meaningful for that kind. The
//! serialized form is `{"kind": ..., "attributes": {...}}` with camelCase
//! attribute names.

use super::types::NodeKind;
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Attributes of an Apex class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApexClassAttributes {
    pub name: String,
    pub simple_name: String,
    pub defining_type: String,
    pub public: bool,
    pub with_sharing: bool,
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_class_name: Option<String>,
}

/// Attributes of an Apex method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApexMethodAttributes {
    /// `<Class>.<Method>`
    pub canonical_name: String,
    pub class_name: String,
    pub name: String,
    pub return_type: String,
    pub arity: u32,
    pub public: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub constructor: bool,
    pub annotations: Vec<String>,
}

/// Attributes of a SOQL query found in an Apex method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SoqlQueryAttributes {
    pub query: String,
    pub canonical_query: String,
    pub class_name: String,
    pub method_name: String,
    /// Position of the query inside its method
    pub ordinal: usize,
}

/// Attributes of a DML operation found in an Apex method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DmlOperationAttributes {
    /// `INSERT`, `UPDATE`, `DELETE`, `UPSERT`, `MERGE` or `UNDELETE`
    pub operation_type: String,
    pub class_name: String,
    pub method_name: String,
    /// Position of the operation inside its method
    pub ordinal: usize,
}

/// Attributes of a Lightning Web Component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LwcComponentAttributes {
    pub name: String,
    pub file_name: String,
    pub exports: Vec<String>,
}

/// Attributes of a class declared in a component script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JavaScriptClassAttributes {
    pub name: String,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_class: Option<String>,
    pub properties: Vec<String>,
}

/// Kind of a script class member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsMethodKind {
    Constructor,
    #[default]
    Method,
    Get,
    Set,
}

/// Attributes of a method of a script class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JavaScriptMethodAttributes {
    pub name: String,
    pub component: String,
    pub class_name: String,
    #[serde(rename = "kind")]
    pub method_kind: JsMethodKind,
    #[serde(rename = "async")]
    pub is_async: bool,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub parameters: Vec<String>,
}

/// Attributes of a top-level script function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JavaScriptFunctionAttributes {
    pub name: String,
    pub component: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub parameters: Vec<String>,
}

/// Attributes of an imported module specifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyAttributes {
    pub source: String,
}

/// Attributes of a placeholder node.
///
/// `placeholder` is always `true`; a later real upsert for the same id replaces
/// the whole attribute set, so the flag disappears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaceholderAttributes {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub placeholder: bool,
    pub reason: String,
}

/// Kind-specific node attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "attributes")]
pub enum NodeData {
    ApexClass(ApexClassAttributes),
    ApexMethod(ApexMethodAttributes),
    #[serde(rename = "SOQLQuery")]
    SoqlQuery(SoqlQueryAttributes),
    #[serde(rename = "DMLOperation")]
    DmlOperation(DmlOperationAttributes),
    #[serde(rename = "LWCComponent")]
    LwcComponent(LwcComponentAttributes),
    JavaScriptClass(JavaScriptClassAttributes),
    JavaScriptMethod(JavaScriptMethodAttributes),
    JavaScriptFunction(JavaScriptFunctionAttributes),
    Dependency(DependencyAttributes),
    ApexClassPlaceholder(PlaceholderAttributes),
    ApexMethodPlaceholder(PlaceholderAttributes),
}

impl NodeData {
    /// Placeholder for an Apex class that has not been ingested yet.
    pub fn class_placeholder(class_name: &str, reason: &str) -> Self {
        NodeData::ApexClassPlaceholder(PlaceholderAttributes {
            name: class_name.to_string(),
            class_name: None,
            placeholder: true,
            reason: reason.to_string(),
        })
    }

    /// Placeholder for an Apex method that has not been ingested yet.
    pub fn method_placeholder(class_name: &str, method_name: &str, reason: &str) -> Self {
        NodeData::ApexMethodPlaceholder(PlaceholderAttributes {
            name: method_name.to_string(),
            class_name: Some(class_name.to_string()),
            placeholder: true,
            reason: reason.to_string(),
        })
    }

    /// Kind of the node carrying these attributes.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::ApexClass(_) => NodeKind::ApexClass,
            NodeData::ApexMethod(_) => NodeKind::ApexMethod,
            NodeData::SoqlQuery(_) => NodeKind::SoqlQuery,
            NodeData::DmlOperation(_) => NodeKind::DmlOperation,
            NodeData::LwcComponent(_) => NodeKind::LwcComponent,
            NodeData::JavaScriptClass(_) => NodeKind::JavaScriptClass,
            NodeData::JavaScriptMethod(_) => NodeKind::JavaScriptMethod,
            NodeData::JavaScriptFunction(_) => NodeKind::JavaScriptFunction,
            NodeData::Dependency(_) => NodeKind::Dependency,
            NodeData::ApexClassPlaceholder(_) => NodeKind::ApexClassPlaceholder,
            NodeData::ApexMethodPlaceholder(_) => NodeKind::ApexMethodPlaceholder,
        }
    }

    /// Whether these are placeholder attributes.
    pub fn is_placeholder(&self) -> bool {
        match self {
            NodeData::ApexClassPlaceholder(p) | NodeData::ApexMethodPlaceholder(p) => {
                p.placeholder
            }
            _ => false,
        }
    }

    /// Human-readable label for visualisation.
    pub fn label(&self) -> &str {
        match self {
            NodeData::ApexClass(a) => &a.name,
            NodeData::ApexMethod(a) => &a.canonical_name,
            NodeData::SoqlQuery(a) => &a.query,
            NodeData::DmlOperation(a) => &a.operation_type,
            NodeData::LwcComponent(a) => &a.name,
            NodeData::JavaScriptClass(a) => &a.name,
            NodeData::JavaScriptMethod(a) => &a.name,
            NodeData::JavaScriptFunction(a) => &a.name,
            NodeData::Dependency(a) => &a.source,
            NodeData::ApexClassPlaceholder(a) | NodeData::ApexMethodPlaceholder(a) => &a.name,
        }
    }

    /// The attribute object alone (without the kind tag).
    pub fn attributes_json(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut obj)) => obj.remove("attributes").unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Rebuild typed attributes from a kind and an attribute object.
    ///
    /// Unknown attribute names are ignored and missing ones take their default.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if an attribute has the wrong type.
    pub fn from_parts(kind: NodeKind, attributes: Value) -> Result<Self> {
        let attributes = match attributes {
            Value::Null => json!({}),
            other => other,
        };
        serde_json::from_value(json!({ "kind": kind.as_str(), "attributes": attributes }))
            .map_err(|e| {
                GraphError::serialization(format!("Invalid attributes for {kind}"), Some(e))
            })
    }
}

/// Attributes of import-derived edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgeAttributes {
    /// Imported names
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specifiers: Vec<String>,
    /// Full module specifier the edge came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

impl EdgeAttributes {
    /// Attributes for an import edge.
    pub fn import(import_path: &str, specifiers: &[String]) -> Self {
        Self {
            specifiers: specifiers.to_vec(),
            import_path: Some(import_path.to_string()),
        }
    }

    /// Whether no attribute is set.
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty() && self.import_path.is_none()
    }
}
