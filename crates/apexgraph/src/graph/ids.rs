//! Deterministic, human-readable node identifiers.
//!
//! Every id is `<prefix>:<part>[.<part>...]`, where the prefix comes from the
//! [`NodeKind`] and the parts are the names that identify the entity inside its
//! owner. Building an id is pure: the same parts always give the same id, which
//! is what makes re-ingesting a file idempotent.

use super::types::NodeKind;
use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};

/// Separator between the parts of an id.
pub const ID_DELIMITER: char = '.';

/// Separator between the kind prefix and the parts.
pub const PREFIX_SEPARATOR: char = ':';

/// Identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

/// Build the id of a node of `kind` from its identifying parts.
///
/// Never fails. Parts are joined verbatim, so callers sanitize parts that may
/// contain [`ID_DELIMITER`] (see [`sanitize_part`]).
pub fn build_id(kind: NodeKind, parts: &[&str]) -> NodeId {
    let joined = parts.join(&ID_DELIMITER.to_string());
    NodeId(format!("{}{PREFIX_SEPARATOR}{joined}", kind.id_prefix()))
}

/// Replace id delimiters inside a single part.
pub fn sanitize_part(part: &str) -> String {
    part.replace([ID_DELIMITER, PREFIX_SEPARATOR], "_")
}

impl NodeId {
    /// Wrap a raw id without validation.
    pub fn new(raw: impl Into<String>) -> Self {
        NodeId(raw.into())
    }

    /// `class:<ClassName>`
    pub fn apex_class(class_name: &str) -> Self {
        build_id(NodeKind::ApexClass, &[class_name])
    }

    /// `method:<Class>.<Method>`
    pub fn apex_method(class_name: &str, method_name: &str) -> Self {
        build_id(NodeKind::ApexMethod, &[class_name, method_name])
    }

    /// `soql:<Class>.<Method>.<ordinal>`
    pub fn soql(class_name: &str, method_name: &str, ordinal: usize) -> Self {
        build_id(
            NodeKind::SoqlQuery,
            &[class_name, method_name, &ordinal.to_string()],
        )
    }

    /// `dml:<Class>.<Method>.<OpType>.<ordinal>`
    pub fn dml(class_name: &str, method_name: &str, operation: &str, ordinal: usize) -> Self {
        build_id(
            NodeKind::DmlOperation,
            &[class_name, method_name, operation, &ordinal.to_string()],
        )
    }

    /// `lwc:<Component>`
    pub fn lwc(component: &str) -> Self {
        build_id(NodeKind::LwcComponent, &[component])
    }

    /// `jsclass:<Component>.<Class>`
    pub fn js_class(component: &str, class_name: &str) -> Self {
        build_id(NodeKind::JavaScriptClass, &[component, class_name])
    }

    /// `jsmethod:<Component>.<Class>.<Method>`
    pub fn js_method(component: &str, class_name: &str, method_name: &str) -> Self {
        build_id(
            NodeKind::JavaScriptMethod,
            &[component, class_name, method_name],
        )
    }

    /// `jsfunc:<Component>.<Function>`
    pub fn js_function(component: &str, function_name: &str) -> Self {
        build_id(NodeKind::JavaScriptFunction, &[component, function_name])
    }

    /// `dep:<ModuleSpecifier>`
    pub fn dependency(specifier: &str) -> Self {
        build_id(NodeKind::Dependency, &[specifier])
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind prefix, if the id has one.
    pub fn prefix(&self) -> Option<&str> {
        self.0.split_once(PREFIX_SEPARATOR).map(|(prefix, _)| prefix)
    }

    /// Check that this id is well formed for a node of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] if the prefix is missing or does not
    /// match the kind, or if the id has too few parts.
    pub fn validate_for(&self, kind: NodeKind) -> Result<()> {
        let (prefix, rest) = self.0.split_once(PREFIX_SEPARATOR).ok_or_else(|| {
            GraphError::validation(format!("node id '{}' has no kind prefix", self.0))
        })?;

        if prefix != kind.id_prefix() {
            return Err(GraphError::validation(format!(
                "node id '{}' does not match kind {kind} (expected prefix '{}')",
                self.0,
                kind.id_prefix()
            )));
        }

        if rest.trim().is_empty() {
            return Err(GraphError::validation(format!(
                "node id '{}' has an empty name",
                self.0
            )));
        }

        let min_parts = kind.min_parts();
        if min_parts > 1 {
            let parts: Vec<&str> = rest.split(ID_DELIMITER).collect();
            if parts.len() < min_parts || parts.iter().any(|p| p.is_empty()) {
                return Err(GraphError::validation(format!(
                    "node id '{}' needs at least {min_parts} non-empty parts for kind {kind}",
                    self.0
                )));
            }
            if matches!(kind, NodeKind::SoqlQuery | NodeKind::DmlOperation)
                && parts.last().map_or(true, |p| p.parse::<usize>().is_err())
            {
                return Err(GraphError::validation(format!(
                    "node id '{}' must end with an ordinal",
                    self.0
                )));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        NodeId(value)
    }
}
