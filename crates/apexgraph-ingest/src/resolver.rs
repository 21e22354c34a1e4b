//! Placeholder Resolver for cross-language references.
//!
//! A component script that imports `@ns/apex/Ctrl.getData` depends on
//! `class:Ctrl` and calls `method:Ctrl.getData`. When those nodes are not in
//! the graph yet, placeholders are created at the same ids so the edges are
//! valid right away. A later real upsert of `Ctrl` replaces the placeholders
//! in place and the edges keep pointing at them.

use crate::apex::{class_id, method_id};
use crate::error::Result;
use crate::writer::GraphWriter;
use apexgraph::{
    BackendFailure, EdgeAttributes, EdgeKind, Metadata, NodeData, NodeId, UnifiedGraphService,
};
use apexgraph_record::ApexDependency;
use log::debug;
use serde::Serialize;

/// Reason stored on placeholders created by the resolver
pub const PLACEHOLDER_REASON: &str = "referenced before ingestion";

/// One resolved end of a cross-language edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTarget {
    pub node_id: NodeId,
    /// The target did not exist and a placeholder stands in for it
    pub placeholder: bool,
    /// The edge from the component was stored
    pub linked: bool,
}

/// Result of resolving one Apex import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub dependency: ApexDependency,
    /// `None` when the class node was rejected
    pub class: Option<ResolvedTarget>,
    pub method: Option<ResolvedTarget>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub backend_failures: Vec<BackendFailure>,
}

impl Resolution {
    /// Whether any target is still a placeholder
    pub fn has_placeholder(&self) -> bool {
        self.class.iter().chain(self.method.iter()).any(|t| t.placeholder)
    }
}

/// Links components to the Apex classes and methods they import
pub struct PlaceholderResolver<'a> {
    service: &'a UnifiedGraphService,
}

impl<'a> PlaceholderResolver<'a> {
    pub fn new(service: &'a UnifiedGraphService) -> Self {
        Self { service }
    }

    /// Resolve `dependency` for `component`, creating placeholders as needed.
    ///
    /// The component node must already exist.
    pub fn resolve(
        &self,
        component: &NodeId,
        dependency: &ApexDependency,
        attributes: EdgeAttributes,
        metadata: Metadata,
    ) -> Result<Resolution> {
        let mut writer = GraphWriter::new(self.service, metadata);
        let mut resolution = self.resolve_with(&mut writer, component, dependency, attributes)?;
        resolution.backend_failures = writer.failures;
        Ok(resolution)
    }

    pub(crate) fn resolve_with(
        &self,
        writer: &mut GraphWriter<'_>,
        component: &NodeId,
        dependency: &ApexDependency,
        attributes: EdgeAttributes,
    ) -> Result<Resolution> {
        let class_name = dependency.class_name.as_str();
        let class = Self::link(
            writer,
            component,
            class_id(class_name),
            NodeData::class_placeholder(class_name, PLACEHOLDER_REASON),
            EdgeKind::DependsOnApexClass,
            attributes.clone(),
        )?;

        let method = match (&class, dependency.method_name.as_deref()) {
            (Some(_), Some(method_name)) => Self::link(
                writer,
                component,
                method_id(class_name, method_name),
                NodeData::method_placeholder(class_name, method_name, PLACEHOLDER_REASON),
                EdgeKind::CallsApexMethod,
                attributes,
            )?,
            _ => None,
        };

        Ok(Resolution {
            dependency: dependency.clone(),
            class,
            method,
            backend_failures: Vec::new(),
        })
    }

    fn link(
        writer: &mut GraphWriter<'_>,
        component: &NodeId,
        target: NodeId,
        fallback: NodeData,
        kind: EdgeKind,
        attributes: EdgeAttributes,
    ) -> Result<Option<ResolvedTarget>> {
        let Some(node) = writer.ensure(target.clone(), fallback)? else {
            return Ok(None);
        };
        if node.is_placeholder() {
            debug!("{component} references {target} before ingestion");
        }
        let linked = writer.edge(component, &target, kind, attributes)?;

        Ok(Some(ResolvedTarget {
            node_id: target,
            placeholder: node.is_placeholder(),
            linked,
        }))
    }
}
