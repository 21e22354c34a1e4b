//! Canonical entity model.
//!
//! This module defines the vocabulary shared by every producer and backend:
//! - [`NodeId`] and [`build_id`]: deterministic node identity
//! - [`NodeKind`] / [`EdgeKind`]: the closed sets of entity and relationship kinds
//! - [`NodeData`]: typed attributes per node kind
//! - [`Node`], [`Edge`], [`GraphSnapshot`], [`GraphStats`]

mod attributes;
mod ids;
mod metadata;
mod types;

pub use attributes::{
    ApexClassAttributes, ApexMethodAttributes, DependencyAttributes, DmlOperationAttributes,
    EdgeAttributes, JavaScriptClassAttributes, JavaScriptFunctionAttributes,
    JavaScriptMethodAttributes, JsMethodKind, LwcComponentAttributes, NodeData,
    PlaceholderAttributes, SoqlQueryAttributes,
};
pub use ids::{build_id, sanitize_part, NodeId, ID_DELIMITER, PREFIX_SEPARATOR};
pub use metadata::{Metadata, RepositoryTag, REPOSITORY_ID_KEY, REPOSITORY_KEY};
pub use types::{
    Direction, Edge, EdgeKey, EdgeKind, GraphSnapshot, GraphStats, Node, NodeKind,
};
