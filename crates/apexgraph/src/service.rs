//! Unified graph service: one object in front of the embedded and the external store.
//!
//! Writes fan out to every enabled backend and report per-backend results;
//! nothing is rolled back when only one backend fails, so the two stores can
//! diverge until the affected file is ingested again. Reads try the external
//! store first and fall back to the embedded one.

use crate::config::{EngineConfig, StorageKind};
use crate::error::{ErrorKind, GraphError, Result};
use crate::export;
use crate::graph::{
    Direction, Edge, EdgeAttributes, EdgeKind, GraphSnapshot, GraphStats, Metadata, Node,
    NodeData, NodeId,
};
use crate::store::{validate_endpoint, EmbeddedGraphStore, ExternalGraphStore, GraphStore};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which backends are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// No backend; writes fail and reads return empty results
    None,
    /// Embedded store only
    Local,
    /// External store only
    External,
    /// Both stores
    Both,
}

impl BackendMode {
    fn from_flags(local: bool, external: bool) -> Self {
        match (local, external) {
            (true, true) => BackendMode::Both,
            (true, false) => BackendMode::Local,
            (false, true) => BackendMode::External,
            (false, false) => BackendMode::None,
        }
    }

    /// Lowercase name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::None => "none",
            BackendMode::Local => "local",
            BackendMode::External => "external",
            BackendMode::Both => "both",
        }
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend's failure during a fan-out write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendFailure {
    /// `local` or `external`
    pub backend: String,
    /// Error message
    pub message: String,
    /// Failure class
    #[serde(skip)]
    pub kind: ErrorKind,
}

/// Per-backend results of one fan-out write. `None` means the backend is disabled.
#[derive(Debug)]
pub struct WriteOutcome<T> {
    /// Embedded store result
    pub local: Option<Result<T>>,
    /// External store result
    pub external: Option<Result<T>>,
}

impl<T> WriteOutcome<T> {
    /// Failures of enabled backends, local first.
    pub fn failures(&self) -> Vec<BackendFailure> {
        [("local", &self.local), ("external", &self.external)]
            .into_iter()
            .filter_map(|(backend, result)| match result {
                Some(Err(e)) => Some(BackendFailure {
                    backend: backend.to_string(),
                    message: e.to_string(),
                    kind: e.kind(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Whether every enabled backend succeeded.
    pub fn all_succeeded(&self) -> bool {
        !matches!(self.local, Some(Err(_))) && !matches!(self.external, Some(Err(_)))
    }

    /// The local value if the embedded store succeeded, else the external one.
    ///
    /// # Errors
    ///
    /// Returns the first error when no enabled backend succeeded, and
    /// [`GraphError::NoBackend`] when no backend is enabled.
    pub fn into_result(self) -> Result<T> {
        match (self.local, self.external) {
            (Some(Ok(value)), _) | (_, Some(Ok(value))) => Ok(value),
            (Some(Err(e)), _) | (None, Some(Err(e))) => Err(e),
            (None, None) => Err(GraphError::NoBackend),
        }
    }
}

/// Graph statistics plus the active backend mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    /// Counts from the backend that answered
    #[serde(flatten)]
    pub graph: GraphStats,
    /// Active backends
    pub backend_mode: BackendMode,
}

/// Export format for [`UnifiedGraphService::export_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `{nodes, edges}` JSON, re-importable
    Json,
    /// GEXF 1.2 XML
    Gexf,
}

/// Fan-out/fallback coordinator over the embedded and the external store.
///
/// Constructed once and passed to the ingestion pipeline and query callers.
pub struct UnifiedGraphService {
    embedded: Option<Box<dyn GraphStore>>,
    external: Option<Box<dyn GraphStore>>,
}

impl UnifiedGraphService {
    /// Build a service over already-opened stores.
    pub fn new(
        embedded: Option<Box<dyn GraphStore>>,
        external: Option<Box<dyn GraphStore>>,
    ) -> Self {
        let service = Self { embedded, external };
        info!("Graph service backend mode: {}", service.backend_mode());
        service
    }

    /// Open the backends enabled in `config`.
    ///
    /// A backend that fails to open or to answer its probe is left disabled
    /// with a warning; the service then runs with the remaining backend.
    pub fn from_config(config: &EngineConfig) -> Self {
        let embedded = if config.embedded {
            match open_embedded(config) {
                Ok(store) => Some(Box::new(store) as Box<dyn GraphStore>),
                Err(e) => {
                    warn!("Embedded graph store unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        let external = if config.neo4j.enabled {
            match ExternalGraphStore::connect(&config.neo4j) {
                Ok(store) => Some(Box::new(store) as Box<dyn GraphStore>),
                Err(e) => {
                    warn!("External graph store unavailable at {}: {e}", config.neo4j.uri);
                    None
                }
            }
        } else {
            None
        };

        Self::new(embedded, external)
    }

    /// Active backends.
    pub fn backend_mode(&self) -> BackendMode {
        BackendMode::from_flags(self.embedded.is_some(), self.external.is_some())
    }

    /// The embedded store, if enabled.
    pub fn embedded(&self) -> Option<&dyn GraphStore> {
        self.embedded.as_deref()
    }

    /// The external store, if enabled.
    pub fn external(&self) -> Option<&dyn GraphStore> {
        self.external.as_deref()
    }

    fn fan_out<T>(&self, op: impl Fn(&dyn GraphStore) -> Result<T>) -> WriteOutcome<T> {
        let run = |store: &dyn GraphStore| {
            let result = op(store);
            if let Err(e) = &result {
                warn!("Backend '{}' write failed: {e}", store.backend_name());
            }
            result
        };

        WriteOutcome {
            local: self.embedded.as_deref().map(run),
            external: self.external.as_deref().map(run),
        }
    }

    fn require_backend(&self) -> Result<()> {
        match self.backend_mode() {
            BackendMode::None => Err(GraphError::NoBackend),
            _ => Ok(()),
        }
    }

    /// External first, then embedded; `T::default()` when neither can answer.
    fn read<T: Default>(&self, what: &str, op: impl Fn(&dyn GraphStore) -> Result<T>) -> Result<T> {
        if let Some(external) = self.external.as_deref() {
            match op(external) {
                Ok(value) => return Ok(value),
                Err(e) if self.embedded.is_some() => {
                    warn!("External {what} failed, falling back to embedded store: {e}");
                }
                Err(e) => {
                    warn!("External {what} failed and no embedded store is configured: {e}");
                    return Ok(T::default());
                }
            }
        }

        match self.embedded.as_deref() {
            Some(embedded) => op(embedded),
            None => Ok(T::default()),
        }
    }

    /// Upsert a node on every enabled backend.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] before any backend is touched if the
    /// id does not fit the kind, and [`GraphError::NoBackend`] if no backend is
    /// enabled. Per-backend failures are reported in the outcome.
    pub fn upsert_node(
        &self,
        id: NodeId,
        data: NodeData,
        metadata: Metadata,
    ) -> Result<WriteOutcome<Node>> {
        id.validate_for(data.kind())?;
        self.require_backend()?;
        Ok(self.fan_out(|store| store.upsert_node(id.clone(), data.clone(), metadata.clone())))
    }

    /// Upsert an edge on every enabled backend.
    pub fn upsert_edge(
        &self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        attributes: EdgeAttributes,
        metadata: Metadata,
    ) -> Result<WriteOutcome<Edge>> {
        validate_endpoint(&from)?;
        validate_endpoint(&to)?;
        self.require_backend()?;
        Ok(self.fan_out(|store| {
            store.upsert_edge(
                from.clone(),
                to.clone(),
                kind,
                attributes.clone(),
                metadata.clone(),
            )
        }))
    }

    /// On each backend, return the node stored under `id`, or store `fallback`
    /// there first when it is missing.
    ///
    /// Used to create placeholders without overwriting a node that one backend
    /// already holds.
    pub fn ensure_node(
        &self,
        id: NodeId,
        fallback: NodeData,
        metadata: Metadata,
    ) -> Result<WriteOutcome<Node>> {
        id.validate_for(fallback.kind())?;
        self.require_backend()?;
        Ok(self.fan_out(|store| match store.get_node(&id)? {
            Some(node) => Ok(node),
            None => store.upsert_node(id.clone(), fallback.clone(), metadata.clone()),
        }))
    }

    /// Clear every enabled backend.
    pub fn clear(&self) -> WriteOutcome<()> {
        info!("Clearing graph ({} backends)", self.backend_mode());
        self.fan_out(|store| store.clear())
    }

    /// Persist every enabled backend.
    pub fn persist(&self) -> WriteOutcome<()> {
        self.fan_out(|store| store.persist())
    }

    /// The whole graph.
    pub fn full_graph(&self) -> Result<GraphSnapshot> {
        self.read("full graph read", |store| store.snapshot())
    }

    /// A class node and its direct successors; empty when the class is unknown.
    pub fn class_graph(&self, class_name: &str) -> Result<GraphSnapshot> {
        self.read("class graph read", |store| store.class_graph(class_name))
    }

    /// Look up one node.
    pub fn get_node(&self, id: &NodeId) -> Result<Option<Node>> {
        self.read("node read", |store| store.get_node(id))
    }

    /// Neighbors of one node.
    pub fn neighbors(&self, id: &NodeId, direction: Direction) -> Result<Vec<NodeId>> {
        self.read("neighbor read", |store| store.neighbors(id, direction))
    }

    /// Counts per kind plus the backend mode.
    pub fn stats(&self) -> Result<ServiceStats> {
        Ok(ServiceStats {
            graph: self.read("stats read", |store| store.stats())?,
            backend_mode: self.backend_mode(),
        })
    }

    /// Placeholders still waiting for a real node, sorted by id.
    pub fn unresolved_placeholders(&self) -> Result<Vec<Node>> {
        self.read("placeholder read", |store| store.unresolved_placeholders())
    }

    /// Import a JSON export into every enabled backend.
    pub fn import_json(&self, text: &str) -> Result<WriteOutcome<export::ImportSummary>> {
        self.require_backend()?;
        Ok(self.fan_out(|store| export::import_json(store, text)))
    }

    /// Write the full graph to `path` in the given format.
    pub fn export_to<P: AsRef<Path>>(&self, format: ExportFormat, path: P) -> Result<()> {
        let snapshot = self.full_graph()?;
        let contents = match format {
            ExportFormat::Json => export::to_json(&snapshot)?,
            ExportFormat::Gexf => export::to_gexf(&snapshot),
        };
        export::write_export(path.as_ref(), &contents)?;
        info!(
            "Exported {} nodes and {} edges to {:?}",
            snapshot.nodes.len(),
            snapshot.edges.len(),
            path.as_ref()
        );
        Ok(())
    }
}

fn open_embedded(config: &EngineConfig) -> Result<EmbeddedGraphStore> {
    match config.storage {
        StorageKind::Memory => EmbeddedGraphStore::in_memory(),
        #[cfg(feature = "rocksdb-backend")]
        StorageKind::RocksDb => EmbeddedGraphStore::open(&config.data_dir),
        #[cfg(not(feature = "rocksdb-backend"))]
        StorageKind::RocksDb => Err(GraphError::Config {
            message: "built without the rocksdb-backend feature".to_string(),
        }),
    }
}
