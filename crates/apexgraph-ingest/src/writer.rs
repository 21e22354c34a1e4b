//! Per-file write context over the unified service.

use crate::error::{IngestError, Result};
use apexgraph::{
    BackendFailure, EdgeAttributes, EdgeKind, ErrorKind, Metadata, Node, NodeData, NodeId,
    UnifiedGraphService, WriteOutcome,
};
use log::{debug, warn};

/// Collects the side effects of writing one record: per-backend failures,
/// upserts rejected by validation and the number of accepted writes.
///
/// A validation error rejects only the upsert that caused it. Any other error
/// on every enabled backend aborts the record.
pub(crate) struct GraphWriter<'a> {
    service: &'a UnifiedGraphService,
    metadata: Metadata,
    pub(crate) failures: Vec<BackendFailure>,
    pub(crate) rejected: Vec<String>,
    pub(crate) nodes_written: usize,
    pub(crate) edges_written: usize,
}

impl<'a> GraphWriter<'a> {
    pub(crate) fn new(service: &'a UnifiedGraphService, metadata: Metadata) -> Self {
        Self {
            service,
            metadata,
            failures: Vec::new(),
            rejected: Vec::new(),
            nodes_written: 0,
            edges_written: 0,
        }
    }

    /// Upsert a node. `Ok(false)` when the upsert was rejected.
    pub(crate) fn node(&mut self, id: NodeId, data: NodeData) -> Result<bool> {
        debug!("Upserting {} {id}", data.kind());
        let outcome = self.service.upsert_node(id, data, self.metadata.clone());
        let stored = self.settle(outcome)?.is_some();
        if stored {
            self.nodes_written += 1;
        }
        Ok(stored)
    }

    /// Upsert an edge. `Ok(false)` when the upsert was rejected.
    pub(crate) fn edge(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        kind: EdgeKind,
        attributes: EdgeAttributes,
    ) -> Result<bool> {
        debug!("Upserting {kind} {from} -> {to}");
        let outcome = self.service.upsert_edge(
            from.clone(),
            to.clone(),
            kind,
            attributes,
            self.metadata.clone(),
        );
        let stored = self.settle(outcome)?.is_some();
        if stored {
            self.edges_written += 1;
        }
        Ok(stored)
    }

    /// Return the node stored under `id`, creating `fallback` where it is missing.
    pub(crate) fn ensure(&mut self, id: NodeId, fallback: NodeData) -> Result<Option<Node>> {
        let outcome = self.service.ensure_node(id, fallback, self.metadata.clone());
        self.settle(outcome)
    }

    fn settle<T>(&mut self, outcome: apexgraph::Result<WriteOutcome<T>>) -> Result<Option<T>> {
        let result = match outcome {
            Ok(outcome) => {
                self.failures.extend(outcome.failures());
                outcome.into_result()
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::Validation => {
                warn!("Rejected upsert: {e}");
                self.rejected.push(e.to_string());
                Ok(None)
            }
            Err(e) => Err(IngestError::Graph(e)),
        }
    }
}
