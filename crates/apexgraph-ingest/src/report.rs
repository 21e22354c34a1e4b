//! Per-file and per-directory import reports, and running ingestion metrics.

use crate::error::IngestError;
use crate::resolver::Resolution;
use apexgraph::{BackendFailure, BackendMode, NodeId};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

/// Outcome of importing one record file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub file_name: String,
    pub success: bool,
    /// Root node of the record (`class:<Name>` or `lwc:<name>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    /// Set for Apex class records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Set for script component records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
    pub method_count: usize,
    pub backend_mode: BackendMode,
    pub backend_failures: Vec<BackendFailure>,
    /// Upserts rejected by validation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<String>,
    /// Cross-language references of a script component
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resolutions: Vec<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportReport {
    pub(crate) fn started(path: &Path, backend_mode: BackendMode) -> Self {
        Self {
            file_name: file_name(path),
            success: true,
            node_id: None,
            class_name: None,
            component_name: None,
            method_count: 0,
            backend_mode,
            backend_failures: Vec::new(),
            rejected: Vec::new(),
            resolutions: Vec::new(),
            error: None,
        }
    }

    /// Report for a file whose import raised `error`
    pub fn failed(path: &Path, backend_mode: BackendMode, error: &IngestError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Self::started(path, backend_mode)
        }
    }

    /// Whether every backend accepted every write of this file
    pub fn is_clean(&self) -> bool {
        self.success && self.backend_failures.is_empty() && self.rejected.is_empty()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of importing a directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<ImportReport>,
    /// Failures of the final persist
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persist_failures: Vec<BackendFailure>,
}

impl BatchReport {
    pub(crate) fn push(&mut self, report: ImportReport) {
        self.total += 1;
        if report.success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(report);
    }

    /// Reports of the files that failed
    pub fn failures(&self) -> impl Iterator<Item = &ImportReport> {
        self.results.iter().filter(|r| !r.success)
    }

    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }
}

/// Running totals over the lifetime of an [`Ingestor`](crate::Ingestor)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestMetrics {
    /// Total files attempted
    pub files_attempted: usize,

    /// Files imported
    pub files_succeeded: usize,

    /// Files that failed to import
    pub files_failed: usize,

    /// Total time spent importing
    pub total_import_time: Duration,

    /// Node upserts accepted by at least one backend
    pub nodes_written: usize,

    /// Edge upserts accepted by at least one backend
    pub edges_written: usize,

    /// Placeholders created or still standing in for a referenced target
    pub placeholders_seen: usize,
}
