//! The ingestion pipeline: record files in, graph upserts out.

use crate::apex::map_apex_class;
use crate::error::{IngestError, Result};
use crate::report::{BatchReport, ImportReport, IngestMetrics};
use crate::resolver::PlaceholderResolver;
use crate::script::map_script_component;
use crate::writer::GraphWriter;
use apexgraph::{Metadata, RepositoryTag, UnifiedGraphService};
use apexgraph_record::{AstRecord, JsonRecordReader, RecordSource};
use log::{error, info, warn};
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Imports AST records into a [`UnifiedGraphService`].
///
/// The service is borrowed, not owned: one service is constructed at start-up
/// and passed to every ingestor and query caller. Mutating calls are
/// serialized by the stores themselves, so an ingestor may be shared across
/// threads, but only one ingestion run per graph is expected at a time.
pub struct Ingestor<'a> {
    service: &'a UnifiedGraphService,
    source: Box<dyn RecordSource>,
    metrics: Mutex<IngestMetrics>,
}

impl<'a> Ingestor<'a> {
    /// Ingestor reading JSON record files
    pub fn new(service: &'a UnifiedGraphService) -> Self {
        Self::with_source(service, Box::new(JsonRecordReader::new()))
    }

    pub fn with_source(service: &'a UnifiedGraphService, source: Box<dyn RecordSource>) -> Self {
        Self {
            service,
            source,
            metrics: Mutex::new(IngestMetrics::default()),
        }
    }

    pub fn service(&self) -> &'a UnifiedGraphService {
        self.service
    }

    pub fn source(&self) -> &dyn RecordSource {
        self.source.as_ref()
    }

    /// The Placeholder Resolver bound to this ingestor's service
    pub fn resolver(&self) -> PlaceholderResolver<'a> {
        PlaceholderResolver::new(self.service)
    }

    pub fn metrics(&self) -> IngestMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset_metrics(&self) {
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) = IngestMetrics::default();
    }

    /// Import one record file and persist the service.
    ///
    /// # Errors
    ///
    /// [`IngestError::Parse`] when the file is not a readable record (nothing
    /// is written), [`IngestError::Graph`] when every enabled backend failed a
    /// write.
    pub fn import_file(&self, path: &Path, repo: Option<&RepositoryTag>) -> Result<ImportReport> {
        let mut report = self.import_path(path, repo)?;
        report.backend_failures.extend(self.service.persist().failures());
        Ok(report)
    }

    /// Import every record file under `path`, in sorted order.
    ///
    /// A failing file, or a directory entry that cannot be read, is recorded
    /// in the batch and does not stop it. The
    /// service is persisted once, after the last file.
    ///
    /// # Errors
    ///
    /// [`IngestError::InvalidInput`] when `path` is missing or not a directory.
    pub fn import_directory(&self, path: &Path, repo: Option<&RepositoryTag>) -> Result<BatchReport> {
        if !path.exists() {
            return Err(IngestError::invalid_input(format!(
                "directory {} does not exist",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(IngestError::invalid_input(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let entries = self.source.discover_files(path);
        info!(
            "Importing {} record files from {} ({} source)",
            entries.len(),
            path.display(),
            self.source.name()
        );

        let mut batch = BatchReport::default();
        for entry in entries {
            let file = match entry {
                Ok(file) => file,
                Err(e) => {
                    let file = e.path().to_path_buf();
                    let e = IngestError::from(e);
                    error!("Failed to discover {}: {e}", file.display());
                    batch.push(ImportReport::failed(&file, self.service.backend_mode(), &e));
                    continue;
                }
            };

            match self.import_path(&file, repo) {
                Ok(report) => batch.push(report),
                Err(e) => {
                    error!("Failed to import {}: {e}", file.display());
                    batch.push(ImportReport::failed(&file, self.service.backend_mode(), &e));
                }
            }
        }

        let persisted = self.service.persist();
        for failure in persisted.failures() {
            warn!("Persist failed on {} backend: {}", failure.backend, failure.message);
        }
        batch.persist_failures = persisted.failures();

        info!(
            "Imported {}/{} files from {} ({} failed)",
            batch.successful,
            batch.total,
            path.display(),
            batch.failed
        );
        Ok(batch)
    }

    /// Import a record that is already in memory. Nothing is persisted.
    pub fn import_record(
        &self,
        record: &AstRecord,
        file_name: &Path,
        repo: Option<&RepositoryTag>,
    ) -> Result<ImportReport> {
        let start = Instant::now();
        let result = self.write_record(record, file_name, repo);
        self.record_outcome(&result, start);
        result
    }

    fn import_path(&self, path: &Path, repo: Option<&RepositoryTag>) -> Result<ImportReport> {
        let start = Instant::now();
        let result = self
            .source
            .read_record(path)
            .map_err(IngestError::from)
            .and_then(|record| self.write_record(&record, path, repo));
        self.record_outcome(&result, start);
        result
    }

    fn write_record(
        &self,
        record: &AstRecord,
        path: &Path,
        repo: Option<&RepositoryTag>,
    ) -> Result<ImportReport> {
        let mut writer = GraphWriter::new(self.service, Metadata::for_repository(repo));
        let mut report = ImportReport::started(path, self.service.backend_mode());
        report.method_count = record.method_count();

        report.node_id = match record {
            AstRecord::ApexClass(class) => {
                report.class_name = Some(class.name.clone());
                map_apex_class(&mut writer, class)?
            }
            AstRecord::ScriptComponent(component) => {
                report.component_name = Some(component.name.clone());
                let mapping = map_script_component(&mut writer, &self.resolver(), component)?;
                report.resolutions = mapping.resolutions;
                mapping.component
            }
        };
        if report.node_id.is_none() {
            let reason = writer.rejected.first().cloned().unwrap_or_default();
            warn!("Root node of {} was rejected: {reason}", path.display());
            report.success = false;
            report.error = Some(format!("Root node rejected: {reason}"));
        }

        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.nodes_written += writer.nodes_written;
        metrics.edges_written += writer.edges_written;
        metrics.placeholders_seen += report
            .resolutions
            .iter()
            .map(|r| {
                r.class.iter().chain(r.method.iter()).filter(|t| t.placeholder).count()
            })
            .sum::<usize>();

        report.backend_failures = writer.failures;
        report.rejected = writer.rejected;
        Ok(report)
    }

    fn record_outcome(&self, result: &Result<ImportReport>, start: Instant) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.files_attempted += 1;
        metrics.total_import_time += start.elapsed();
        if result.as_ref().is_ok_and(|report| report.success) {
            metrics.files_succeeded += 1;
        } else {
            metrics.files_failed += 1;
        }
    }
}
