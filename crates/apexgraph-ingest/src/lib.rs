//! Ingestion pipeline for apexgraph
//!
//! Turns normalized per-file AST records into graph upserts on a
//! [`UnifiedGraphService`](apexgraph::UnifiedGraphService):
//!
//! - Apex class records: class, methods, SOQL queries and DML operations
//! - Component script records: component, imports, classes, methods and
//!   functions
//! - Apex imports (`@salesforce/apex/Ctrl.getData`): cross-language edges,
//!   through the [`PlaceholderResolver`] when the target is not ingested yet
//!
//! Files may be ingested in any order; once every file has been seen the graph
//! is the same.
//!
//! # Example
//!
//! ```rust,no_run
//! use apexgraph::{EngineConfig, UnifiedGraphService};
//! use apexgraph_ingest::Ingestor;
//! use std::path::Path;
//!
//! let service = UnifiedGraphService::from_config(&EngineConfig::default());
//! let ingestor = Ingestor::new(&service);
//! let batch = ingestor.import_directory(Path::new("records"), None).unwrap();
//! println!("{}/{} files imported", batch.successful, batch.total);
//! ```

mod apex;
mod error;
mod pipeline;
mod report;
mod resolver;
mod script;
mod writer;

pub use error::{IngestError, Result};
pub use pipeline::Ingestor;
pub use report::{BatchReport, ImportReport, IngestMetrics};
pub use resolver::{PlaceholderResolver, Resolution, ResolvedTarget, PLACEHOLDER_REASON};
