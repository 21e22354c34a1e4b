//! # apexgraph
//!
//! A typed, directed property multigraph of Salesforce code structure: Apex
//! classes and their methods, SOQL queries and DML operations, Lightning Web
//! Components and their scripts, and the cross-language edges between them.
//!
//! ## Core Principles
//!
//! - **Deterministic identity**: node ids are built from names, so re-ingesting
//!   a file reproduces the same ids
//! - **Upsert only**: every mutation is insert-or-replace keyed by id or by
//!   `(from, kind, to)`
//! - **Backend agnostic**: the same [`GraphStore`] contract for the embedded
//!   store and an external Neo4j database
//! - **Explicit wiring**: one [`UnifiedGraphService`] constructed by the caller
//!
//! ## Architecture
//!
//! ```text
//! Ingestion pipeline (apexgraph-ingest)
//!     ↓
//! UnifiedGraphService (fan-out writes, fallback reads)
//!     ↓                         ↓
//! EmbeddedGraphStore        ExternalGraphStore
//!     ↓                         ↓
//! StorageBackend            CypherTransport
//! (RocksDB, memory)         (Neo4j Bolt, in-process)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use apexgraph::{EngineConfig, Metadata, NodeData, NodeId, UnifiedGraphService};
//!
//! let service = UnifiedGraphService::from_config(&EngineConfig::in_memory());
//! let outcome = service
//!     .upsert_node(
//!         NodeId::apex_class("Ctrl"),
//!         NodeData::class_placeholder("Ctrl", "referenced before ingestion"),
//!         Metadata::new(),
//!     )
//!     .unwrap();
//! assert!(outcome.all_succeeded());
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod service;
pub mod storage;
pub mod store;

// Re-export main types
pub use config::{EngineConfig, Neo4jConfig, StorageKind};
pub use error::{ErrorKind, GraphError, Result};
pub use graph::{
    build_id, Direction, Edge, EdgeAttributes, EdgeKey, EdgeKind, GraphSnapshot, GraphStats,
    Metadata, Node, NodeData, NodeId, NodeKind, RepositoryTag,
};
pub use service::{
    BackendFailure, BackendMode, ExportFormat, ServiceStats, UnifiedGraphService, WriteOutcome,
};
#[cfg(feature = "rocksdb-backend")]
pub use storage::RocksDBBackend;
pub use storage::{MemoryBackend, StorageBackend};
pub use store::{EmbeddedGraphStore, ExternalGraphStore, GraphStore, MemoryTransport};
