//! apexgraph record API
//!
//! Normalized per-file AST records exchanged between a language parser and
//! the apexgraph ingestion pipeline.
//!
//! This crate defines:
//!
//! - **Records**: [`AstRecord`], one per source file, either an Apex class or a
//!   component script
//! - **Entities**: methods, queries, DML operations, script classes and functions
//! - **Relationships**: script imports and the Apex-import convention
//!   (`<namespace>/apex/<Class>[.<Method>]`)
//! - **RecordSource trait**: the interface a parser collaborator implements
//! - **JsonRecordReader**: a source for records stored as tagged JSON files
//! - **Error handling**: [`RecordError`], raised instead of returning partial records
//!
//! # Example
//!
//! ```rust,no_run
//! use apexgraph_record::{AstRecord, JsonRecordReader, RecordSource};
//! use std::path::Path;
//!
//! let reader = JsonRecordReader::new();
//! match reader.read_record(Path::new("records/Ctrl.json")).unwrap() {
//!     AstRecord::ApexClass(class) => println!("{} methods", class.methods.len()),
//!     AstRecord::ScriptComponent(component) => println!("{} imports", component.imports.len()),
//! }
//! ```

pub mod config;
pub mod entities;
pub mod errors;
pub mod reader;
pub mod record;
pub mod relationships;
pub mod traits;

// Re-export commonly used types
pub use config::ReaderConfig;
pub use entities::{
    ApexClassRecord, ApexMethodRecord, DmlOperationRecord, MethodCallRecord,
    ScriptClassRecord, ScriptComponentRecord, ScriptExportRecord, ScriptFunctionRecord,
    ScriptMethodRecord, ScriptPropertyRecord, SoqlQueryRecord,
};
pub use errors::{RecordError, RecordResult};
pub use reader::JsonRecordReader;
pub use record::AstRecord;
pub use relationships::{parse_apex_import, ApexDependency, ImportRecord};
pub use traits::RecordSource;
