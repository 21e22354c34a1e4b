//! Export module for sharing graphs with external tools.
//!
//! Supported formats:
//! - **JSON**: `{nodes, edges}` snapshot, re-importable into any store
//! - **GEXF**: graph exchange XML for Gephi and similar visualisation tools
//!
//! Exports are write-only copies; they are not part of the stores' durability.

pub mod gexf;
pub mod json;

pub use gexf::to_gexf;
pub use json::{import_json, to_json, ImportSummary};

use crate::error::{GraphError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `contents` to `path` via a temporary file in the same directory
/// that is renamed over the target, so readers never see a partial file.
///
/// # Errors
///
/// Returns [`GraphError::Storage`] if the directory cannot be created or the
/// temporary file cannot be written or renamed. The previous file, if any, is
/// left unchanged.
pub fn write_export<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| GraphError::storage(format!("Failed to create {dir:?}"), Some(e)))?;

    let mut file = NamedTempFile::new_in(dir)
        .map_err(|e| GraphError::storage(format!("Failed to create temp file in {dir:?}"), Some(e)))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| GraphError::storage(format!("Failed to write {path:?}"), Some(e)))?;
    file.persist(path)
        .map_err(|e| GraphError::storage(format!("Failed to replace {path:?}"), Some(e.error)))?;

    Ok(())
}
