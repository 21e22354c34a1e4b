use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading a normalized AST record
#[derive(Error, Debug)]
pub enum RecordError {
    /// Failed to read file
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Record is structurally invalid (missing name, empty method, too large)
    #[error("Malformed record in {0}: {1}")]
    Malformed(PathBuf, String),

    /// File is not valid JSON or does not match the record shape
    #[error("Invalid record JSON in {0}: {1}")]
    Json(PathBuf, #[source] serde_json::Error),

    /// No reader handles this file or record type
    #[error("Unsupported record file {0}")]
    Unsupported(PathBuf),
}

impl RecordError {
    /// File the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            RecordError::Io(path, _)
            | RecordError::Malformed(path, _)
            | RecordError::Json(path, _)
            | RecordError::Unsupported(path) => path,
        }
    }
}

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;
