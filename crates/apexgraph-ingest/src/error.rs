use apexgraph::{ErrorKind, GraphError};
use apexgraph_record::RecordError;
use thiserror::Error;

/// Errors raised by the ingestion pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    /// The record could not be read; nothing from that file was written
    #[error(transparent)]
    Parse(#[from] RecordError),

    /// Every enabled backend rejected a write
    #[error("Graph write failed: {0}")]
    Graph(#[from] GraphError),

    /// Structurally invalid request (missing path, not a directory)
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl IngestError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Parse(_) => ErrorKind::Parse,
            IngestError::Graph(e) => e.kind(),
            IngestError::InvalidInput { .. } => ErrorKind::Validation,
        }
    }
}

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;
