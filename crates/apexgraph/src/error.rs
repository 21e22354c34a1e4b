//! Error types for apexgraph operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.
//! Every variant maps onto one [`ErrorKind`] so callers can branch on the
//! failure class without matching individual variants.

use thiserror::Error;

/// Result type alias for apexgraph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Coarse failure classes shared by the store, the service and the ingestion crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed AST record; aborts ingestion of that file only
    Parse,
    /// One storage backend unreachable or failed
    Backend,
    /// Query for something that does not exist
    NotFound,
    /// Malformed node or edge key; rejects a single upsert
    Validation,
}

/// Comprehensive error type for all graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Storage layer error (RocksDB, file I/O, etc.)
    #[error("Storage error: {message}")]
    Storage {
        /// Detailed error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error details
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed node id, kind mismatch, or dangling edge endpoint
    #[error("Validation error: {message}")]
    Validation {
        /// Description of what was rejected
        message: String,
    },

    /// A specific backend failed (network, timeout, server-side error)
    #[error("Backend '{backend}' failed: {message}")]
    Backend {
        /// Backend name (`local` or `external`)
        backend: String,
        /// Error details
        message: String,
    },

    /// Node not found in the graph
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// ID of the missing node
        node_id: String,
    },

    /// No backend is enabled for a write
    #[error("No graph backend is available")]
    NoBackend,

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error details
        message: String,
    },
}

impl GraphError {
    /// Create a storage error from a message and optional source.
    pub fn storage<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a serialization error from a message and optional source.
    pub fn serialization<E>(message: impl Into<String>, source: Option<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Serialization {
            message: message.into(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a backend error tagged with the backend name.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::Validation { .. } => ErrorKind::Validation,
            GraphError::NodeNotFound { .. } => ErrorKind::NotFound,
            GraphError::Serialization { .. } => ErrorKind::Parse,
            GraphError::Storage { .. }
            | GraphError::Backend { .. }
            | GraphError::NoBackend
            | GraphError::Config { .. } => ErrorKind::Backend,
        }
    }
}
