//! Engine configuration.
//!
//! Built from defaults, an optional TOML file and environment overrides, then
//! handed to [`UnifiedGraphService::from_config`](crate::UnifiedGraphService::from_config).

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`EngineConfig::data_dir`].
pub const ENV_DATA_DIR: &str = "APEXGRAPH_DATA_DIR";
/// Environment variable enabling the Neo4j backend (`true`/`1`/`yes`).
pub const ENV_USE_NEO4J: &str = "USE_NEO4J";
/// Environment variable overriding [`Neo4jConfig::uri`].
pub const ENV_NEO4J_URI: &str = "NEO4J_URI";
/// Environment variable overriding [`Neo4jConfig::user`].
pub const ENV_NEO4J_USER: &str = "NEO4J_USER";
/// Environment variable overriding [`Neo4jConfig::password`].
pub const ENV_NEO4J_PASSWORD: &str = "NEO4J_PASSWORD";
/// Environment variable overriding [`Neo4jConfig::database`].
pub const ENV_NEO4J_DATABASE: &str = "NEO4J_DATABASE";
/// Environment variable overriding [`Neo4jConfig::timeout`], in seconds.
pub const ENV_NEO4J_TIMEOUT_SECS: &str = "NEO4J_TIMEOUT_SECS";

/// Key-value store used by the embedded backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// RocksDB under `<data_dir>/kv`
    #[default]
    RocksDb,
    /// Process memory; nothing survives a restart
    Memory,
}

/// Connection settings for the external Neo4j backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jConfig {
    /// Whether to try the external backend at all
    pub enabled: bool,

    /// Bolt URI of the server, e.g. `bolt://localhost:7687`.
    /// `memory://` selects the in-process transport.
    pub uri: String,

    /// User for basic auth (None = no authentication)
    pub user: Option<String>,

    /// Password for basic auth
    pub password: Option<String>,

    /// Database name
    pub database: String,

    /// Timeout per Cypher call (None = no timeout)
    #[serde(with = "duration_option")]
    pub timeout: Option<Duration>,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            uri: "bolt://localhost:7687".to_string(),
            user: None,
            password: None,
            database: "neo4j".to_string(),
            timeout: Some(Duration::from_secs(10)),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graph data directory (key-value store, legacy snapshots, exports)
    pub data_dir: PathBuf,

    /// Whether the embedded backend is enabled
    pub embedded: bool,

    /// Storage used by the embedded backend
    pub storage: StorageKind,

    /// External backend settings
    pub neo4j: Neo4jConfig,
}

// Helper module for serializing Duration as whole seconds
mod duration_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("graphdata"),
            embedded: true,
            storage: StorageKind::RocksDb,
            neo4j: Neo4jConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Embedded in-memory backend only. Used by tests and one-off runs.
    pub fn in_memory() -> Self {
        Self {
            storage: StorageKind::Memory,
            ..Default::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if the document is not valid TOML or a
    /// value has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GraphError::Config {
            message: format!("invalid configuration: {e}"),
        })
    }

    /// Read a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| GraphError::Config {
            message: format!("cannot read {path:?}: {e}"),
        })?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GraphError::Config {
            message: format!("cannot serialize configuration: {e}"),
        })
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source; `lookup` returns `None` for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Config`] if a boolean or numeric variable cannot
    /// be parsed.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup(ENV_USE_NEO4J) {
            self.neo4j.enabled = parse_flag(ENV_USE_NEO4J, &flag)?;
        }
        if let Some(uri) = lookup(ENV_NEO4J_URI) {
            self.neo4j.uri = uri;
        }
        if let Some(user) = lookup(ENV_NEO4J_USER) {
            self.neo4j.user = Some(user);
        }
        if let Some(password) = lookup(ENV_NEO4J_PASSWORD) {
            self.neo4j.password = Some(password);
        }
        if let Some(database) = lookup(ENV_NEO4J_DATABASE) {
            self.neo4j.database = database;
        }
        if let Some(secs) = lookup(ENV_NEO4J_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| GraphError::Config {
                message: format!("{ENV_NEO4J_TIMEOUT_SECS} must be a number of seconds, got '{secs}'"),
            })?;
            self.neo4j.timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Enable or disable the embedded backend.
    pub fn with_embedded(mut self, enabled: bool) -> Self {
        self.embedded = enabled;
        self
    }

    /// Select the embedded storage.
    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Replace the external backend settings.
    pub fn with_neo4j(mut self, neo4j: Neo4jConfig) -> Self {
        self.neo4j = neo4j;
        self
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(GraphError::Config {
            message: format!("{name} must be a boolean, got '{other}'"),
        }),
    }
}
