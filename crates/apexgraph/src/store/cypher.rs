//! Cypher transport: how the external store reaches the graph database.
//!
//! [`BoltTransport`] talks to Neo4j over Bolt through the `neo4rs` driver, one
//! auto-committed query per statement. [`MemoryTransport`](super::MemoryTransport)
//! interprets the same statements in process.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend name used in errors raised by the external store and its transports.
pub(crate) const EXTERNAL_BACKEND: &str = "external";

/// One Cypher statement with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherStatement {
    /// Statement text
    pub statement: String,
    /// Named parameters (`$name` in the text)
    pub parameters: Map<String, Value>,
}

impl CypherStatement {
    /// Statement without parameters.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            parameters: Map::new(),
        }
    }

    /// Builder pattern: add a parameter and return self.
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.to_string(), value.into());
        self
    }

    /// Look up a string parameter.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }
}

/// Result of one statement: column names and rows of values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CypherResponse {
    /// Column names, in `RETURN` order
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows; each row has one value per column
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl CypherResponse {
    /// Response with the given rows and no column names.
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }
}

/// Runs Cypher statements against a graph database.
///
/// Implementations turn every transport, timeout and server failure into
/// [`GraphError::Backend`](crate::GraphError::Backend).
pub trait CypherTransport: Send + Sync {
    /// Run one statement in its own transaction.
    fn run(&self, statement: &CypherStatement) -> Result<CypherResponse>;
}

/// Column names of a statement's final `RETURN` clause, in order.
///
/// Every column is expected to carry an `AS` alias; an unaliased expression is
/// named by its text.
pub fn return_columns(statement: &str) -> Vec<String> {
    let Some(index) = statement.rfind("RETURN ") else {
        return Vec::new();
    };
    let clause = &statement[index + "RETURN ".len()..];
    let clause = clause.split(" ORDER BY ").next().unwrap_or(clause);
    let clause = clause.trim_start_matches("DISTINCT ");

    clause
        .split(',')
        .map(|column| {
            let column = column.trim();
            column
                .rsplit_once(" AS ")
                .map(|(_, alias)| alias.trim())
                .unwrap_or(column)
                .to_string()
        })
        .filter(|column| !column.is_empty())
        .collect()
}

#[cfg(feature = "neo4j-bolt")]
pub use bolt::BoltTransport;

#[cfg(feature = "neo4j-bolt")]
mod bolt {
    use super::{return_columns, CypherResponse, CypherStatement, CypherTransport, EXTERNAL_BACKEND};
    use crate::config::Neo4jConfig;
    use crate::error::{GraphError, Result};
    use log::trace;
    use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query, Row};
    use serde_json::Value;
    use std::future::Future;
    use std::time::Duration;
    use tokio::runtime::Runtime;

    fn backend_error(message: impl std::fmt::Display) -> GraphError {
        GraphError::backend(EXTERNAL_BACKEND, message.to_string())
    }

    /// Neo4j Bolt transport over the `neo4rs` driver.
    ///
    /// The driver is async; the transport owns a small runtime and blocks on
    /// it, so it must not be called from inside another Tokio runtime. Every
    /// call is bounded by the configured timeout.
    pub struct BoltTransport {
        runtime: Runtime,
        graph: Graph,
        timeout: Option<Duration>,
    }

    impl BoltTransport {
        /// Open a connection pool to `config.uri` (`bolt://` or `neo4j://`).
        ///
        /// # Errors
        ///
        /// Returns [`GraphError::Backend`] if the runtime cannot start, the
        /// settings are rejected or the server cannot be reached in time.
        pub fn connect(config: &Neo4jConfig) -> Result<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("apexgraph-neo4j")
                .enable_all()
                .build()
                .map_err(|e| backend_error(format!("cannot start runtime: {e}")))?;

            let settings = ConfigBuilder::default()
                .uri(config.uri.as_str())
                .user(config.user.as_deref().unwrap_or_default())
                .password(config.password.as_deref().unwrap_or_default())
                .db(config.database.as_str())
                .build()
                .map_err(|e| backend_error(format!("invalid settings for {}: {e}", config.uri)))?;

            let graph = block_on_timeout(&runtime, config.timeout, Graph::connect(settings))?
                .map_err(|e| backend_error(format!("cannot connect to {}: {e}", config.uri)))?;

            Ok(Self {
                runtime,
                graph,
                timeout: config.timeout,
            })
        }

        async fn fetch(graph: &Graph, query: Query) -> std::result::Result<Vec<Row>, neo4rs::Error> {
            let mut stream = graph.execute(query).await?;
            let mut rows = Vec::new();
            while let Some(row) = stream.next().await? {
                rows.push(row);
            }
            Ok(rows)
        }
    }

    fn block_on_timeout<F: Future>(
        runtime: &Runtime,
        timeout: Option<Duration>,
        future: F,
    ) -> Result<F::Output> {
        match timeout {
            Some(limit) => runtime
                .block_on(async { tokio::time::timeout(limit, future).await })
                .map_err(|_| backend_error(format!("no answer within {}s", limit.as_secs_f32()))),
            None => Ok(runtime.block_on(future)),
        }
    }

    /// JSON parameter to Bolt. Lists and maps travel as JSON text, the same
    /// way attributes and metadata are stored.
    pub(super) fn to_bolt(value: &Value) -> BoltType {
        match value {
            Value::Null => BoltType::Null(BoltNull),
            Value::Bool(flag) => BoltType::from(*flag),
            Value::Number(number) => match number.as_i64() {
                Some(int) => BoltType::from(int),
                None => BoltType::from(number.as_f64().unwrap_or_default()),
            },
            Value::String(text) => BoltType::from(text.as_str()),
            other => BoltType::from(other.to_string()),
        }
    }

    fn column_value(row: &Row, column: &str) -> Result<Value> {
        if let Ok(text) = row.get::<Option<String>>(column) {
            return Ok(text.map(Value::String).unwrap_or(Value::Null));
        }
        row.get::<i64>(column)
            .map(Value::from)
            .map_err(|e| backend_error(format!("unreadable column {column}: {e}")))
    }

    impl CypherTransport for BoltTransport {
        fn run(&self, statement: &CypherStatement) -> Result<CypherResponse> {
            let mut cypher = query(&statement.statement);
            for (name, value) in &statement.parameters {
                cypher = cypher.param(name, to_bolt(value));
            }

            let rows = block_on_timeout(&self.runtime, self.timeout, Self::fetch(&self.graph, cypher))?
                .map_err(backend_error)?;
            trace!("Cypher returned {} rows", rows.len());

            let columns = return_columns(&statement.statement);
            let rows = rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| column_value(row, column))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(CypherResponse { columns, rows })
        }
    }

}
