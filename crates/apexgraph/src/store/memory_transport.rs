//! In-process Cypher transport.
//!
//! Interprets exactly the statements in [`statements`] against maps held in
//! memory, with the same match-or-create semantics as the server. Any other
//! statement is rejected. Clones share state, and [`MemoryTransport::set_available`]
//! simulates an unreachable server.

use super::cypher::{CypherResponse, CypherStatement, CypherTransport, EXTERNAL_BACKEND};
use super::external::statements;
use crate::error::{GraphError, Result};
use crate::graph::EdgeKind;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
struct StoredNode {
    kind: Value,
    attributes: Value,
    metadata: Value,
    created_at: Value,
}

#[derive(Debug, Clone)]
struct StoredEdge {
    attributes: Value,
    metadata: Value,
    created_at: Value,
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, StoredNode>,
    // (from, kind, to)
    edges: BTreeMap<(String, String, String), StoredEdge>,
}

impl State {
    fn node_row(&self, id: &str) -> Option<Vec<Value>> {
        self.nodes.get(id).map(|node| {
            vec![
                json!(id),
                node.kind.clone(),
                node.attributes.clone(),
                node.metadata.clone(),
                node.created_at.clone(),
            ]
        })
    }

    fn edge_row(key: &(String, String, String), edge: &StoredEdge) -> Vec<Value> {
        vec![
            json!(key.0),
            json!(key.2),
            json!(key.1),
            edge.attributes.clone(),
            edge.metadata.clone(),
            edge.created_at.clone(),
        ]
    }
}

/// Cypher transport that keeps the graph in process memory.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<State>>,
    available: Arc<AtomicBool>,
    statements_run: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Empty, reachable transport.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            available: Arc::new(AtomicBool::new(true)),
            statements_run: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every following statement fail (`false`) or succeed again (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of statements accepted so far.
    pub fn statements_run(&self) -> usize {
        self.statements_run.load(Ordering::SeqCst)
    }

    fn merge_node(state: &mut State, statement: &CypherStatement) -> Result<Vec<Vec<Value>>> {
        let id = required(statement, "id")?.to_string();
        let created_at = state
            .nodes
            .get(&id)
            .map(|node| node.created_at.clone())
            .unwrap_or_else(|| param(statement, "createdAt"));

        state.nodes.insert(
            id.clone(),
            StoredNode {
                kind: param(statement, "kind"),
                attributes: param(statement, "attributes"),
                metadata: param(statement, "metadata"),
                created_at,
            },
        );
        Ok(state.node_row(&id).into_iter().collect())
    }

    fn merge_edge(
        state: &mut State,
        statement: &CypherStatement,
        kind: EdgeKind,
    ) -> Result<Vec<Vec<Value>>> {
        let from = required(statement, "from")?.to_string();
        let to = required(statement, "to")?.to_string();
        if !state.nodes.contains_key(&from) || !state.nodes.contains_key(&to) {
            return Ok(Vec::new());
        }

        let key = (from, kind.as_str().to_string(), to);
        let created_at = state
            .edges
            .get(&key)
            .map(|edge| edge.created_at.clone())
            .unwrap_or_else(|| param(statement, "createdAt"));
        let edge = StoredEdge {
            attributes: param(statement, "attributes"),
            metadata: param(statement, "metadata"),
            created_at,
        };
        let row = State::edge_row(&key, &edge);
        state.edges.insert(key, edge);
        Ok(vec![row])
    }

    fn neighbors(state: &State, id: &str, outgoing: bool, incoming: bool) -> Vec<Vec<Value>> {
        let mut ids = BTreeSet::new();
        for (from, _, to) in state.edges.keys() {
            if outgoing && from == id {
                ids.insert(to.clone());
            }
            if incoming && to == id {
                ids.insert(from.clone());
            }
        }
        ids.into_iter().map(|id| vec![json!(id)]).collect()
    }

    fn execute(state: &mut State, statement: &CypherStatement) -> Result<Vec<Vec<Value>>> {
        let text = statement.statement.as_str();
        match text {
            statements::PING => Ok(vec![vec![json!(1)]]),
            statements::MERGE_NODE => Self::merge_node(state, statement),
            statements::GET_NODE => {
                let id = required(statement, "id")?;
                Ok(state.node_row(id).into_iter().collect())
            }
            statements::ALL_NODES => Ok(state
                .nodes
                .keys()
                .filter_map(|id| state.node_row(id))
                .collect()),
            statements::ALL_EDGES => Ok(state
                .edges
                .iter()
                .map(|(key, edge)| State::edge_row(key, edge))
                .collect()),
            statements::EDGES_FROM => {
                let id = required(statement, "id")?;
                let mut rows: Vec<_> = state
                    .edges
                    .iter()
                    .filter(|(key, _)| key.0 == id)
                    .map(|(key, edge)| (key.1.clone(), key.2.clone(), State::edge_row(key, edge)))
                    .collect();
                rows.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
                Ok(rows.into_iter().map(|(_, _, row)| row).collect())
            }
            statements::NEIGHBORS_OUT => {
                Ok(Self::neighbors(state, required(statement, "id")?, true, false))
            }
            statements::NEIGHBORS_IN => {
                Ok(Self::neighbors(state, required(statement, "id")?, false, true))
            }
            statements::NEIGHBORS_BOTH => {
                Ok(Self::neighbors(state, required(statement, "id")?, true, true))
            }
            statements::CLEAR => {
                state.nodes.clear();
                state.edges.clear();
                Ok(Vec::new())
            }
            other => match EdgeKind::ALL
                .iter()
                .find(|kind| statements::merge_edge(**kind) == other)
            {
                Some(kind) => Self::merge_edge(state, statement, *kind),
                None => Err(GraphError::backend(
                    EXTERNAL_BACKEND,
                    format!("unsupported statement: {other}"),
                )),
            },
        }
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn param(statement: &CypherStatement, name: &str) -> Value {
    statement.parameters.get(name).cloned().unwrap_or(Value::Null)
}

fn required<'a>(statement: &'a CypherStatement, name: &str) -> Result<&'a str> {
    statement.str_param(name).ok_or_else(|| {
        GraphError::backend(EXTERNAL_BACKEND, format!("missing parameter ${name}"))
    })
}

impl CypherTransport for MemoryTransport {
    fn run(&self, statement: &CypherStatement) -> Result<CypherResponse> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(GraphError::backend(EXTERNAL_BACKEND, "connection refused"));
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = Self::execute(&mut state, statement)?;
        self.statements_run.fetch_add(1, Ordering::SeqCst);
        Ok(CypherResponse::from_rows(rows))
    }
}
