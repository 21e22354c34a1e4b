//! String metadata attached to nodes and edges.
//!
//! Kind-specific data lives in the typed attributes; this map only carries
//! tags that are not part of the model, such as the repository a file was
//! ingested from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key holding the repository name.
pub const REPOSITORY_KEY: &str = "repository";

/// Metadata key holding the repository id.
pub const REPOSITORY_ID_KEY: &str = "repositoryId";

/// Opaque repository tag supplied by the repository/tracking collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryTag {
    /// Repository name
    pub name: String,
    /// Repository id
    pub id: String,
}

impl RepositoryTag {
    /// Create a tag.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Ordered string-to-string map for backend and repository metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    data: BTreeMap<String, String>,
}

impl Metadata {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Metadata carrying a repository tag, or empty when there is none.
    pub fn for_repository(repository: Option<&RepositoryTag>) -> Self {
        match repository {
            Some(tag) => Self::new()
                .with(REPOSITORY_KEY, tag.name.as_str())
                .with(REPOSITORY_ID_KEY, tag.id.as_str()),
            None => Self::new(),
        }
    }

    /// Builder pattern: add an entry and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Insert an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.data.iter()
    }

    /// Repository tag, when both repository keys are present.
    pub fn repository(&self) -> Option<RepositoryTag> {
        match (self.get(REPOSITORY_KEY), self.get(REPOSITORY_ID_KEY)) {
            (Some(name), Some(id)) => Some(RepositoryTag::new(name, id)),
            _ => None,
        }
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            data: BTreeMap::from_iter(iter),
        }
    }
}
