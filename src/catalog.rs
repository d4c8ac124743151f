// src/catalog.rs
//! Existence oracle: which candidate ids are already stored on the caller's side.

use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

#[async_trait::async_trait]
pub trait ExistenceOracle: Send + Sync {
    /// Return the subset of `candidates` that already exists. Must not scan
    /// beyond the given ids.
    async fn existing_ids(&self, candidates: &HashSet<String>) -> Result<HashSet<String>>;

    fn name(&self) -> &'static str;
}

/// In-process catalog of known product ids.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    ids: RwLock<HashSet<String>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: RwLock::new(ids.into_iter().map(Into::into).collect()),
        }
    }

    /// Load from a JSON array of ids (strings or numbers).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading known ids from {}", path.display()))?;
        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&content).context("parsing known ids json")?;
        let ids = raw.into_iter().filter_map(|v| match v {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        Ok(Self::from_ids(ids))
    }

    pub fn insert(&self, id: impl Into<String>) {
        let mut guard = match self.ids.write() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        };
        guard.insert(id.into());
    }

    pub fn len(&self) -> usize {
        match self.ids.read() {
            Ok(g) => g.len(),
            Err(poison) => poison.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ExistenceOracle for InMemoryCatalog {
    async fn existing_ids(&self, candidates: &HashSet<String>) -> Result<HashSet<String>> {
        let guard = self
            .ids
            .read()
            .map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(candidates
            .iter()
            .filter(|id| guard.contains(*id))
            .cloned()
            .collect())
    }

    fn name(&self) -> &'static str {
        "InMemoryCatalog"
    }
}
