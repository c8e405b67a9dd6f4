//! In-memory tree source.
//!
//! The reference implementation of `TreeSource`: trees are registered up
//! front under a `(signal, source)` key and handed out on fetch.
//!
//! ## Limitations
//!
//! - **Clones on fetch**: every fetch returns its own copy of the tree.
//! - **No server**: `connect()` only records the last server it was given.
//!
//! Use this source for:
//! - Testing path resolution and geometry decoding end to end
//! - Embedding the reader over trees loaded from JSON files

use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::model::Tree;
use crate::request::{FetchQuery, ServerConfig};
use crate::Result;
use super::{FetchResult, TreeSource};

/// Status code reported when nothing is registered for a query.
pub const NOT_FOUND_CODE: i32 = -1;

// ============================================================================
// MemorySource
// ============================================================================

/// Pre-registered trees keyed by fetch query. Cheap to clone; clones share
/// the same registry.
#[derive(Clone, Default)]
pub struct MemorySource {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    results: RwLock<HashMap<FetchQuery, FetchResult>>,
    last_server: RwLock<Option<ServerConfig>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tree under `signal` (matched lower-cased) and `source`.
    pub fn insert_tree(&self, signal: &str, source: i64, tree: Tree) {
        self.insert_result(FetchQuery::new(signal, source), FetchResult::tree(tree));
    }

    /// Register a tree given in its JSON form.
    pub fn insert_json(&self, signal: &str, source: i64, json: &str) -> Result<()> {
        self.insert_tree(signal, source, Tree::from_json(json)?);
        Ok(())
    }

    /// Register an arbitrary result, e.g. a failed status.
    pub fn insert_result(&self, query: FetchQuery, result: FetchResult) {
        self.inner.results.write().insert(query, result);
    }

    pub fn len(&self) -> usize {
        self.inner.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.results.read().is_empty()
    }

    /// The server passed to the most recent `connect()`.
    pub fn last_server(&self) -> Option<ServerConfig> {
        self.inner.last_server.read().clone()
    }
}

// ============================================================================
// TreeSource impl
// ============================================================================

#[async_trait]
impl TreeSource for MemorySource {
    async fn connect(&self, server: &ServerConfig) -> Result<()> {
        *self.inner.last_server.write() = Some(server.clone());
        Ok(())
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<FetchResult> {
        let found = self.inner.results.read().get(query).cloned();
        Ok(found.unwrap_or_else(|| {
            debug!(signal = %query.signal, source = %query.source, "no tree registered");
            FetchResult::failed(
                NOT_FOUND_CODE,
                format!("no data for signal '{}' source {}", query.signal, query.source),
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeSpec;
    use crate::source::FetchStatus;

    #[tokio::test]
    async fn test_fetch_registered_tree() {
        let source = MemorySource::new();
        source.insert_tree("/Magnetics/PFCoil", 7, Tree::from_spec(NodeSpec::new("root")));
        let result = source.fetch(&FetchQuery::new("/magnetics/pfcoil", 7)).await.unwrap();
        assert!(result.is_ok());
        assert_eq!(result.into_tree().unwrap().root().name(), "root");
    }

    #[tokio::test]
    async fn test_fetch_unknown_query() {
        let source = MemorySource::new();
        let result = source.fetch(&FetchQuery::new("/nothing", 1)).await.unwrap();
        assert!(matches!(result.status, FetchStatus::Error { code: NOT_FOUND_CODE, .. }));
    }

    #[tokio::test]
    async fn test_connect_records_server() {
        let source = MemorySource::new();
        let server = ServerConfig { host: "geom.example".into(), port: 56565 };
        source.connect(&server).await.unwrap();
        assert_eq!(source.clone().last_server(), Some(server));
    }

    #[test]
    fn test_insert_json() {
        let source = MemorySource::new();
        source.insert_json("/sig", 1, r#"{"name":"root"}"#).unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.insert_json("/sig", 2, "[]").is_err());
    }
}
