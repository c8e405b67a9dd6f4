//! # Tree Source Trait
//!
//! The contract between the reader and whatever fetches geometry trees.
//! A source takes a signal name and a source number and hands back a
//! status plus a payload; everything after that is in-memory work.
//!
//! ## Implementations
//!
//! | Source | Module | Description |
//! |--------|--------|-------------|
//! | `MemorySource` | `memory` | Pre-registered trees for testing/embedding |
//!
//! Network clients live outside this crate and implement [`TreeSource`].

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Tree;
use crate::request::{FetchQuery, ServerConfig};
use crate::{Error, Result};

pub use memory::MemorySource;

// ============================================================================
// Fetch result
// ============================================================================

/// Status reported by the source alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    Ok,
    Error { code: i32, message: String },
}

/// What came back from a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Tree(Tree),
    /// Data that is not tree-shaped, e.g. a bare scalar or string.
    NotTree { description: String },
}

/// Status plus payload of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub status: FetchStatus,
    pub payload: Payload,
}

impl FetchResult {
    pub fn tree(tree: Tree) -> Self {
        Self { status: FetchStatus::Ok, payload: Payload::Tree(tree) }
    }

    pub fn not_tree(description: impl Into<String>) -> Self {
        Self {
            status: FetchStatus::Ok,
            payload: Payload::NotTree { description: description.into() },
        }
    }

    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self {
            status: FetchStatus::Error { code, message: message.into() },
            payload: Payload::NotTree { description: String::new() },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    /// The fetched tree, or the reason there isn't one.
    ///
    /// A non-OK status wins over whatever payload came with it.
    pub fn into_tree(self) -> Result<Tree> {
        if let FetchStatus::Error { code, message } = self.status {
            return Err(Error::UpstreamFetchFailed { code, message });
        }
        match self.payload {
            Payload::Tree(tree) => Ok(tree),
            Payload::NotTree { description } => Err(Error::UpstreamShapeMismatch(format!(
                "returned data is not of expected tree structure: {description}"
            ))),
        }
    }
}

// ============================================================================
// TreeSource Trait
// ============================================================================

/// Anything that can fetch a geometry tree.
///
/// Retries and timeouts are the source's business; the reader treats every
/// error it returns as final for the request.
#[async_trait]
pub trait TreeSource: Send + Sync + 'static {
    /// Point the source at a server before fetching.
    ///
    /// Default: nothing to do.
    async fn connect(&self, _server: &ServerConfig) -> Result<()> {
        Ok(())
    }

    /// Fetch the tree for a signal and source number.
    async fn fetch(&self, query: &FetchQuery) -> Result<FetchResult>;
}
