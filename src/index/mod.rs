//! Vector index abstraction.
//!
//! The chat pipeline only needs nearest-neighbor search over stored knowledge
//! documents; ingestion additionally upserts. The primary implementation is
//! `RemoteIndex`, which speaks the managed index's Data API. `MemoryIndex`
//! backs tests and local development.

mod memory;
mod remote;

pub use memory::MemoryIndex;
pub use remote::RemoteIndex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::errors::ApiError;

const DOC_ID_LEN: usize = 24;

/// Native identifier of the document index: 24 hex digits.
///
/// Parsed at the boundary so everything past it holds a known-valid id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocId(String);

impl DocId {
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let trimmed = raw.trim();
        if trimmed.len() != DOC_ID_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ApiError::BadRequest(format!(
                "invalid identifier '{}': expected a 24-character hex id",
                raw
            )));
        }
        Ok(DocId(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extended-JSON rendering used on the wire and in stored metadata.
    pub fn to_ejson(&self) -> Value {
        json!({ "$oid": self.0 })
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A knowledge document as stored in the index.
#[derive(Debug, Clone)]
pub struct KnowledgeDoc {
    /// Kind of source entity ("job").
    pub source_type: String,
    /// Id of the source entity the snippet was derived from.
    pub source_id: DocId,
    /// 0-based position when a long snippet was split into chunks.
    pub chunk_index: usize,
    pub text: String,
    pub metadata: Value,
    pub embedding: Vec<f32>,
}

/// A search hit projected to what the chat pipeline exposes.
///
/// Internal identifiers are deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub text: String,
    #[serde(default)]
    pub metadata: Value,
    /// Similarity score as reported by the index (higher = better).
    pub score: f32,
}

/// Parameters of one nearest-neighbor search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    /// Native predicate document, already translated from the filter DSL.
    pub filter: Option<Value>,
    /// Approximate candidate pool examined before ranking down to `limit`.
    pub num_candidates: usize,
    pub limit: usize,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Cheap reachability probe used during startup (fail fast).
    async fn ping(&self) -> Result<(), ApiError>;

    /// Nearest-neighbor search, ordered by descending score.
    async fn search(&self, query: SearchQuery) -> Result<Vec<RetrievedDoc>, ApiError>;

    /// Insert or replace a document keyed by (source_type, source_id, chunk_index).
    async fn upsert(&self, doc: KnowledgeDoc) -> Result<(), ApiError>;

    /// Total stored documents.
    async fn count(&self) -> Result<usize, ApiError>;
}
