use serde::Deserialize;
use serde_json::{Map, Value};

use crate::index::RetrievedDoc;

fn default_top_k() -> usize {
    5
}

/// Incoming chat query. Lives for one request.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Field name -> scalar (equality), range object, or identifier string.
    #[serde(default)]
    pub filters: Map<String, Value>,
    #[serde(default = "default_top_k", rename = "topK")]
    pub top_k: usize,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            filters: Map::new(),
            top_k: default_top_k(),
        }
    }
}

/// Result of a successful pipeline run; the handler wraps it into the
/// `{success, answer, sources}` response body.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<RetrievedDoc>,
}
