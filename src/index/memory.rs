//! In-memory index for tests and local development.
//!
//! Brute-force cosine similarity over every stored document, with the same
//! predicate semantics the managed index applies: implicit AND across fields,
//! `$lt`/`$lte`/`$gt`/`$gte` range bounds, scalar and id equality.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KnowledgeDoc, RetrievedDoc, SearchQuery, VectorIndex};
use crate::core::errors::ApiError;

const METADATA_PREFIX: &str = "metadata.";

#[derive(Default)]
pub struct MemoryIndex {
    docs: RwLock<Vec<KnowledgeDoc>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cosine similarity rescaled to [0, 1], matching how the managed index
    /// reports scores for cosine-metric searches.
    fn score(query: &[f32], candidate: &[f32]) -> f32 {
        if query.len() != candidate.len() || query.is_empty() {
            return 0.0;
        }
        let dot: f32 = query.iter().zip(candidate).map(|(a, b)| a * b).sum();
        let norm_q: f32 = query.iter().map(|v| v * v).sum::<f32>().sqrt();
        let norm_c: f32 = candidate.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm_q == 0.0 || norm_c == 0.0 {
            return 0.0;
        }
        let cosine = (dot / (norm_q * norm_c)).clamp(-1.0, 1.0);
        (1.0 + cosine) / 2.0
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<RetrievedDoc>, ApiError> {
        let docs = self.docs.read().await;
        let mut hits: Vec<RetrievedDoc> = docs
            .iter()
            .filter(|doc| match &query.filter {
                Some(predicate) => matches_predicate(&doc.metadata, predicate),
                None => true,
            })
            .map(|doc| RetrievedDoc {
                text: doc.text.clone(),
                metadata: doc.metadata.clone(),
                score: Self::score(&query.vector, &doc.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn upsert(&self, doc: KnowledgeDoc) -> Result<(), ApiError> {
        let mut docs = self.docs.write().await;
        if let Some(existing) = docs.iter_mut().find(|d| {
            d.source_type == doc.source_type
                && d.source_id == doc.source_id
                && d.chunk_index == doc.chunk_index
        }) {
            *existing = doc;
        } else {
            docs.push(doc);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        Ok(self.docs.read().await.len())
    }
}

/// Evaluate a translated predicate document against a document's metadata.
fn matches_predicate(metadata: &Value, predicate: &Value) -> bool {
    let Some(fields) = predicate.as_object() else {
        return true;
    };

    fields.iter().all(|(path, expected)| {
        let field = path.strip_prefix(METADATA_PREFIX).unwrap_or(path);
        let actual = metadata.get(field);
        match expected {
            Value::Object(ops) if ops.len() == 1 && ops.contains_key("$oid") => {
                actual == Some(expected)
            }
            Value::Object(ops) if ops.keys().any(|k| k.starts_with('$')) => ops
                .iter()
                .all(|(op, bound)| compare_bound(actual, op, bound)),
            scalar => actual == Some(scalar),
        }
    })
}

fn compare_bound(actual: Option<&Value>, op: &str, bound: &Value) -> bool {
    let Some(actual) = actual else { return false };

    // Numbers compare numerically, strings lexicographically (ISO dates).
    let ordering = match (actual.as_f64(), bound.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (actual.as_str(), bound.as_str()) {
            (Some(a), Some(b)) => Some(a.cmp(b)),
            _ => None,
        },
    };
    let Some(ordering) = ordering else { return false };

    match op {
        "$lt" => ordering.is_lt(),
        "$lte" => ordering.is_le(),
        "$gt" => ordering.is_gt(),
        "$gte" => ordering.is_ge(),
        _ => false,
    }
}
