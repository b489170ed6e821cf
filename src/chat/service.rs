//! The chat query pipeline.
//!
//! validate -> embed -> translate filters -> search -> prompt -> generate.
//! Client errors stop before any external call; a degraded generator still
//! yields a successful response carrying a fallback answer.

use std::sync::Arc;

use crate::chat::filter::{parse_filters, to_predicate};
use crate::chat::types::{QueryOutcome, QueryRequest};
use crate::core::errors::ApiError;
use crate::embed::Embedder;
use crate::index::{SearchQuery, VectorIndex};
use crate::llm::{AnswerGenerator, Generation};

/// Substituted when the search matches nothing; generation is skipped.
pub const NO_RESULTS_FALLBACK: &str =
    "I'm sorry, I couldn't find any information about that in the portal.";

/// Floor on the candidate pool so ranking quality holds up when a filter
/// discards most candidates.
const MIN_CANDIDATES: usize = 150;
const CANDIDATE_MULTIPLIER: usize = 10;

#[derive(Clone)]
pub struct ChatService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
}

impl ChatService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
        }
    }

    pub async fn answer(&self, request: QueryRequest) -> Result<QueryOutcome, ApiError> {
        let question = request.query.trim().to_string();
        if question.is_empty() {
            return Err(ApiError::BadRequest(
                "query must be a non-empty string".to_string(),
            ));
        }
        if request.top_k == 0 {
            return Err(ApiError::BadRequest(
                "topK must be a positive integer".to_string(),
            ));
        }

        // Filter errors are client errors: detect them before spending any
        // external call.
        let filters = parse_filters(&request.filters)?;
        let predicate = to_predicate(&filters);

        let vector = self.embedder.embed(&question).await.map_err(|err| {
            tracing::error!(stage = "embedding", "embedding failed: {}", err);
            err
        })?;

        let num_candidates = (request.top_k * CANDIDATE_MULTIPLIER).max(MIN_CANDIDATES);
        let sources = self
            .index
            .search(SearchQuery {
                vector,
                filter: predicate,
                num_candidates,
                limit: request.top_k,
            })
            .await
            .map_err(|err| {
                tracing::error!(stage = "search", "vector search failed: {}", err);
                err
            })?;

        if sources.is_empty() {
            tracing::info!(stage = "search", "no documents matched; skipping generation");
            return Ok(QueryOutcome {
                answer: NO_RESULTS_FALLBACK.to_string(),
                sources,
            });
        }

        let snippets: Vec<String> = sources.iter().map(|doc| doc.text.clone()).collect();
        let answer = match self.generator.generate(&snippets, &question).await? {
            Generation::Answered(text) => text,
            Generation::Degraded { fallback, cause } => {
                tracing::warn!(stage = "generation", "substituting fallback answer: {}", cause);
                fallback
            }
        };

        Ok(QueryOutcome { answer, sources })
    }
}
