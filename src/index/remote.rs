//! Data API client for the managed document index.
//!
//! The index is reached over stateless HTTPS actions (`aggregate`,
//! `updateOne`); vector search is expressed as a `$vectorSearch` aggregation
//! stage with the translated filter document attached verbatim.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{KnowledgeDoc, RetrievedDoc, SearchQuery, VectorIndex};
use crate::core::config::IndexSettings;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct RemoteIndex {
    client: Client,
    base_url: String,
    api_key: String,
    data_source: String,
    database: String,
    collection: String,
    search_index: String,
    vector_path: String,
}

#[derive(Deserialize)]
struct AggregateResponse<T> {
    #[serde(default = "Vec::new")]
    documents: Vec<T>,
}

#[derive(Deserialize)]
struct CountRow {
    total: usize,
}

impl RemoteIndex {
    pub fn new(settings: &IndexSettings) -> anyhow::Result<Self> {
        let base_url = settings
            .data_api_url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("remote index requires DATA_API_URL"))?;
        let api_key = settings
            .data_api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("remote index requires DATA_API_KEY"))?;

        Ok(Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            data_source: settings.data_source.clone(),
            database: settings.database.clone(),
            collection: settings.collection.clone(),
            search_index: settings.search_index.clone(),
            vector_path: settings.vector_path.clone(),
        })
    }

    async fn action(&self, action: &str, mut body: Value) -> Result<Value, ApiError> {
        let url = format!("{}/action/{}", self.base_url, action);

        if let Some(obj) = body.as_object_mut() {
            obj.insert("dataSource".to_string(), json!(self.data_source));
            obj.insert("database".to_string(), json!(self.database));
            obj.insert("collection".to_string(), json!(self.collection));
        }

        let res = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("index {} request failed: {}", action, e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "index {} returned {}: {}",
                action, status, text
            )));
        }

        res.json().await.map_err(ApiError::internal)
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn ping(&self) -> Result<(), ApiError> {
        self.count().await.map(|_| ())
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<RetrievedDoc>, ApiError> {
        let mut stage = json!({
            "index": self.search_index,
            "path": self.vector_path,
            "queryVector": query.vector,
            "numCandidates": query.num_candidates,
            "limit": query.limit,
        });
        if let Some(filter) = query.filter {
            stage["filter"] = filter;
        }

        let pipeline = json!([
            { "$vectorSearch": stage },
            { "$project": {
                "_id": 0,
                "text": 1,
                "metadata": 1,
                "score": { "$meta": "vectorSearchScore" },
            }},
        ]);

        let payload = self.action("aggregate", json!({ "pipeline": pipeline })).await?;
        let parsed: AggregateResponse<RetrievedDoc> =
            serde_json::from_value(payload).map_err(ApiError::internal)?;
        Ok(parsed.documents)
    }

    async fn upsert(&self, doc: KnowledgeDoc) -> Result<(), ApiError> {
        let body = json!({
            "filter": {
                "sourceType": doc.source_type,
                "sourceId": doc.source_id.to_ejson(),
                "chunkIndex": doc.chunk_index,
            },
            "update": {
                "$set": {
                    "text": doc.text,
                    "metadata": doc.metadata,
                    "embedding": doc.embedding,
                }
            },
            "upsert": true,
        });

        self.action("updateOne", body).await.map(|_| ())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let payload = self
            .action("aggregate", json!({ "pipeline": [{ "$count": "total" }] }))
            .await?;
        let parsed: AggregateResponse<CountRow> =
            serde_json::from_value(payload).map_err(ApiError::internal)?;
        Ok(parsed.documents.first().map(|row| row.total).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(base_url: &str) -> IndexSettings {
        IndexSettings {
            backend: crate::core::config::IndexBackend::Remote,
            data_api_url: Some(base_url.to_string()),
            data_api_key: Some("test-key".to_string()),
            data_source: "Cluster0".to_string(),
            database: "test".to_string(),
            collection: "knowledge_docs".to_string(),
            search_index: "knowledge_index".to_string(),
            vector_path: "embedding".to_string(),
        }
    }

    #[tokio::test]
    async fn search_sends_vector_search_pipeline_and_parses_hits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/action/aggregate")
                    .header("api-key", "test-key")
                    .json_body_partial(
                        r#"{"database": "test", "collection": "knowledge_docs"}"#,
                    );
                then.status(200).json_body(serde_json::json!({
                    "documents": [
                        {"text": "Frontend Engineer — React.", "metadata": {"location": "Dhaka"}, "score": 0.91}
                    ]
                }));
            })
            .await;

        let index = RemoteIndex::new(&settings(&server.base_url())).unwrap();
        let hits = index
            .search(SearchQuery {
                vector: vec![0.1, 0.2],
                filter: Some(serde_json::json!({"metadata.location": "Dhaka"})),
                num_candidates: 150,
                limit: 3,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata["location"], "Dhaka");
        assert!((hits[0].score - 0.91).abs() < 1e-6);
    }

    #[tokio::test]
    async fn non_success_status_is_an_internal_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/action/aggregate");
                then.status(401).body("invalid session");
            })
            .await;

        let index = RemoteIndex::new(&settings(&server.base_url())).unwrap();
        let err = index
            .search(SearchQuery {
                vector: vec![0.1],
                filter: None,
                num_candidates: 150,
                limit: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn count_reads_first_row_or_zero() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/action/aggregate");
                then.status(200).json_body(serde_json::json!({"documents": []}));
            })
            .await;

        let index = RemoteIndex::new(&settings(&server.base_url())).unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
