use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{normalize_embedding, Embedder};
use crate::core::config::InferenceSettings;
use crate::core::errors::ApiError;

/// Embedder backed by the hosted inference API's feature-extraction pipeline.
#[derive(Clone)]
pub struct HostedEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl HostedEmbedder {
    pub fn new(settings: &InferenceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.embed_model.clone(),
            api_token: settings.api_token.clone(),
        }
    }
}

#[async_trait]
impl Embedder for HostedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "embedding input must be a non-empty string".to_string(),
            ));
        }

        let url = format!("{}/pipeline/feature-extraction/{}", self.base_url, self.model);
        let mut request = self.client.post(&url).json(&json!({ "inputs": text }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let res = request
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("embedding request failed: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "embedding service returned {}: {}",
                status, body
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;
        normalize_embedding(&payload).ok_or_else(|| {
            ApiError::Internal("embedding service returned a non-numeric response".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::InferenceSettings;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn settings(base_url: &str) -> InferenceSettings {
        InferenceSettings {
            base_url: base_url.to_string(),
            api_token: Some("hf_test".to_string()),
            embed_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            generation_model: "google/flan-t5-base".to_string(),
            max_new_tokens: 200,
            generation_timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test]
    async fn embeds_and_normalizes_batched_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/pipeline/feature-extraction/sentence-transformers/all-MiniLM-L6-v2")
                    .header("authorization", "Bearer hf_test");
                then.status(200).json_body(serde_json::json!([[0.1, 0.2, 0.3]]));
            })
            .await;

        let embedder = HostedEmbedder::new(&settings(&server.base_url()));
        let vector = embedder.embed("frontend jobs in Dhaka").await.unwrap();

        mock.assert_async().await;
        assert_eq!(vector.len(), 3);
        assert!((vector[1] - 0.2).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_network_call() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path_contains("feature-extraction");
                then.status(200).json_body(serde_json::json!([0.0]));
            })
            .await;

        let embedder = HostedEmbedder::new(&settings(&server.base_url()));
        let err = embedder.embed("   ").await.unwrap_err();

        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn error_payload_is_an_internal_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("feature-extraction");
                then.status(200)
                    .json_body(serde_json::json!({"error": "model loading"}));
            })
            .await;

        let embedder = HostedEmbedder::new(&settings(&server.base_url()));
        let err = embedder.embed("question").await.unwrap_err();

        assert!(matches!(err, ApiError::Internal(_)));
    }
}
