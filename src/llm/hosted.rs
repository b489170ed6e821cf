use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{build_prompt, AnswerGenerator, Generation, GENERATION_FALLBACK};
use crate::core::config::InferenceSettings;
use crate::core::errors::ApiError;

/// Generator backed by the hosted text-generation API.
///
/// One attempt per request, fixed decoding parameters, a hard timeout. Every
/// failure past argument validation degrades to the fallback answer.
#[derive(Clone)]
pub struct HostedGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
    max_new_tokens: u32,
    timeout: Duration,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl HostedGenerator {
    pub fn new(settings: &InferenceSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.generation_model.clone(),
            api_token: settings.api_token.clone(),
            max_new_tokens: settings.max_new_tokens,
            timeout: settings.generation_timeout,
        }
    }

    fn degraded(cause: String) -> Generation {
        Generation::Degraded {
            fallback: GENERATION_FALLBACK.to_string(),
            cause,
        }
    }
}

#[async_trait]
impl AnswerGenerator for HostedGenerator {
    async fn generate(&self, snippets: &[String], question: &str) -> Result<Generation, ApiError> {
        if snippets.is_empty() {
            return Err(ApiError::Internal(
                "generator invoked without context snippets".to_string(),
            ));
        }

        // No credentials: skip the network entirely and degrade.
        let Some(token) = &self.api_token else {
            tracing::warn!("no inference credentials configured; skipping generation");
            return Ok(Self::degraded("missing inference credentials".to_string()));
        };

        let prompt = build_prompt(snippets, question);
        let url = format!("{}/models/{}", self.base_url, self.model);
        let body = json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": self.max_new_tokens,
                "do_sample": false,
                "return_full_text": true,
            },
        });

        let res = match self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return Ok(Self::degraded(format!("generation request failed: {}", e))),
        };

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Ok(Self::degraded(format!(
                "generation service returned {}: {}",
                status, text
            )));
        }

        let outputs: Vec<GeneratedText> = match res.json().await {
            Ok(outputs) => outputs,
            Err(e) => return Ok(Self::degraded(format!("malformed generation response: {}", e))),
        };
        let Some(output) = outputs.first() else {
            return Ok(Self::degraded("generation response was empty".to_string()));
        };

        // Causal models echo the prompt as a prefix of the completion.
        let answer = output
            .generated_text
            .strip_prefix(&prompt)
            .unwrap_or(&output.generated_text)
            .trim()
            .to_string();

        if answer.is_empty() {
            return Ok(Self::degraded("generation produced an empty completion".to_string()));
        }

        Ok(Generation::Answered(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(base_url: &str, token: Option<&str>) -> InferenceSettings {
        InferenceSettings {
            base_url: base_url.to_string(),
            api_token: token.map(|t| t.to_string()),
            embed_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            generation_model: "google/flan-t5-base".to_string(),
            max_new_tokens: 200,
            generation_timeout: Duration::from_secs(5),
        }
    }

    fn snippets() -> Vec<String> {
        vec!["Frontend Engineer — React. Location: Dhaka.".to_string()]
    }

    #[tokio::test]
    async fn prompt_echo_is_stripped_from_the_completion() {
        let server = MockServer::start_async().await;
        let prompt = build_prompt(&snippets(), "any frontend jobs?");
        let echoed = format!("{} There is a Frontend Engineer role in Dhaka.", prompt);
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/models/google/flan-t5-base");
                then.status(200)
                    .json_body(serde_json::json!([{"generated_text": echoed}]));
            })
            .await;

        let generator = HostedGenerator::new(&settings(&server.base_url(), Some("hf_test")));
        let outcome = generator
            .generate(&snippets(), "any frontend jobs?")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Generation::Answered("There is a Frontend Engineer role in Dhaka.".to_string())
        );
    }

    #[tokio::test]
    async fn http_failure_degrades_to_fallback() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("/models/");
                then.status(503).body("model overloaded");
            })
            .await;

        let generator = HostedGenerator::new(&settings(&server.base_url(), Some("hf_test")));
        let outcome = generator.generate(&snippets(), "question").await.unwrap();

        match outcome {
            Generation::Degraded { fallback, cause } => {
                assert_eq!(fallback, GENERATION_FALLBACK);
                assert!(cause.contains("503"));
            }
            other => panic!("expected degraded outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path_contains("/models/");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let generator = HostedGenerator::new(&settings(&server.base_url(), None));
        let outcome = generator.generate(&snippets(), "question").await.unwrap();

        assert!(matches!(outcome, Generation::Degraded { .. }));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn empty_snippet_list_is_a_fatal_error() {
        let generator = HostedGenerator::new(&settings("http://127.0.0.1:9", Some("hf_test")));
        let err = generator.generate(&[], "question").await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn malformed_response_shape_degrades() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path_contains("/models/");
                then.status(200).json_body(serde_json::json!({"unexpected": true}));
            })
            .await;

        let generator = HostedGenerator::new(&settings(&server.base_url(), Some("hf_test")));
        let outcome = generator.generate(&snippets(), "question").await.unwrap();

        assert!(matches!(outcome, Generation::Degraded { .. }));
    }
}
