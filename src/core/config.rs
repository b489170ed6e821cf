//! Environment-driven service settings.
//!
//! Everything the process needs is read once at startup. The generation
//! credentials are optional (the chat pipeline degrades to a fallback answer
//! without them); the remote index settings are mandatory when the remote
//! backend is selected.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-base";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexBackend {
    /// Managed document index reached over its Data API.
    Remote,
    /// Brute-force in-process index, for tests and local development.
    Memory,
}

impl IndexBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexBackend::Remote => "remote",
            IndexBackend::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub backend: IndexBackend,
    pub data_api_url: Option<String>,
    pub data_api_key: Option<String>,
    pub data_source: String,
    pub database: String,
    pub collection: String,
    /// Name of the vector search index defined on the collection.
    pub search_index: String,
    /// Document field holding the embedding vector.
    pub vector_path: String,
}

#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub base_url: String,
    /// Missing token is legal: generation is skipped and a fallback answer
    /// is substituted without touching the network.
    pub api_token: Option<String>,
    pub embed_model: String,
    pub generation_model: String,
    pub max_new_tokens: u32,
    pub generation_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub log_dir: PathBuf,
    pub index: IndexSettings,
    pub inference: InferenceSettings,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(8000);

        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        let backend = match env::var("INDEX_BACKEND").as_deref() {
            Ok("memory") => IndexBackend::Memory,
            Ok("remote") | Err(_) => IndexBackend::Remote,
            Ok(other) => bail!("unknown INDEX_BACKEND '{}'", other),
        };

        let index = IndexSettings {
            backend,
            data_api_url: env::var("DATA_API_URL").ok(),
            data_api_key: env::var("DATA_API_KEY").ok(),
            data_source: env_or("DATA_SOURCE", "Cluster0"),
            database: env_or("DB_NAME", "test"),
            collection: env_or("KNOWLEDGE_COLLECTION", "knowledge_docs"),
            search_index: env_or("VECTOR_SEARCH_INDEX", "knowledge_index"),
            vector_path: env_or("VECTOR_PATH", "embedding"),
        };

        if backend == IndexBackend::Remote
            && (index.data_api_url.is_none() || index.data_api_key.is_none())
        {
            bail!("DATA_API_URL and DATA_API_KEY are required for the remote index backend");
        }

        let max_new_tokens = env::var("GENERATION_MAX_NEW_TOKENS")
            .ok()
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(200);
        let timeout_secs = env::var("GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(30);

        let inference = InferenceSettings {
            base_url: env_or("INFERENCE_API_URL", DEFAULT_INFERENCE_URL),
            api_token: env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),
            embed_model: env_or("EMBED_MODEL", DEFAULT_EMBED_MODEL),
            generation_model: env_or("GENERATION_MODEL", DEFAULT_GENERATION_MODEL),
            max_new_tokens,
            generation_timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Settings {
            port,
            log_dir,
            index,
            inference,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}
