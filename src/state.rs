use std::sync::Arc;

use anyhow::Context;

use crate::chat::ChatService;
use crate::core::config::{IndexBackend, Settings};
use crate::embed::HostedEmbedder;
use crate::index::{MemoryIndex, RemoteIndex, VectorIndex};
use crate::llm::HostedGenerator;

pub struct AppState {
    pub settings: Settings,
    pub index: Arc<dyn VectorIndex>,
    pub chat: ChatService,
}

impl AppState {
    /// Wire up providers once at startup. The index handle is established
    /// here and shared read-only by every request; an unreachable remote
    /// index aborts startup.
    pub async fn initialize(settings: Settings) -> anyhow::Result<Arc<Self>> {
        let index: Arc<dyn VectorIndex> = match settings.index.backend {
            IndexBackend::Remote => Arc::new(RemoteIndex::new(&settings.index)?),
            IndexBackend::Memory => Arc::new(MemoryIndex::new()),
        };
        index
            .ping()
            .await
            .context("vector index is unreachable")?;

        let embedder = Arc::new(HostedEmbedder::new(&settings.inference));
        let generator = Arc::new(HostedGenerator::new(&settings.inference));
        if settings.inference.api_token.is_none() {
            tracing::warn!("HF_API_TOKEN is not set; answers will fall back to canned text");
        }

        let chat = ChatService::new(embedder, index.clone(), generator);

        Ok(Arc::new(AppState {
            settings,
            index,
            chat,
        }))
    }
}
