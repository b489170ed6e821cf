//! Embed exported job records and upsert them into the knowledge index.
//!
//! Usage: `prepare-docs <jobs.json>` with the same environment as the
//! server. Re-running is safe: documents are keyed by
//! (sourceType, sourceId, chunkIndex) and replaced in place.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};

use portalrag_backend::core::config::{IndexBackend, Settings};
use portalrag_backend::core::logging;
use portalrag_backend::embed::{Embedder, HostedEmbedder};
use portalrag_backend::index::{KnowledgeDoc, MemoryIndex, RemoteIndex, VectorIndex};
use portalrag_backend::ingest::{load_jobs, prepare_job};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    logging::init(&settings.log_dir);

    let Some(jobs_path) = env::args().nth(1).map(PathBuf::from) else {
        bail!("usage: prepare-docs <jobs.json>");
    };

    let index: Arc<dyn VectorIndex> = match settings.index.backend {
        IndexBackend::Remote => Arc::new(RemoteIndex::new(&settings.index)?),
        IndexBackend::Memory => {
            tracing::warn!("memory index selected; documents will not outlive this process");
            Arc::new(MemoryIndex::new())
        }
    };
    index
        .ping()
        .await
        .context("vector index is unreachable")?;

    let embedder = HostedEmbedder::new(&settings.inference);

    let jobs = load_jobs(&jobs_path)
        .with_context(|| format!("failed to read jobs from {}", jobs_path.display()))?;
    tracing::info!("processing {} job record(s)", jobs.len());

    let mut upserted = 0usize;
    for job in &jobs {
        let Some(prepared) = prepare_job(job) else {
            continue;
        };

        for (chunk_index, snippet) in prepared.snippets.iter().enumerate() {
            tracing::info!(
                "embedding job {} chunk {}",
                prepared.source_id,
                chunk_index
            );
            let embedding = embedder
                .embed(snippet)
                .await
                .with_context(|| format!("failed to embed job {}", prepared.source_id))?;

            index
                .upsert(KnowledgeDoc {
                    source_type: "job".to_string(),
                    source_id: prepared.source_id.clone(),
                    chunk_index,
                    text: snippet.clone(),
                    metadata: prepared.metadata.clone(),
                    embedding,
                })
                .await
                .with_context(|| format!("failed to upsert job {}", prepared.source_id))?;
            upserted += 1;
        }
    }

    tracing::info!(
        "done: {} snippet(s) embedded into '{}'",
        upserted,
        settings.index.collection
    );
    Ok(())
}
