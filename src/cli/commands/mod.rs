mod chat;
mod config;
mod ingest;
mod sources;
mod status;

pub use chat::ChatArgs;
pub use config::ConfigCommand;
pub use ingest::IngestArgs;
pub use sources::SourcesArgs;

pub use chat::handle_chat;
pub use config::handle_config;
pub use ingest::handle_ingest;
pub use sources::handle_sources;
pub use status::handle_status;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::models::Config;
use crate::services::{AnthropicGenerator, Pipeline, VoyageEmbeddings, VoyageReranker};
use crate::store::create_store;

/// Wire the pipeline from configuration: HTTP capability clients plus the
/// configured store backend.
pub(crate) async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let store = create_store(&config.storage, config.embedding.dimension)
        .await
        .context("failed to open document store")?;
    let embedder =
        Arc::new(VoyageEmbeddings::new(&config.embedding).context("failed to build embedding client")?);
    let reranker =
        Arc::new(VoyageReranker::new(&config.reranking).context("failed to build rerank client")?);
    let generator = Arc::new(
        AnthropicGenerator::new(&config.generation).context("failed to build generation client")?,
    );

    Ok(Pipeline::new(config, store, embedder, reranker, generator))
}
