//! Status command implementation.

use anyhow::Result;

use crate::cli::output::{OutputFormat, StatusInfo, get_formatter};
use crate::models::Config;
use crate::store::{DocumentStore, StoreStats, create_store};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (store_healthy, stats) =
        match create_store(&config.storage, config.embedding.dimension).await {
            Ok(store) => {
                let healthy = store.health_check().await.unwrap_or(false);
                let stats = if healthy {
                    store.stats().await.unwrap_or_default()
                } else {
                    StoreStats::default()
                };
                (healthy, stats)
            }
            Err(_) => (false, StoreStats::default()),
        };

    let status = StatusInfo {
        store_driver: config.storage.driver.to_string(),
        store_healthy,
        stats,
        embedding_model: config.embedding.model.clone(),
        embedding_key_set: config.embedding.resolve_api_key().is_some(),
        rerank_model: config.reranking.model.clone(),
        generation_model: config.generation.model.clone(),
        generation_key_set: config.generation.resolve_api_key().is_some(),
    };

    print!("{}", formatter.format_status(&status));

    Ok(())
}
