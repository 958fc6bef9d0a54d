//! Embedding capability and the Voyage AI-backed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Maps text to fixed-length vectors.
///
/// Implementations must preserve input order and return exactly one vector
/// per input text. Callers pass chunk-sized texts; whole documents never
/// reach this interface.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Request body for the Voyage `/v1/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Voyage AI embedding client.
#[derive(Debug, Clone)]
pub struct VoyageEmbeddings {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    batch_size: usize,
}

impl VoyageEmbeddings {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(EmbeddingError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let request = EmbedRequest {
            input: texts,
            model: &self.model,
            input_type: "document",
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {status}: {body}"
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.data.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "requested {} embeddings, got {}",
                texts.len(),
                embed_response.data.len()
            )));
        }

        // The service tags each embedding with its input index; order by it
        // rather than trusting response order.
        let mut data = embed_response.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for VoyageEmbeddings {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(batch).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_creation() {
        assert!(VoyageEmbeddings::new(&test_config()).is_ok());
    }

    #[test]
    fn test_missing_api_key() {
        let config = EmbeddingConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        // An empty key only fails when the environment has no fallback.
        if std::env::var("VOYAGE_API_KEY").is_err() {
            assert!(matches!(
                VoyageEmbeddings::new(&config),
                Err(EmbeddingError::MissingApiKey)
            ));
        }
    }

    #[test]
    fn test_base_url_trimming() {
        let config = EmbeddingConfig {
            url: "https://api.voyageai.com/".to_string(),
            ..test_config()
        };
        let client = VoyageEmbeddings::new(&config).unwrap();
        assert_eq!(client.base_url, "https://api.voyageai.com");
    }
}
