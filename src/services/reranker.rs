//! Reranking capability and the Voyage AI-backed client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RankingError;
use crate::models::RerankingConfig;

/// Scores documents for relevance to a query.
///
/// Returns exactly one score per input document, in input order; ordering
/// and truncation are the retriever's job so that tie-breaking stays
/// deterministic regardless of how the backing service sorts.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RankingError>;
}

/// Request body for the Voyage `/v1/rerank` endpoint.
#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    data: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

/// Voyage AI rerank client.
#[derive(Debug, Clone)]
pub struct VoyageReranker {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl VoyageReranker {
    pub fn new(config: &RerankingConfig) -> Result<Self, RankingError> {
        let api_key = config.resolve_api_key().ok_or(RankingError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RankingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Reranker for VoyageReranker {
    async fn score(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, RankingError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/rerank", self.base_url);
        let request = RerankRequest {
            query,
            documents,
            model: &self.model,
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
                    RankingError::Timeout
                } else {
                    RankingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RankingError::ServerError(format!("status {status}: {body}")));
        }

        let rerank_response: RerankResponse = response
            .json()
            .await
            .map_err(|e| RankingError::InvalidResponse(e.to_string()))?;

        // The service returns results in its own relevance order; map the
        // scores back to input positions.
        let mut scores = vec![None; documents.len()];
        for result in rerank_response.data {
            match scores.get_mut(result.index) {
                Some(slot) => *slot = Some(result.relevance_score),
                None => {
                    return Err(RankingError::InvalidResponse(format!(
                        "result index {} out of range for {} documents",
                        result.index,
                        documents.len()
                    )));
                }
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                s.ok_or_else(|| {
                    RankingError::InvalidResponse(format!("no score returned for document {i}"))
                })
            })
            .collect()
    }
}
