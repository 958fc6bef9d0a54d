//! Grounded response generation.

use std::sync::Arc;

use crate::error::ChatError;
use crate::models::{Candidate, ChatConfig, RankedCandidate};
use crate::services::{Generator, Retriever};
use crate::store::DocumentStore;
use crate::utils::truncate_chars;

/// Answers a query for one owner, grounding the generation in the owner's
/// stored chunks when possible.
///
/// Three paths per request: no stored candidates (ungrounded generation),
/// grounded generation from the top-K ranked chunks, and a fallback to
/// ungrounded generation when ranking is unavailable or returns nothing.
/// Retrieval-side failures never fail the request; only the generation
/// capability can.
pub struct Responder {
    store: Arc<dyn DocumentStore>,
    retriever: Retriever,
    generator: Arc<dyn Generator>,
    top_k: usize,
    max_context_chars: usize,
}

impl Responder {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        retriever: Retriever,
        generator: Arc<dyn Generator>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            retriever,
            generator,
            top_k: config.top_k.max(1),
            max_context_chars: config.max_context_chars.max(1),
        }
    }

    pub async fn answer(&self, owner_id: &str, query: &str) -> Result<String, ChatError> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(ChatError::InvalidInput(
                "owner_id must not be empty".to_string(),
            ));
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::InvalidInput("query must not be empty".to_string()));
        }

        let context = self.retrieve_context(owner_id, query).await;
        let answer = self.generator.generate(query, &context).await?;
        Ok(answer)
    }

    /// Produce the context block for `query`, or an empty one when there is
    /// nothing to ground on. Every failure on this path degrades rather
    /// than propagates.
    async fn retrieve_context(&self, owner_id: &str, query: &str) -> Vec<String> {
        let candidates: Vec<Candidate> = match self.store.chunks_for_owner(owner_id).await {
            Ok(chunks) => chunks.into_iter().map(Candidate::from).collect(),
            Err(err) => {
                tracing::warn!(owner_id, error = %err, "candidate fetch failed, answering ungrounded");
                return Vec::new();
            }
        };

        if candidates.is_empty() {
            return Vec::new();
        }

        match self.retriever.rank(query, &candidates, self.top_k).await {
            Ok(ranked) if !ranked.is_empty() => self.assemble_context(ranked),
            Ok(_) => {
                tracing::warn!(owner_id, "reranker returned no results, answering ungrounded");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(owner_id, error = %err, "reranking unavailable, answering ungrounded");
                Vec::new()
            }
        }
    }

    /// Fit ranked chunks into the context budget, best-ranked first. Once a
    /// chunk does not fit, it and everything below it are dropped; the
    /// top-ranked chunk is truncated instead of dropped so the context is
    /// never empty here.
    fn assemble_context(&self, ranked: Vec<RankedCandidate>) -> Vec<String> {
        let mut remaining = self.max_context_chars;
        let mut context = Vec::new();

        for (position, candidate) in ranked.into_iter().enumerate() {
            let length = candidate.content.chars().count();
            if length <= remaining {
                remaining -= length;
                context.push(candidate.content);
            } else if position == 0 {
                context.push(truncate_chars(&candidate.content, remaining));
                break;
            } else {
                break;
            }
        }

        context
    }
}
