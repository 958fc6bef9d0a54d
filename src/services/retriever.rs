//! Candidate scoring and ordering.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::RankingError;
use crate::models::{Candidate, RankedCandidate};
use crate::services::Reranker;

/// Orders a candidate pool by relevance to a query and truncates to the
/// top `k`.
///
/// Ordering is done here, not by the scoring capability, so the contract
/// holds regardless of backend: descending by score, ties keep original
/// pool order, identical inputs always produce identical output.
pub struct Retriever {
    reranker: Arc<dyn Reranker>,
}

impl Retriever {
    pub fn new(reranker: Arc<dyn Reranker>) -> Self {
        Self { reranker }
    }

    /// Rank `candidates` against `query`, returning at most `k` results.
    ///
    /// An empty pool short-circuits to an empty result without invoking the
    /// scoring capability. `k` larger than the pool returns the whole pool
    /// ranked. A scoring failure surfaces as `RankingError`; the caller
    /// decides whether to degrade.
    pub async fn rank(
        &self,
        query: &str,
        candidates: &[Candidate],
        k: usize,
    ) -> Result<Vec<RankedCandidate>, RankingError> {
        if k == 0 {
            return Err(RankingError::InvalidRequest(
                "k must be at least 1".to_string(),
            ));
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let scores = self.reranker.score(query, &documents).await?;

        if scores.len() != candidates.len() {
            return Err(RankingError::InvalidResponse(format!(
                "scored {} of {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        let mut ranked: Vec<RankedCandidate> = candidates
            .iter()
            .zip(scores)
            .map(|(candidate, score)| RankedCandidate {
                id: candidate.id.clone(),
                content: candidate.content.clone(),
                score,
            })
            .collect();

        // Stable sort: equal scores keep pool order. Incomparable scores
        // (NaN) are treated as equal for the same reason.
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(k);

        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct FakeReranker {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FakeReranker {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Reranker for FakeReranker {
        async fn score(
            &self,
            _query: &str,
            documents: &[String],
        ) -> Result<Vec<f32>, RankingError> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            Ok(self.scores[..documents.len()].to_vec())
        }
    }

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        async fn score(&self, _query: &str, _documents: &[String]) -> Result<Vec<f32>, RankingError> {
            Err(RankingError::ServerError("status 503: unavailable".into()))
        }
    }

    fn candidates(contents: &[&str]) -> Vec<Candidate> {
        contents
            .iter()
            .enumerate()
            .map(|(i, content)| Candidate {
                id: format!("c{i}"),
                content: (*content).to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_empty_pool_skips_scoring() {
        let reranker = Arc::new(FakeReranker::new(vec![]));
        let retriever = Retriever::new(reranker.clone());

        let ranked = retriever.rank("query", &[], 5).await.unwrap();
        assert!(ranked.is_empty());
        assert_eq!(reranker.calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_orders_descending_and_truncates() {
        let reranker = Arc::new(FakeReranker::new(vec![0.1, 0.9, 0.5]));
        let retriever = Retriever::new(reranker);

        let pool = candidates(&["low", "high", "mid"]);
        let ranked = retriever.rank("query", &pool, 2).await.unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content, "high");
        assert_eq!(ranked[1].content, "mid");
    }

    #[tokio::test]
    async fn test_k_larger_than_pool_returns_all() {
        let reranker = Arc::new(FakeReranker::new(vec![0.3, 0.7]));
        let retriever = Retriever::new(reranker);

        let pool = candidates(&["a", "b"]);
        let ranked = retriever.rank("query", &pool, 10).await.unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_ties_keep_pool_order() {
        let reranker = Arc::new(FakeReranker::new(vec![0.5, 0.5, 0.5, 0.9]));
        let retriever = Retriever::new(reranker);

        let pool = candidates(&["first", "second", "third", "top"]);
        let ranked = retriever.rank("query", &pool, 4).await.unwrap();

        assert_eq!(ranked[0].content, "top");
        assert_eq!(ranked[1].content, "first");
        assert_eq!(ranked[2].content, "second");
        assert_eq!(ranked[3].content, "third");
    }

    #[tokio::test]
    async fn test_deterministic_for_identical_inputs() {
        let reranker = Arc::new(FakeReranker::new(vec![0.2, 0.2, 0.8]));
        let retriever = Retriever::new(reranker);

        let pool = candidates(&["x", "y", "z"]);
        let first = retriever.rank("query", &pool, 3).await.unwrap();
        let second = retriever.rank("query", &pool, 3).await.unwrap();

        let ids =
            |r: &[RankedCandidate]| r.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_scoring_failure_surfaces() {
        let retriever = Retriever::new(Arc::new(FailingReranker));
        let pool = candidates(&["a"]);
        let result = retriever.rank("query", &pool, 1).await;
        assert!(matches!(result, Err(RankingError::ServerError(_))));
    }

    #[tokio::test]
    async fn test_zero_k_is_rejected() {
        let retriever = Retriever::new(Arc::new(FakeReranker::new(vec![0.5])));
        let pool = candidates(&["a"]);
        let result = retriever.rank("query", &pool, 0).await;
        assert!(matches!(result, Err(RankingError::InvalidRequest(_))));
    }
}
