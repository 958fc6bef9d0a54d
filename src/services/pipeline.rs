//! The ingestion and query orchestrator.

use std::sync::Arc;

use crate::error::{ChatError, EmbeddingError, IngestError};
use crate::models::{Config, ContentSource, Document, NewChunk};
use crate::services::{Embedder, Generator, Reranker, Responder, Retriever, TextChunker};
use crate::store::DocumentStore;
use crate::utils::retry::{RetryConfig, with_retry};

/// Single entry point for every front-end: `ingest` and `respond`.
///
/// Capabilities are injected at construction; the pipeline holds no other
/// state and is safe to share across concurrent requests.
pub struct Pipeline {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DocumentStore>,
    responder: Responder,
    retry: RetryConfig,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let responder = Responder::new(
            store.clone(),
            Retriever::new(reranker),
            generator,
            &config.chat,
        );

        Self {
            chunker: TextChunker::new(&config.ingestion),
            embedder,
            store,
            responder,
            retry: RetryConfig::default(),
        }
    }

    /// Ingest one logical document: chunk, embed, persist.
    ///
    /// Atomic from the caller's view: on any failure no document is left
    /// visible, and the underlying error kind is surfaced. Empty or
    /// whitespace-only text is a no-op returning `Ok(None)`; a document
    /// must own at least one chunk, so none is created.
    pub async fn ingest(
        &self,
        owner_id: &str,
        source: ContentSource,
        text: &str,
    ) -> Result<Option<Document>, IngestError> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(IngestError::InvalidInput(
                "owner_id must not be empty".to_string(),
            ));
        }

        let segments = self.chunker.split(text);
        if segments.is_empty() {
            return Ok(None);
        }
        let chunk_count = segments.len();

        let embeddings =
            with_retry(&self.retry, || self.embedder.embed_batch(&segments)).await?;
        if embeddings.len() != segments.len() {
            return Err(IngestError::Embedding(EmbeddingError::InvalidResponse(
                format!("embedded {} of {} chunks", embeddings.len(), segments.len()),
            )));
        }

        let chunks: Vec<NewChunk> = segments
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| NewChunk { content, embedding })
            .collect();

        let document = with_retry(&self.retry, || {
            self.store.create_document(owner_id, source)
        })
        .await?;

        if let Err(err) = with_retry(&self.retry, || {
            self.store.put_chunks(&document.id, chunks.clone())
        })
        .await
        {
            // The chunkless document is already invisible to readers; the
            // delete keeps the store free of failed-ingest residue.
            if let Err(cleanup) = self.store.remove_document(&document.id).await {
                tracing::warn!(
                    document_id = %document.id,
                    error = %cleanup,
                    "failed to remove document after aborted ingest"
                );
            }
            return Err(err.into());
        }

        tracing::debug!(
            document_id = %document.id,
            owner_id,
            source = %source,
            chunks = chunk_count,
            "document ingested"
        );
        Ok(Some(document))
    }

    /// Answer `query` for `owner_id`, grounded in their stored content when
    /// possible. Fails only when generation itself is unavailable or the
    /// input is invalid.
    pub async fn respond(&self, owner_id: &str, query: &str) -> Result<String, ChatError> {
        self.responder.answer(owner_id, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{GenerationError, RankingError, StorageError};
    use crate::models::{DocumentText, StoredChunk};
    use crate::store::{MemoryStore, StoreStats};

    const DIM: usize = 4;

    struct FakeEmbedder {
        calls: AtomicUsize,
        fail_from_call: Option<usize>,
        dimension: usize,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_from_call: None,
                dimension: DIM,
            }
        }

        fn failing() -> Self {
            Self {
                fail_from_call: Some(0),
                ..Self::new()
            }
        }

        fn with_dimension(dimension: usize) -> Self {
            Self {
                dimension,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_from_call.is_some_and(|from| call >= from) {
                return Err(EmbeddingError::ServerError("status 400: bad input".into()));
            }
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![i as f32; self.dimension])
                .collect())
        }
    }

    struct StaticReranker;

    #[async_trait]
    impl Reranker for StaticReranker {
        async fn score(&self, _query: &str, documents: &[String]) -> Result<Vec<f32>, RankingError> {
            // Later chunks score higher; deterministic and distinct.
            Ok((0..documents.len()).map(|i| i as f32).collect())
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(
            &self,
            query: &str,
            context: &[String],
        ) -> Result<String, GenerationError> {
            if context.is_empty() {
                Ok(format!("ungrounded: {query}"))
            } else {
                Ok(format!("grounded({}): {query}", context.len()))
            }
        }
    }

    /// Delegates to a memory store, failing the first `failures` calls to
    /// `create_document` with a transient error.
    struct FlakyStore {
        inner: MemoryStore,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn health_check(&self) -> Result<bool, StorageError> {
            self.inner.health_check().await
        }

        async fn create_document(
            &self,
            owner_id: &str,
            source: ContentSource,
        ) -> Result<Document, StorageError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::ConnectionError("store hiccup".to_string()));
            }
            self.inner.create_document(owner_id, source).await
        }

        async fn put_chunks(
            &self,
            document_id: &str,
            chunks: Vec<NewChunk>,
        ) -> Result<(), StorageError> {
            self.inner.put_chunks(document_id, chunks).await
        }

        async fn remove_document(&self, document_id: &str) -> Result<(), StorageError> {
            self.inner.remove_document(document_id).await
        }

        async fn chunks_for_owner(&self, owner_id: &str) -> Result<Vec<StoredChunk>, StorageError> {
            self.inner.chunks_for_owner(owner_id).await
        }

        async fn documents_text(
            &self,
            owner_id: &str,
            source: Option<ContentSource>,
        ) -> Result<Vec<DocumentText>, StorageError> {
            self.inner.documents_text(owner_id, source).await
        }

        async fn stats(&self) -> Result<StoreStats, StorageError> {
            self.inner.stats().await
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.embedding.dimension = DIM;
        config
    }

    fn pipeline_with_store(store: Arc<dyn DocumentStore>, embedder: Arc<FakeEmbedder>) -> Pipeline {
        Pipeline::new(
            &test_config(),
            store,
            embedder,
            Arc::new(StaticReranker),
            Arc::new(EchoGenerator),
        )
    }

    fn pipeline() -> (Pipeline, Arc<MemoryStore>, Arc<FakeEmbedder>) {
        let store = Arc::new(MemoryStore::new(DIM));
        let embedder = Arc::new(FakeEmbedder::new());
        let pipeline = pipeline_with_store(store.clone(), embedder.clone());
        (pipeline, store, embedder)
    }

    #[tokio::test]
    async fn test_ingest_chunks_embeds_and_stores_in_order() {
        let (pipeline, store, _) = pipeline();

        let text = "a".repeat(9000);
        let document = pipeline
            .ingest("owner-1", ContentSource::Web, &text)
            .await
            .unwrap()
            .expect("document should be created");

        let chunks = store.chunks_for_owner("owner-1").await.unwrap();
        assert_eq!(chunks.len(), 3);
        let indices: Vec<u32> = chunks.iter().map(|c| c.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let lengths: Vec<usize> = chunks.iter().map(|c| c.content.chars().count()).collect();
        assert_eq!(lengths, vec![4000, 4000, 1000]);
        assert!(chunks.iter().all(|c| c.document_id == document.id));
    }

    #[tokio::test]
    async fn test_ingest_empty_text_is_a_noop() {
        let (pipeline, store, embedder) = pipeline();

        let result = pipeline
            .ingest("owner-1", ContentSource::User, "   \n \t ")
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
    }

    #[tokio::test]
    async fn test_ingest_embedding_failure_leaves_nothing_visible() {
        let store = Arc::new(MemoryStore::new(DIM));
        let embedder = Arc::new(FakeEmbedder::failing());
        let pipeline = pipeline_with_store(store.clone(), embedder);

        let result = pipeline
            .ingest("owner-1", ContentSource::User, "some content to embed")
            .await;

        assert!(matches!(result, Err(IngestError::Embedding(_))));
        assert_eq!(store.stats().await.unwrap().documents, 0);
        assert!(store.chunks_for_owner("owner-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_storage_failure_rolls_back() {
        // Store expects DIM-length vectors; a mis-sized embedder triggers a
        // put_chunks failure after the document row exists.
        let store = Arc::new(MemoryStore::new(DIM));
        let embedder = Arc::new(FakeEmbedder::with_dimension(DIM + 1));
        let pipeline = pipeline_with_store(store.clone(), embedder);

        let result = pipeline
            .ingest("owner-1", ContentSource::User, "some content")
            .await;

        assert!(matches!(
            result,
            Err(IngestError::Storage(StorageError::DimensionMismatch { .. }))
        ));
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.documents, 0);
        assert_eq!(stats.chunks, 0);
    }

    #[tokio::test]
    async fn test_ingest_retries_transient_storage_failure_once() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(DIM),
            failures: AtomicUsize::new(1),
        });
        let embedder = Arc::new(FakeEmbedder::new());
        let pipeline = pipeline_with_store(store.clone(), embedder);

        let document = pipeline
            .ingest("owner-1", ContentSource::Notion, "note body")
            .await
            .unwrap();

        assert!(document.is_some());
        assert_eq!(store.stats().await.unwrap().documents, 1);
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_owner() {
        let (pipeline, _, _) = pipeline();
        let result = pipeline.ingest("", ContentSource::User, "text").await;
        assert!(matches!(result, Err(IngestError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_respond_round_trip() {
        let (pipeline, _, _) = pipeline();

        // Nothing stored yet: degrades to ungrounded.
        let answer = pipeline.respond("owner-1", "anything?").await.unwrap();
        assert_eq!(answer, "ungrounded: anything?");

        pipeline
            .ingest("owner-1", ContentSource::User, "rust is a systems language")
            .await
            .unwrap();

        let answer = pipeline.respond("owner-1", "what is rust?").await.unwrap();
        assert_eq!(answer, "grounded(1): what is rust?");
    }

    #[tokio::test]
    async fn test_respond_does_not_see_other_owners() {
        let (pipeline, _, _) = pipeline();

        pipeline
            .ingest("owner-1", ContentSource::User, "owner one's note")
            .await
            .unwrap();

        let answer = pipeline.respond("owner-2", "query").await.unwrap();
        assert_eq!(answer, "ungrounded: query");
    }
}
