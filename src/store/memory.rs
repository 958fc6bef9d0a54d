//! In-memory [`DocumentStore`] implementation.
//!
//! Backs tests and the `memory` driver. Plain maps behind a
//! `std::sync::RwLock`; nothing survives process exit.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{ContentSource, Document, DocumentText, NewChunk, StoredChunk};

use super::{DocumentStore, StoreStats};

struct ChunkRow {
    content: String,
    _embedding: Vec<f32>,
}

#[derive(Default)]
struct Inner {
    /// Insertion-ordered; `created_at` ties resolve to insertion order.
    documents: Vec<Document>,
    /// document_id -> chunk rows in `chunk_index` order.
    chunks: HashMap<String, Vec<ChunkRow>>,
}

pub struct MemoryStore {
    dim: usize,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new(embedding_dim: usize) -> Self {
        Self {
            dim: embedding_dim,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// The owner's complete documents, `created_at` ascending.
    fn complete_documents(inner: &Inner, owner_id: &str) -> Vec<Document> {
        let mut documents: Vec<Document> = inner
            .documents
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .filter(|d| inner.chunks.get(&d.id).is_some_and(|c| !c.is_empty()))
            .cloned()
            .collect();
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        documents
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn health_check(&self) -> Result<bool, StorageError> {
        Ok(true)
    }

    async fn create_document(
        &self,
        owner_id: &str,
        source: ContentSource,
    ) -> Result<Document, StorageError> {
        let document = Document::new(owner_id, source);
        let mut inner = self.inner.write().unwrap();
        inner.documents.push(document.clone());
        Ok(document)
    }

    async fn put_chunks(
        &self,
        document_id: &str,
        chunks: Vec<NewChunk>,
    ) -> Result<(), StorageError> {
        if chunks.is_empty() {
            return Err(StorageError::QueryError(
                "refusing to write an empty chunk list".to_string(),
            ));
        }
        for chunk in &chunks {
            if chunk.embedding.len() != self.dim {
                return Err(StorageError::DimensionMismatch {
                    expected: self.dim,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let mut inner = self.inner.write().unwrap();
        if !inner.documents.iter().any(|d| d.id == document_id) {
            return Err(StorageError::QueryError(format!(
                "unknown document {document_id}"
            )));
        }

        // Built before insertion, so the write is all-or-nothing.
        let rows: Vec<ChunkRow> = chunks
            .into_iter()
            .map(|chunk| ChunkRow {
                content: chunk.content,
                _embedding: chunk.embedding,
            })
            .collect();
        inner.chunks.insert(document_id.to_string(), rows);
        Ok(())
    }

    async fn remove_document(&self, document_id: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.documents.retain(|d| d.id != document_id);
        inner.chunks.remove(document_id);
        Ok(())
    }

    async fn chunks_for_owner(&self, owner_id: &str) -> Result<Vec<StoredChunk>, StorageError> {
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();
        for document in Self::complete_documents(&inner, owner_id) {
            if let Some(rows) = inner.chunks.get(&document.id) {
                for (index, row) in rows.iter().enumerate() {
                    let chunk_index = index as u32;
                    out.push(StoredChunk {
                        id: StoredChunk::chunk_id(&document.id, chunk_index),
                        document_id: document.id.clone(),
                        chunk_index,
                        content: row.content.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    async fn documents_text(
        &self,
        owner_id: &str,
        source: Option<ContentSource>,
    ) -> Result<Vec<DocumentText>, StorageError> {
        let inner = self.inner.read().unwrap();
        let out = Self::complete_documents(&inner, owner_id)
            .into_iter()
            .filter(|d| source.is_none_or(|s| d.source == s))
            .map(|document| {
                let content = inner
                    .chunks
                    .get(&document.id)
                    .map(|rows| {
                        rows.iter()
                            .map(|r| r.content.as_str())
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_default();
                DocumentText {
                    document_id: document.id,
                    source: document.source,
                    content,
                    created_at: document.created_at,
                }
            })
            .collect();
        Ok(out)
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let inner = self.inner.read().unwrap();
        let documents = inner
            .documents
            .iter()
            .filter(|d| inner.chunks.get(&d.id).is_some_and(|c| !c.is_empty()))
            .count() as u64;
        let chunks = inner.chunks.values().map(|c| c.len() as u64).sum();
        Ok(StoreStats { documents, chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, dim: usize) -> NewChunk {
        NewChunk {
            content: content.to_string(),
            embedding: vec![0.0; dim],
        }
    }

    #[tokio::test]
    async fn test_document_without_chunks_is_invisible() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::User)
            .await
            .unwrap();

        assert!(store.chunks_for_owner("owner-1").await.unwrap().is_empty());
        assert!(
            store
                .documents_text("owner-1", None)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        store
            .put_chunks(&doc.id, vec![chunk("hello", 3)])
            .await
            .unwrap();
        assert_eq!(store.chunks_for_owner("owner-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_chunks_assigns_indices_from_position() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::Web)
            .await
            .unwrap();
        store
            .put_chunks(&doc.id, vec![chunk("a", 3), chunk("b", 3), chunk("c", 3)])
            .await
            .unwrap();

        let chunks = store.chunks_for_owner("owner-1").await.unwrap();
        let indexed: Vec<(u32, &str)> = chunks
            .iter()
            .map(|c| (c.chunk_index, c.content.as_str()))
            .collect();
        assert_eq!(indexed, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[tokio::test]
    async fn test_put_chunks_rejects_dimension_mismatch() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::User)
            .await
            .unwrap();

        let result = store.put_chunks(&doc.id, vec![chunk("a", 2)]).await;
        assert!(matches!(
            result,
            Err(StorageError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert_eq!(store.stats().await.unwrap().documents, 0);
    }

    #[tokio::test]
    async fn test_put_chunks_rejects_empty_list_and_unknown_document() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::User)
            .await
            .unwrap();

        assert!(store.put_chunks(&doc.id, vec![]).await.is_err());
        assert!(
            store
                .put_chunks("no-such-doc", vec![chunk("a", 3)])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_documents_text_joins_and_filters() {
        let store = MemoryStore::new(3);
        let web = store
            .create_document("owner-1", ContentSource::Web)
            .await
            .unwrap();
        store
            .put_chunks(&web.id, vec![chunk("page one", 3), chunk("page two", 3)])
            .await
            .unwrap();
        let notion = store
            .create_document("owner-1", ContentSource::Notion)
            .await
            .unwrap();
        store
            .put_chunks(&notion.id, vec![chunk("notion page", 3)])
            .await
            .unwrap();

        let all = store.documents_text("owner-1", None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].content, "page one\npage two");

        let web_only = store
            .documents_text("owner-1", Some(ContentSource::Web))
            .await
            .unwrap();
        assert_eq!(web_only.len(), 1);
        assert_eq!(web_only[0].document_id, web.id);

        assert!(
            store
                .documents_text("owner-2", None)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_remove_document() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::User)
            .await
            .unwrap();
        store
            .put_chunks(&doc.id, vec![chunk("bye", 3)])
            .await
            .unwrap();

        store.remove_document(&doc.id).await.unwrap();
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_owner_isolation() {
        let store = MemoryStore::new(3);
        let doc = store
            .create_document("owner-1", ContentSource::User)
            .await
            .unwrap();
        store
            .put_chunks(&doc.id, vec![chunk("private", 3)])
            .await
            .unwrap();

        assert!(store.chunks_for_owner("owner-2").await.unwrap().is_empty());
    }
}
