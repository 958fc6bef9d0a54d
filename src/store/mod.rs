//! Document store abstraction.
//!
//! The [`DocumentStore`] trait covers everything the pipeline needs from
//! persistence, enabling pluggable backends (SQLite, in-memory) selected by
//! configuration. Implementations must be `Send + Sync`.
//!
//! Backends uphold two invariants for every reader:
//! - a document without chunks does not exist (readers only ever see
//!   documents after a complete chunk write);
//! - chunk order within a document is exactly `chunk_index` order.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{
    ContentSource, Document, DocumentText, NewChunk, StorageConfig, StoreDriver, StoredChunk,
};

/// Row counts as seen by readers (complete documents only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub documents: u64,
    pub chunks: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> Result<bool, StorageError>;

    /// Allocate a fresh document for `owner_id`. The document stays
    /// invisible to readers until `put_chunks` succeeds.
    async fn create_document(
        &self,
        owner_id: &str,
        source: ContentSource,
    ) -> Result<Document, StorageError>;

    /// Persist a document's chunks, all or nothing, with `chunk_index`
    /// taken from list position. Rejects empty lists and embeddings whose
    /// dimension differs from the store's configured dimension.
    async fn put_chunks(
        &self,
        document_id: &str,
        chunks: Vec<NewChunk>,
    ) -> Result<(), StorageError>;

    /// Remove a document and whatever chunks it has. Used by the
    /// orchestrator to roll back a failed ingest, not exposed as a
    /// user-facing delete.
    async fn remove_document(&self, document_id: &str) -> Result<(), StorageError>;

    /// The owner's chunks across all complete documents, ordered by
    /// document `created_at` then `chunk_index`. This is the retrieval
    /// candidate pool.
    async fn chunks_for_owner(&self, owner_id: &str) -> Result<Vec<StoredChunk>, StorageError>;

    /// The owner's documents with chunks re-joined in `chunk_index` order
    /// (newline-separated), one entry per document, `created_at` ascending.
    /// An owner with no documents yields an empty vec, not an error.
    async fn documents_text(
        &self,
        owner_id: &str,
        source: Option<ContentSource>,
    ) -> Result<Vec<DocumentText>, StorageError>;

    /// Counts over complete documents and their chunks.
    async fn stats(&self) -> Result<StoreStats, StorageError>;
}

/// Create a store backend from configuration.
///
/// `embedding_dim` is the system-wide vector length; every backend rejects
/// chunks whose embeddings disagree with it.
pub async fn create_store(
    config: &StorageConfig,
    embedding_dim: usize,
) -> Result<Arc<dyn DocumentStore>, StorageError> {
    match config.driver {
        StoreDriver::Sqlite => {
            let store = SqliteStore::open(config, embedding_dim).await?;
            Ok(Arc::new(store))
        }
        StoreDriver::Memory => Ok(Arc::new(MemoryStore::new(embedding_dim))),
    }
}
