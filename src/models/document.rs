use serde::{Deserialize, Serialize};

use super::source::ContentSource;

/// One ingested unit of content. Created once at ingestion, never mutated;
/// re-ingesting the same content creates a new document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub owner_id: String,
    pub source: ContentSource,
    pub created_at: String,
}

impl Document {
    pub fn new(owner_id: impl Into<String>, source: ContentSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            source,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A chunk ready to be persisted; `chunk_index` is assigned by the store
/// from list position.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A persisted chunk as surfaced to retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub document_id: String,
    pub chunk_index: u32,
    pub content: String,
}

impl StoredChunk {
    /// Deterministic chunk identity: UUID v5 of `document_id:chunk_index`.
    pub fn chunk_id(document_id: &str, chunk_index: u32) -> String {
        let name = format!("{document_id}:{chunk_index}");
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

/// A document's text re-joined from its chunks in `chunk_index` order.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentText {
    pub document_id: String,
    pub source: ContentSource,
    pub content: String,
    pub created_at: String,
}
