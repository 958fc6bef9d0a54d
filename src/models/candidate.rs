//! Ephemeral retrieval models: never persisted, produced per query.

use serde::Serialize;

use super::document::StoredChunk;

/// A chunk offered to the retriever for scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub content: String,
}

impl From<StoredChunk> for Candidate {
    fn from(chunk: StoredChunk) -> Self {
        Self {
            id: chunk.id,
            content: chunk.content,
        }
    }
}

/// A scored candidate. Higher score means more relevant; candidates with
/// equal scores keep their original pool order.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub id: String,
    pub content: String,
    pub score: f32,
}
