//! Text chunking for embedding.

use crate::models::IngestionConfig;
use crate::utils::normalize_whitespace;

/// Splits ingested text into consecutive, non-overlapping segments sized
/// for the embedding model's context window.
///
/// Input is whitespace-normalized first, so re-joining the segments yields
/// the original content up to whitespace. Splitting is character-counted
/// (not byte-counted) and deterministic.
#[derive(Debug, Clone)]
pub struct TextChunker {
    max_chars: usize,
}

impl TextChunker {
    pub fn new(config: &IngestionConfig) -> Self {
        Self::with_max_chars(config.max_chunk_chars)
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Split `text` into segments of at most `max_chars` characters each.
    ///
    /// Empty or whitespace-only input yields an empty sequence; no segment
    /// is ever empty, including when the length is an exact multiple of the
    /// segment size.
    pub fn split(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = normalized.chars().collect();
        chars
            .chunks(self.max_chars)
            .map(|segment| segment.iter().collect())
            .collect()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}
