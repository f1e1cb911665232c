//! Token-classification pass.
//!
//! Chunks the document into bounded windows (token models have hard input
//! limits), tags each chunk through the injected [`TokenTagger`], and maps
//! the model's raw labels onto the contract taxonomy. Labels outside the
//! mapping table are dropped.

use pactum_core::{EntitySource, EntityType, RawEntityCandidate};

use crate::error::ExtractError;
use crate::source::{ExtractionSource, TokenTagger};

/// Default chunk window, sized to common token-model input limits.
pub const MAX_CHUNK_BYTES: usize = 512;

pub struct TokenPass<T> {
    tagger: T,
    max_chunk: usize,
}

impl<T> TokenPass<T> {
    pub fn new(tagger: T) -> Self {
        Self {
            tagger,
            max_chunk: MAX_CHUNK_BYTES,
        }
    }

    pub fn with_chunk_size(tagger: T, max_chunk: usize) -> Self {
        Self { tagger, max_chunk }
    }
}

impl<T: TokenTagger> ExtractionSource for TokenPass<T> {
    fn source(&self) -> EntitySource {
        EntitySource::TokenModel
    }

    fn extract(&mut self, text: &str) -> Result<Vec<RawEntityCandidate>, ExtractError> {
        let mut candidates = Vec::new();
        for (chunk_start, chunk) in chunk_text(text, self.max_chunk) {
            for span in self.tagger.tag(chunk)? {
                let Some(entity_type) = map_token_label(&span.label) else {
                    continue;
                };
                candidates.push(RawEntityCandidate {
                    text: span.text,
                    entity_type,
                    start_pos: (chunk_start + span.start) as i64,
                    end_pos: (chunk_start + span.end) as i64,
                    confidence: span.confidence,
                    source: EntitySource::TokenModel,
                });
            }
        }
        Ok(candidates)
    }
}

/// Maps a raw token-model label onto the contract taxonomy.
pub fn map_token_label(label: &str) -> Option<EntityType> {
    match label {
        "PERSON" | "ORG" => Some(EntityType::Supplier),
        "DATE" => Some(EntityType::StartDate),
        "MONEY" => Some(EntityType::Amount),
        "CARDINAL" => Some(EntityType::ContractId),
        _ => None,
    }
}

/// Splits text into windows of at most `max_len` bytes, preferring to break
/// at the last sentence boundary inside the window. Window edges always
/// fall on character boundaries.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<(usize, &str)> {
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            // Window smaller than the character at `start`; take it whole.
            end = text[start..]
                .chars()
                .next()
                .map_or(text.len(), |c| start + c.len_utf8());
        }
        if end < text.len()
            && let Some(pos) = text[start..end].rfind('.')
            && pos > 0
        {
            end = start + pos + 1;
        }
        chunks.push((start, &text[start..end]));
        start = end;
    }

    chunks
}

// ── Tests ──────────────────────────────────────────────────────────────────
