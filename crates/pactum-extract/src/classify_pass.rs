//! Classification pass.
//!
//! Splits the document into sentences, keeps the ones whose wording hints
//! at an amount, a date, or a contract identifier, and asks the injected
//! [`SegmentClassifier`] to confirm. Only confidently classified sentences
//! become candidates; the sentence itself is the candidate text, so the
//! reconciler sees full context rather than a clipped span.

use pactum_core::{EntitySource, EntityType, RawEntityCandidate};

use crate::error::ExtractError;
use crate::source::{ExtractionSource, SegmentClassifier};

/// Sentences shorter than this are noise (headers, list bullets).
pub const MIN_SEGMENT_CHARS: usize = 10;

/// Classifier verdicts at or below this score are discarded.
pub const MIN_CLASSIFIER_CONFIDENCE: f32 = 0.7;

const AMOUNT_HINTS: [&str; 6] = ["$", "€", "£", "amount", "value", "cost"];
const DATE_HINTS: [&str; 4] = ["date", "effective", "expiration", "valid"];
const IDENTIFIER_HINTS: [&str; 4] = ["contract", "agreement", "sow", "msa"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentRole {
    Amount,
    Date,
    Identifier,
}

impl SegmentRole {
    fn entity_type(self) -> EntityType {
        match self {
            SegmentRole::Amount => EntityType::Amount,
            SegmentRole::Date => EntityType::StartDate,
            SegmentRole::Identifier => EntityType::ContractId,
        }
    }
}

/// Amount hints win over date hints, which win over identifier hints, so a
/// sentence like "the contract value is due on the effective date" is
/// treated as an amount sentence.
fn segment_role(sentence: &str) -> Option<SegmentRole> {
    let lower = sentence.to_lowercase();
    if AMOUNT_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(SegmentRole::Amount)
    } else if DATE_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(SegmentRole::Date)
    } else if IDENTIFIER_HINTS.iter().any(|hint| lower.contains(hint)) {
        Some(SegmentRole::Identifier)
    } else {
        None
    }
}

pub struct ClassifyPass<C> {
    classifier: C,
    min_confidence: f32,
}

impl<C> ClassifyPass<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            min_confidence: MIN_CLASSIFIER_CONFIDENCE,
        }
    }
}

impl<C: SegmentClassifier> ExtractionSource for ClassifyPass<C> {
    fn source(&self) -> EntitySource {
        EntitySource::ClassificationModel
    }

    fn extract(&mut self, text: &str) -> Result<Vec<RawEntityCandidate>, ExtractError> {
        let mut candidates = Vec::new();
        for raw in text.split('.') {
            let sentence = raw.trim();
            if sentence.chars().count() < MIN_SEGMENT_CHARS {
                continue;
            }
            let Some(role) = segment_role(sentence) else {
                continue;
            };
            let verdict = self.classifier.classify(sentence)?;
            if verdict.confidence <= self.min_confidence {
                continue;
            }
            let start = text.find(sentence);
            candidates.push(RawEntityCandidate {
                text: sentence.to_string(),
                entity_type: role.entity_type(),
                start_pos: start.map_or(-1, |p| p as i64),
                end_pos: start.map_or(-1, |p| (p + sentence.len()) as i64),
                confidence: verdict.confidence,
                source: EntitySource::ClassificationModel,
            });
        }
        Ok(candidates)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
