//! Domain-knowledge pass.
//!
//! Compares the document against a table of known contract phrases in
//! embedding space. When the document as a whole resembles a phrase, the
//! single closest sentence is emitted as the candidate, so downstream
//! consumers get the supporting wording and not just the matched label.
//! The builtin table covers contract, service, and business-area phrasing
//! and can be extended with phrases mined from labeled history.

use pactum_core::{EntitySource, EntityType, RawEntityCandidate};

use crate::error::ExtractError;
use crate::source::{ExtractionSource, SentenceEncoder};

/// Document similarity a phrase must beat before it produces a candidate.
pub const SIMILARITY_THRESHOLD: f32 = 0.8;

/// Fixed confidence for domain matches; the encoder gives similarity, not
/// a calibrated probability.
pub const DOMAIN_CONFIDENCE: f32 = 0.85;

pub fn builtin_patterns() -> Vec<(EntityType, Vec<String>)> {
    fn owned(phrases: &[&str]) -> Vec<String> {
        phrases.iter().map(|p| (*p).to_string()).collect()
    }

    vec![
        (
            EntityType::ContractType,
            owned(&[
                "Statement of Work",
                "Master Service Agreement",
                "Non-Disclosure Agreement",
                "Sales Contract",
                "Framework Agreement",
                "Service Agreement",
            ]),
        ),
        (
            EntityType::ServiceType,
            owned(&[
                "Information Technology",
                "Marketing Services",
                "Supply Chain",
                "Consulting Services",
                "Professional Services",
                "Technical Support",
            ]),
        ),
        (
            EntityType::BusinessArea,
            owned(&[
                "Data Management",
                "Cloud Services",
                "Digital Transformation",
                "Business Process",
                "Technology Infrastructure",
                "Customer Experience",
            ]),
        ),
    ]
}

pub struct DomainPass<E> {
    encoder: E,
    patterns: Vec<(EntityType, Vec<String>)>,
    threshold: f32,
}

impl<E> DomainPass<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            patterns: builtin_patterns(),
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    /// Adds mined phrases to a category, creating the category when the
    /// builtin table does not carry it.
    pub fn extend_patterns<I>(&mut self, entity_type: EntityType, phrases: I)
    where
        I: IntoIterator<Item = String>,
    {
        if let Some((_, list)) = self
            .patterns
            .iter_mut()
            .find(|(kind, _)| *kind == entity_type)
        {
            list.extend(phrases);
        } else {
            self.patterns.push((entity_type, phrases.into_iter().collect()));
        }
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.iter().map(|(_, list)| list.len()).sum()
    }
}

impl<E: SentenceEncoder> ExtractionSource for DomainPass<E> {
    fn source(&self) -> EntitySource {
        EntitySource::DomainPattern
    }

    fn extract(&mut self, text: &str) -> Result<Vec<RawEntityCandidate>, ExtractError> {
        let document_vec = self.encoder.encode(text)?;

        let mut sentences = Vec::new();
        for raw in text.split('.') {
            let sentence = raw.trim();
            if sentence.is_empty() {
                continue;
            }
            let vec = self.encoder.encode(sentence)?;
            sentences.push((sentence, vec));
        }

        let mut candidates = Vec::new();
        for (entity_type, phrases) in &self.patterns {
            for phrase in phrases {
                let phrase_vec = self.encoder.encode(phrase)?;
                if cosine_similarity(&document_vec, &phrase_vec) <= self.threshold {
                    continue;
                }
                // Earliest sentence wins a similarity tie.
                let mut best: Option<(&str, f32)> = None;
                for (sentence, vec) in &sentences {
                    let sim = cosine_similarity(vec, &phrase_vec);
                    if best.is_none_or(|(_, top)| sim > top) {
                        best = Some((sentence, sim));
                    }
                }
                let Some((best_sentence, _)) = best else {
                    continue;
                };
                let start = text.find(best_sentence);
                candidates.push(RawEntityCandidate {
                    text: best_sentence.to_string(),
                    entity_type: *entity_type,
                    start_pos: start.map_or(-1, |p| p as i64),
                    end_pos: start.map_or(-1, |p| (p + best_sentence.len()) as i64),
                    confidence: DOMAIN_CONFIDENCE,
                    source: EntitySource::DomainPattern,
                });
            }
        }
        Ok(candidates)
    }
}

/// Cosine similarity of two vectors; zero when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Keyword-triggered axes, so similarities in tests are exact: texts
    /// sharing a keyword are identical, all others have zero similarity.
    struct KeywordEncoder;

    impl SentenceEncoder for KeywordEncoder {
        fn encode(&mut self, text: &str) -> Result<Vec<f32>, ExtractError> {
            let lower = text.to_lowercase();
            let tech = if lower.contains("information technology") {
                1.0
            } else {
                0.0
            };
            let payment = if lower.contains("payment") { 1.0 } else { 0.0 };
            Ok(vec![tech, payment])
        }
    }

    struct FailingEncoder;

    impl SentenceEncoder for FailingEncoder {
        fn encode(&mut self, _text: &str) -> Result<Vec<f32>, ExtractError> {
            Err(ExtractError::Model("encoder offline".into()))
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn matching_phrase_emits_closest_sentence() {
        let text = "The supplier provides Information Technology. Maintenance is included.";
        let mut pass = DomainPass::new(KeywordEncoder);

        let candidates = pass.extract(text).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.entity_type, EntityType::ServiceType);
        assert_eq!(c.text, "The supplier provides Information Technology");
        assert_eq!(c.source, EntitySource::DomainPattern);
        assert!((c.confidence - DOMAIN_CONFIDENCE).abs() < f32::EPSILON);
        assert_eq!(c.start_pos, 0);
        assert_eq!(c.end_pos, c.text.len() as i64);
    }

    #[test]
    fn dissimilar_document_yields_nothing() {
        let text = "Generic filler words about nothing in particular. More filler.";
        let mut pass = DomainPass::new(KeywordEncoder);
        assert!(pass.extract(text).unwrap().is_empty());
    }

    #[test]
    fn extended_patterns_participate() {
        let text = "Payment terms apply to every invoice issued.";
        let mut pass = DomainPass::new(KeywordEncoder);
        assert!(pass.extract(text).unwrap().is_empty());

        let before = pass.pattern_count();
        pass.extend_patterns(
            EntityType::BusinessArea,
            vec!["Payment Processing".to_string()],
        );
        assert_eq!(pass.pattern_count(), before + 1);

        let candidates = pass.extract(text).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity_type, EntityType::BusinessArea);
        assert_eq!(candidates[0].text, "Payment terms apply to every invoice issued");
    }

    #[test]
    fn encoder_failure_propagates() {
        let mut pass = DomainPass::new(FailingEncoder);
        let err = pass.extract("anything").unwrap_err();
        assert!(matches!(err, ExtractError::Model(_)));
    }
}
