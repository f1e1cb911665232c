//! Centroid segment classifier.
//!
//! Embeds a handful of seed sentences per label and collapses each label
//! into one unit-length centroid. A segment is then classified by cosine
//! similarity against every centroid, and the winner's similarity doubles
//! as the confidence the classification pass gates on. Runs off the same
//! sentence encoder as the domain pass, so one model directory serves
//! both passes.

use crate::domain_pass::cosine_similarity;
use crate::error::ExtractError;
use crate::source::{SegmentClassifier, SegmentLabel, SentenceEncoder};

/// Seed sentences per label, mirroring the clause shapes the
/// classification pass shortlists: amounts, dates, and identifiers.
pub fn builtin_labels() -> Vec<(String, Vec<String>)> {
    fn owned(label: &str, sentences: &[&str]) -> (String, Vec<String>) {
        (
            label.to_string(),
            sentences.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    vec![
        owned(
            "amount",
            &[
                "The total contract value is $250,000.00 payable in monthly installments",
                "The monthly service fee amounts to R$ 15,000.00 plus applicable taxes",
                "Compensation under this agreement shall not exceed the amount of EUR 80,000",
            ],
        ),
        owned(
            "date",
            &[
                "This agreement becomes effective on January 1, 2024",
                "The contract term expires on December 31, 2026 unless renewed",
                "Services shall commence on the effective date and remain valid for two years",
            ],
        ),
        owned(
            "identifier",
            &[
                "Contract number MSA-2024-001 is entered into between the parties",
                "This Statement of Work SOW-2024-017 supplements the master service agreement",
                "Agreement no. NDA-2023-112 governs the exchange of confidential information",
            ],
        ),
    ]
}

pub struct CentroidClassifier<E> {
    encoder: E,
    centroids: Vec<(String, Vec<f32>)>,
}

impl<E: SentenceEncoder> CentroidClassifier<E> {
    /// Embeds every seed sentence and averages each label into one
    /// unit-length centroid. Labels with no sentences are dropped; an
    /// encoder failure aborts the fit.
    pub fn fit<I>(mut encoder: E, labeled: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut centroids = Vec::new();
        for (label, sentences) in labeled {
            let mut sum: Vec<f32> = Vec::new();
            let mut count = 0usize;
            for sentence in &sentences {
                let embedding = encoder.encode(sentence)?;
                if sum.is_empty() {
                    sum = vec![0.0; embedding.len()];
                }
                for (acc, val) in sum.iter_mut().zip(&embedding) {
                    *acc += val;
                }
                count += 1;
            }
            if count == 0 {
                continue;
            }
            for v in &mut sum {
                *v /= count as f32;
            }
            normalize(&mut sum);
            centroids.push((label, sum));
        }
        Ok(Self { encoder, centroids })
    }

    pub fn label_count(&self) -> usize {
        self.centroids.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.centroids.iter().map(|(label, _)| label.as_str())
    }
}

impl<E: SentenceEncoder> SegmentClassifier for CentroidClassifier<E> {
    fn classify(&mut self, segment: &str) -> Result<SegmentLabel, ExtractError> {
        if self.centroids.is_empty() {
            return Err(ExtractError::SourceUnavailable(
                "classifier has no centroids".into(),
            ));
        }
        let embedding = self.encoder.encode(segment)?;

        let mut best_label = String::new();
        let mut best_sim = f32::NEG_INFINITY;
        for (label, centroid) in &self.centroids {
            let sim = cosine_similarity(&embedding, centroid);
            if sim > best_sim {
                best_sim = sim;
                best_label.clone_from(label);
            }
        }

        Ok(SegmentLabel {
            label: best_label,
            confidence: best_sim,
        })
    }
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify_pass::ClassifyPass;
    use crate::source::ExtractionSource;
    use pactum_core::EntityType;

    /// One axis per topic keyword, so cosine values in tests are exact.
    struct AxisEncoder;

    impl SentenceEncoder for AxisEncoder {
        fn encode(&mut self, text: &str) -> Result<Vec<f32>, ExtractError> {
            let lower = text.to_lowercase();
            let mut v = vec![0.0f32; 3];
            if lower.contains('$') || lower.contains("value") {
                v[0] = 1.0;
            }
            if lower.contains("date") {
                v[1] = 1.0;
            }
            if lower.contains("contract no") {
                v[2] = 1.0;
            }
            Ok(v)
        }
    }

    fn seeds(label: &str, sentences: &[&str]) -> (String, Vec<String>) {
        (
            label.to_string(),
            sentences.iter().map(|s| (*s).to_string()).collect(),
        )
    }

    #[test]
    fn fit_builds_one_centroid_per_label() {
        let classifier = CentroidClassifier::fit(
            AxisEncoder,
            vec![
                seeds("amount", &["the value is set", "the $ figure"]),
                seeds("date", &["the date of signing"]),
            ],
        )
        .unwrap();

        assert_eq!(classifier.label_count(), 2);
        let labels: Vec<&str> = classifier.labels().collect();
        assert_eq!(labels, ["amount", "date"]);
    }

    #[test]
    fn classify_picks_the_nearest_centroid() {
        let mut classifier = CentroidClassifier::fit(
            AxisEncoder,
            vec![
                seeds("amount", &["the value is fixed"]),
                seeds("date", &["the date is fixed"]),
            ],
        )
        .unwrap();

        let verdict = classifier.classify("payment value of $100").unwrap();
        assert_eq!(verdict.label, "amount");
        assert!((verdict.confidence - 1.0).abs() < 1e-6);

        let verdict = classifier.classify("renewal date pending").unwrap();
        assert_eq!(verdict.label, "date");
    }

    #[test]
    fn mixed_segments_split_the_similarity() {
        let mut classifier = CentroidClassifier::fit(
            AxisEncoder,
            vec![
                seeds("amount", &["the value clause"]),
                seeds("date", &["the date clause"]),
            ],
        )
        .unwrap();

        // Both axes light up, so cosine drops to 1/sqrt(2) for each; the
        // first centroid keeps a strict-greater tie.
        let verdict = classifier.classify("the value is due by the date").unwrap();
        assert_eq!(verdict.label, "amount");
        assert!((verdict.confidence - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn empty_seed_lists_are_dropped() {
        let mut classifier =
            CentroidClassifier::fit(AxisEncoder, vec![seeds("amount", &[])]).unwrap();

        assert_eq!(classifier.label_count(), 0);
        assert!(classifier.classify("the value is $5").is_err());
    }

    #[test]
    fn drives_the_classification_pass() {
        let classifier = CentroidClassifier::fit(
            AxisEncoder,
            vec![seeds("amount", &["the value in $ terms"])],
        )
        .unwrap();
        let mut pass = ClassifyPass::new(classifier);

        let text = "The total value is $90,000 for the term. The effective date remains open.";
        let candidates = pass.extract(text).unwrap();

        // The amount sentence matches its centroid exactly; the date
        // sentence scores zero against it and is gated out.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entity_type, EntityType::Amount);
        assert_eq!(candidates[0].text, "The total value is $90,000 for the term");
    }
}
