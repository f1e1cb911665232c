//! Extraction orchestrator.
//!
//! Runs every registered pass over the document and pools their raw
//! candidates. A failing pass is logged and skipped rather than aborting
//! the run; its name still appears in the method string so the outcome
//! records which passes were attempted.

use std::time::{Duration, Instant};

use pactum_core::RawEntityCandidate;
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::source::ExtractionSource;

/// Result of one extraction run, before reconciliation.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub contract_id: String,
    pub candidates: Vec<RawEntityCandidate>,
    /// `+`-joined names of the passes that ran, e.g. `token-model+domain-pattern`.
    pub extraction_method: String,
    /// Mean candidate confidence, `0.0` when nothing was found.
    pub confidence_score: f32,
    pub elapsed: Duration,
}

#[derive(Default)]
pub struct EntityExtractor {
    sources: Vec<Box<dyn ExtractionSource>>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Box<dyn ExtractionSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn extract(&mut self, text: &str, contract_id: &str) -> ExtractionOutcome {
        let started = Instant::now();
        let mut candidates = Vec::new();
        let mut methods = Vec::new();

        for source in &mut self.sources {
            let name = source.source().as_str();
            methods.push(name);
            match source.extract(text) {
                Ok(found) => {
                    debug!(
                        contract_id,
                        source = name,
                        count = found.len(),
                        "extraction pass finished"
                    );
                    candidates.extend(found);
                }
                Err(error) => {
                    warn!(contract_id, source = name, %error, "extraction pass failed");
                }
            }
        }

        let confidence_score = mean_confidence(&candidates);
        ExtractionOutcome {
            contract_id: contract_id.to_string(),
            candidates,
            extraction_method: methods.join("+"),
            confidence_score,
            elapsed: started.elapsed(),
        }
    }
}

fn mean_confidence(candidates: &[RawEntityCandidate]) -> f32 {
    if candidates.is_empty() {
        return 0.0;
    }
    candidates.iter().map(|c| c.confidence).sum::<f32>() / candidates.len() as f32
}

// ── Tests ──────────────────────────────────────────────────────────────────
