//! Extraction source and model seams.
//!
//! Each extraction pass is an [`ExtractionSource`]; a model that is not
//! available is simply never added to the extractor's source list, so
//! downstream code never null-checks. The model traits below are the
//! injection points: production code backs them with ONNX sessions, tests
//! with scripted fakes.

use std::cell::RefCell;
use std::rc::Rc;

use pactum_core::{EntitySource, RawEntityCandidate};

use crate::error::ExtractError;

/// One independent extraction pass over document text.
pub trait ExtractionSource {
    /// Which pass this is, used for candidate tagging and logging.
    fn source(&self) -> EntitySource;

    /// Extracts candidates from the full document text. A failure here
    /// means the pass contributes nothing; the orchestrator absorbs it.
    fn extract(&mut self, text: &str) -> Result<Vec<RawEntityCandidate>, ExtractError>;
}

/// A labelled span from a token-classification model.
#[derive(Debug, Clone)]
pub struct TaggedSpan {
    pub text: String,
    /// Raw model label, e.g. `PERSON`, `ORG`, `DATE`, `MONEY`, `CARDINAL`.
    pub label: String,
    /// Byte offsets within the chunk the model was given.
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

/// Token-classification model: tags entity spans in a bounded text chunk.
pub trait TokenTagger {
    fn tag(&mut self, chunk: &str) -> Result<Vec<TaggedSpan>, ExtractError>;
}

/// A label with the model's confidence in it.
#[derive(Debug, Clone)]
pub struct SegmentLabel {
    pub label: String,
    pub confidence: f32,
}

/// Text-classification model: confirms the role of one candidate segment.
pub trait SegmentClassifier {
    fn classify(&mut self, segment: &str) -> Result<SegmentLabel, ExtractError>;
}

/// Sentence-embedding model for semantic similarity.
pub trait SentenceEncoder {
    fn encode(&mut self, text: &str) -> Result<Vec<f32>, ExtractError>;
}

/// A shared handle encodes through the inner model, so two passes can
/// drive one loaded session instead of each holding its own copy.
impl<E: SentenceEncoder> SentenceEncoder for Rc<RefCell<E>> {
    fn encode(&mut self, text: &str) -> Result<Vec<f32>, ExtractError> {
        self.borrow_mut().encode(text)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
