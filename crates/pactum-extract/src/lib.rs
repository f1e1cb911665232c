//! Multi-pass entity extraction: token, classification, and domain passes
//! pool raw candidates, and the reconciler collapses them into one entity
//! per normalized key. Passes are trait-injected, so the pipeline runs
//! with or without models on the machine.

pub mod centroid;
pub mod classify_pass;
pub mod domain_pass;
#[cfg(feature = "onnx")]
mod encoder;
mod error;
pub mod extractor;
pub mod history;
pub mod reconcile;
pub mod source;
pub mod token_pass;

pub use centroid::{builtin_labels, CentroidClassifier};
pub use classify_pass::ClassifyPass;
pub use domain_pass::{builtin_patterns, cosine_similarity, DomainPass};
#[cfg(feature = "onnx")]
pub use encoder::OnnxEncoder;
pub use error::ExtractError;
pub use extractor::{EntityExtractor, ExtractionOutcome};
pub use history::{HistoricalExamples, HistorySummary};
pub use reconcile::{normalize_entity_text, reconcile};
pub use source::{
    ExtractionSource, SegmentClassifier, SegmentLabel, SentenceEncoder, TaggedSpan, TokenTagger,
};
pub use token_pass::TokenPass;
