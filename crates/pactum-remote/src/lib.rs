//! Remote-service clients: LLM structured extraction, the regex fallback
//! used when the model is unreachable, and the translation layer.

mod error;
pub mod fallback;
pub mod llm;
pub mod translate;

pub use error::{AnalyzeError, TranslateError};
pub use fallback::{analyze_with_patterns, PATTERN_CONFIDENCE};
pub use llm::{LlmClient, DEFAULT_MODEL};
pub use translate::{
    detect_language, NormalizedText, TextNormalizer, Translate, TranslateClient, Translation,
    TranslationStats,
};
