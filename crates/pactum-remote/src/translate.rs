//! Translation service client and the text-normalization layer built on it.
//!
//! Contract text arrives in several languages; the NLP stages downstream
//! work best on English. [`TextNormalizer`] decides per document whether a
//! translation call is worth making, caches what it gets back, and never
//! fails the pipeline: an unreachable service just means the original text
//! flows through with zero confidence.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use pactum_core::fnv1a_hex;

use crate::TranslateError;

/// Per-call cap on the translation service.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters inspected for language detection.
const DETECT_WINDOW: usize = 1000;

/// Minimum ASCII ratio for text to count as English.
const ENGLISH_ASCII_RATIO: f64 = 0.97;

/// One translated string with the service's own confidence.
#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub text: String,
    pub confidence: f32,
}

/// Anything that can translate text to English.
#[async_trait]
pub trait Translate: Send + Sync {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError>;
}

/// HTTP client for the external translation service.
pub struct TranslateClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translated_text: String,
    #[serde(default)]
    confidence: f32,
}

impl TranslateClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Translate for TranslateClient {
    async fn translate(&self, text: &str) -> Result<Translation, TranslateError> {
        let url = format!("{}/translate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "text": text, "target": "en" }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranslateError::Server {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: TranslateResponse = resp.json().await?;
        Ok(Translation {
            text: parsed.translated_text,
            confidence: parsed.confidence,
        })
    }
}

/// Crude language detection over the leading window of a document.
///
/// Text that is almost entirely ASCII is taken as English; accented Latin
/// scripts and CJK both push the ratio down. Empty text counts as English —
/// there is nothing to translate.
pub fn detect_language(text: &str) -> &'static str {
    let window: Vec<char> = text
        .chars()
        .take(DETECT_WINDOW)
        .filter(|c| !c.is_whitespace())
        .collect();
    if window.is_empty() {
        return "en";
    }
    let ascii = window.iter().filter(|c| c.is_ascii()).count();
    if ascii as f64 / window.len() as f64 >= ENGLISH_ASCII_RATIO {
        "en"
    } else {
        "unknown"
    }
}

/// Result of normalizing one document's text.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub text: String,
    pub source_language: String,
    /// True only when the text was actually replaced by a translation.
    pub translated: bool,
    pub confidence: f32,
}

/// Counters exposed by [`TextNormalizer::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationStats {
    pub cached_entries: usize,
    pub cache_hits: usize,
    pub english_skips: usize,
    pub failures: usize,
}

/// Caching translation front end for document text.
pub struct TextNormalizer<T> {
    translator: T,
    cache: HashMap<String, NormalizedText>,
    cache_hits: usize,
    english_skips: usize,
    failures: usize,
}

impl<T: Translate> TextNormalizer<T> {
    pub fn new(translator: T) -> Self {
        Self {
            translator,
            cache: HashMap::new(),
            cache_hits: 0,
            english_skips: 0,
            failures: 0,
        }
    }

    /// Translate `text` to English unless it already is English.
    ///
    /// Results are cached by content hash, failures included. A failed
    /// translation falls back to the original text with zero confidence so
    /// the pipeline continues on the untranslated document.
    pub async fn normalize(&mut self, text: &str) -> NormalizedText {
        let key = fnv1a_hex(text);
        if let Some(cached) = self.cache.get(&key) {
            self.cache_hits += 1;
            debug!(key = %key, "translation cache hit");
            return cached.clone();
        }

        let language = detect_language(text);
        let outcome = if language == "en" {
            self.english_skips += 1;
            NormalizedText {
                text: text.to_string(),
                source_language: "en".to_string(),
                translated: false,
                confidence: 1.0,
            }
        } else {
            match self.translator.translate(text).await {
                Ok(translation) => {
                    info!(
                        confidence = translation.confidence,
                        "translated document text"
                    );
                    NormalizedText {
                        text: translation.text,
                        source_language: language.to_string(),
                        translated: true,
                        confidence: translation.confidence,
                    }
                }
                Err(error) => {
                    warn!(%error, "translation failed, keeping original text");
                    self.failures += 1;
                    NormalizedText {
                        text: text.to_string(),
                        source_language: language.to_string(),
                        translated: false,
                        confidence: 0.0,
                    }
                }
            }
        };

        self.cache.insert(key, outcome.clone());
        outcome
    }

    pub fn stats(&self) -> TranslationStats {
        TranslationStats {
            cached_entries: self.cache.len(),
            cache_hits: self.cache_hits,
            english_skips: self.english_skips,
            failures: self.failures,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
