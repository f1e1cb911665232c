//! Regex fallback analyzer for when the LLM is unreachable.
//!
//! Much coarser than the model: a handful of identifier and title forms,
//! type keywords, and a year sweep. Confidence is fixed low so downstream
//! consumers can tell these records from model output.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;
use tracing::info;

use pactum_core::{ContractMetadata, OPEN_ENDED_YEAR};

/// Confidence assigned to every pattern-derived record.
pub const PATTERN_CONFIDENCE: f64 = 0.3;

static CONTRACT_ID_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)contract\s+(?:no\.?|number|#)\s*[:.]?\s*([A-Z0-9\-_]+)").unwrap(),
        Regex::new(r"(?i)agreement\s+(?:no\.?|number|#)\s*[:.]?\s*([A-Z0-9\-_]+)").unwrap(),
        Regex::new(r"([A-Z]{2,3}-\d{4}-\d{3,4})").unwrap(),
    ]
});

static TITLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:this\s+)?(?:agreement|contract)\s+(?:is\s+)?(?:entered\s+into|made)\s+(?:by\s+and\s+between|between)\s+(.+?)(?:\s+and\s+|\.)").unwrap(),
        Regex::new(r"(?i)title[:\s]+(.+?)(?:\n|\.)").unwrap(),
    ]
});

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());

/// Keyword to type-code table, checked in order. Longer phrases come first
/// so "master service agreement" is not claimed by a shorter keyword.
const TYPE_KEYWORDS: &[(&str, &str)] = &[
    ("master service agreement", "MSA"),
    ("local service agreement", "LSA"),
    ("statement of work", "SOW"),
    ("non-disclosure agreement", "NDA"),
    ("project work order", "PWO"),
    ("change request", "CR"),
    ("msa", "MSA"),
    ("sow", "SOW"),
    ("nda", "NDA"),
];

/// Extracts what metadata it can from raw text using the pattern library.
pub fn analyze_with_patterns(text: &str, filename: &str) -> ContractMetadata {
    info!(filename, "using pattern fallback analyzer");

    let (start_year, end_year) = year_range(text);
    let payload = json!({
        "contract_id": first_capture(&CONTRACT_ID_RES, text),
        "contract_name": first_capture(&TITLE_RES, text).map(|t| t.trim().to_string()),
        "contract_type": detect_type(text),
        "start_date": start_year,
        "end_date": end_year,
        "confidence": PATTERN_CONFIDENCE
    });

    let mut metadata = ContractMetadata::from_payload(&payload);
    metadata.extraction_method = "pattern".to_string();
    metadata
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn detect_type(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, code)| (*code).to_string())
}

/// First and last plausible years in the document, as date strings the
/// payload builder can derive year columns from.
fn year_range(text: &str) -> (Option<String>, Option<String>) {
    let years: Vec<&str> = YEAR_RE.find_iter(text).map(|m| m.as_str()).collect();
    match (years.first(), years.last()) {
        (Some(first), Some(last)) if first != last => {
            (Some((*first).to_string()), Some((*last).to_string()))
        }
        (Some(first), _) => (Some((*first).to_string()), None),
        _ => (None, None),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
