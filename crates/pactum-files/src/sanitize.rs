//! Filename sanitization for documents named in non-Latin scripts.
//!
//! Pipeline tooling downstream chokes on CJK filenames, so every inbound
//! file goes through here first. ASCII names pass straight through. For the
//! rest, the name is split into parts and each non-ASCII part is sent to
//! the translation service; when the service is missing or fails, a small
//! deterministic term map still rescues the common business words before
//! the failure is reported.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use tracing::{debug, warn};

use pactum_core::{TranslationRecord, TranslationStatus};
use pactum_remote::Translate;

/// Known business terms, longest first so compound words are claimed whole.
const TERM_MAP: &[(&str, &str)] = &[
    ("【", ""),
    ("】", ""),
    ("御見積書", "Quotation"),
    ("見積書", "Quotation"),
    ("見積", "Estimate"),
    ("請求書", "Invoice"),
    ("契約書", "Contract"),
    ("契約", "Contract"),
    ("システム", "System"),
    ("運用", "Operations"),
    ("サポート", "Support"),
    ("合同", "Contract"),
    ("报价", "Quotation"),
    ("系统", "System"),
    ("支持", "Support"),
];

/// Delimiters tried in order; the first one present splits the name.
const SPLIT_DELIMITERS: [char; 8] = ['_', '-', ' ', '　', '、', '。', '（', '）'];

static QUOTES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["'`]"#).unwrap());
static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s\-]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Produce a filesystem-safe equivalent of `filename`.
///
/// The returned record carries the original name, the best name found, and
/// whether translation actually succeeded. A `Failed` record may still hold
/// an improved name when the term map applied; callers decide whether to
/// queue it for retry.
pub async fn sanitize_filename(
    filename: &str,
    translator: Option<&dyn Translate>,
) -> TranslationRecord {
    let (stem, extension) = split_name(filename);

    if stem.is_ascii() {
        return record(
            filename,
            filename.to_string(),
            TranslationStatus::Success,
            None,
        );
    }

    let Some(service) = translator else {
        let mapped = fallback_map(stem);
        if mapped != stem {
            let safe = with_extension(clean_translated(&mapped), extension);
            return record(
                filename,
                safe,
                TranslationStatus::Failed,
                Some("Translation failed: No translation service available - applied fallback mapping".to_string()),
            );
        }
        return record(
            filename,
            filename.to_string(),
            TranslationStatus::Failed,
            Some("No translation service available".to_string()),
        );
    };

    let parts = split_for_translation(stem);
    let mut translated_parts = Vec::with_capacity(parts.len());
    let mut all_parts_ok = true;

    for part in &parts {
        if part.is_ascii() {
            translated_parts.push(part.clone());
            continue;
        }
        match service.translate(part).await {
            Ok(translation) => {
                debug!(part, result = %translation.text, "translated filename part");
                translated_parts.push(translation.text);
            }
            Err(error) => {
                warn!(part, %error, "filename part translation failed");
                translated_parts.push(part.clone());
                all_parts_ok = false;
            }
        }
    }

    if all_parts_ok {
        let safe = with_extension(clean_translated(&translated_parts.join("_")), extension);
        return record(filename, safe, TranslationStatus::Success, None);
    }

    let mapped = fallback_map(stem);
    if mapped != stem {
        let safe = with_extension(clean_translated(&mapped), extension);
        return record(
            filename,
            safe,
            TranslationStatus::Failed,
            Some("Translation failed: Partial translation failure - applied fallback mapping".to_string()),
        );
    }
    record(
        filename,
        filename.to_string(),
        TranslationStatus::Failed,
        Some("Partial translation failure - some parts could not be translated".to_string()),
    )
}

/// Split a filename into parts worth translating separately.
///
/// Single-character fragments are dropped; if filtering leaves nothing for
/// every delimiter, the whole name is one part.
pub fn split_for_translation(name: &str) -> Vec<String> {
    for delimiter in SPLIT_DELIMITERS {
        if name.contains(delimiter) {
            let parts: Vec<String> = name
                .split(delimiter)
                .map(str::trim)
                .filter(|p| p.chars().count() > 1)
                .map(str::to_string)
                .collect();
            if !parts.is_empty() {
                return parts;
            }
        }
    }
    vec![name.to_string()]
}

/// Tidy translated text for use in a filename: drop quotes, turn symbols
/// and whitespace runs into underscores, trim the edges.
pub fn clean_translated(text: &str) -> String {
    let text = QUOTES_RE.replace_all(text, "");
    let text = SYMBOL_RE.replace_all(&text, "_");
    let text = WHITESPACE_RE.replace_all(&text, "_");
    text.trim_matches('_').to_string()
}

/// Deterministic term-map pass, used when no service is reachable.
///
/// A part that maps to nothing at all (brackets only) keeps its original
/// text rather than vanishing.
pub fn fallback_map(base_name: &str) -> String {
    let parts = split_for_translation(base_name);
    let mapped: Vec<String> = parts
        .iter()
        .map(|part| {
            let mut replaced = part.clone();
            for (term, english) in TERM_MAP {
                if replaced.contains(term) {
                    replaced = replaced.replace(term, english);
                }
            }
            if replaced.is_empty() {
                part.clone()
            } else {
                replaced
            }
        })
        .collect();
    mapped.join("_")
}

// ── Internal ───────────────────────────────────────────────────────────────

fn split_name(filename: &str) -> (&str, Option<&str>) {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(filename);
    (stem, path.extension().and_then(OsStr::to_str))
}

fn with_extension(base: String, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

fn record(
    original: &str,
    translated: String,
    status: TranslationStatus,
    error: Option<String>,
) -> TranslationRecord {
    TranslationRecord {
        original_filename: original.to_string(),
        translated_filename: translated,
        status,
        error_message: error,
        retry_after: None,
        attempts: 0,
        last_attempt: Utc::now(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
