//! Locale-aware parsing helpers for amounts, dates, and names.

use chrono::NaiveDate;

/// Parses a monetary amount, handling Brazilian and US locale conventions.
///
/// # Algorithm
///
/// 1. Strip currency symbols (`R$`, `US$`, `USD`, `€`, `£`) and whitespace.
/// 2. If both `.` and `,` remain, `.` is a thousands separator and `,` the
///    decimal mark (Brazilian convention): drop the dots, turn the comma
///    into a dot.
/// 3. If only `,` remains, treat it as the decimal mark.
/// 4. Parse what is left as a float.
///
/// `"R$ 150.000,00"` → `150000.0`; a lone comma is always a decimal mark,
/// so `"1,500"` → `1.5`. Unparseable input yields `None`, never an error.
pub fn parse_amount(value: &str) -> Option<f64> {
    let mut cleaned: String = value
        .chars()
        .filter(|c| {
            !matches!(c, 'R' | 'U' | 'S' | 'D' | '$' | '€' | '£') && !c.is_whitespace()
        })
        .collect();

    if cleaned.contains(',') && cleaned.contains('.') {
        cleaned = cleaned.replace('.', "").replace(',', ".");
    } else if cleaned.contains(',') {
        cleaned = cleaned.replace(',', ".");
    }

    cleaned.parse::<f64>().ok()
}

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Best-effort date parsing across the formats contracts actually use:
/// `DD/MM/YYYY`, `YYYY-MM-DD`, and `DD [de] month [de] YYYY` with
/// Portuguese month names matched by three-letter prefix.
///
/// Returns `None` for anything unparseable or calendar-invalid; callers
/// decide their own fallback.
pub fn parse_date_flex(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }
    parse_month_name_date(trimmed)
}

fn parse_month_name_date(text: &str) -> Option<NaiveDate> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() < 3 {
        return None;
    }

    let day: u32 = strip_punct(tokens.first()?).parse().ok()?;
    let year: i32 = strip_punct(tokens.last()?).parse().ok()?;
    if !(1000..=9999).contains(&year) {
        return None;
    }
    let month = tokens[1..tokens.len() - 1]
        .iter()
        .find_map(|t| month_from_name(t))?;

    NaiveDate::from_ymd_opt(year, month, day)
}

fn strip_punct(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_ascii_digit())
}

/// Maps a Portuguese month name (or any prefix-compatible spelling) to its
/// month number.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix: String = lower.chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "fev" => 2,
        "mar" => 3,
        "abr" => 4,
        "mai" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" => 8,
        "set" => 9,
        "out" => 10,
        "nov" => 11,
        "dez" => 12,
        _ => return None,
    };
    Some(month)
}

/// Normalizes a supplier name for use as a directory or filename component:
/// spaces and hyphens become underscores, everything non-alphanumeric is
/// dropped, and the result is capped at 50 characters.
pub fn normalize_supplier_name(supplier: &str) -> String {
    if supplier.is_empty() {
        return "Unknown".to_string();
    }
    supplier
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(50)
        .collect()
}

/// Finds the first plausible four-digit year (1900–2099) in a date string.
///
/// The window must sit on word boundaries, so the `2999` open-ended
/// placeholder and run-on digit strings are deliberately not recognised.
pub fn extract_year(date_string: &str) -> Option<String> {
    let chars: Vec<char> = date_string.chars().collect();
    let is_word = |c: char| c.is_alphanumeric() || c == '_';

    for i in 0..chars.len() {
        if i > 0 && is_word(chars[i - 1]) {
            continue;
        }
        if i + 4 > chars.len() {
            break;
        }
        let window = &chars[i..i + 4];
        if !window.iter().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let century = (window[0], window[1]);
        if century != ('1', '9') && century != ('2', '0') {
            continue;
        }
        if let Some(&next) = chars.get(i + 4)
            && is_word(next)
        {
            continue;
        }
        return Some(window.iter().collect());
    }
    None
}

// ── Tests ──────────────────────────────────────────────────────────────────
