//! Contract metadata extracted by the LLM or pattern analyzers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::extract_year;

/// Placeholder year for contracts with no determinable end date.
///
/// Deliberately outside the plausible-year range so downstream consumers can
/// recognise an open-ended contract; it survives filename generation as-is.
pub const OPEN_ENDED_YEAR: &str = "2999";

/// Structured metadata for one contract, as returned by an analyzer.
///
/// Every field is best-effort: analyzers fill what they can and fall back to
/// `Unknown`-style placeholders for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractMetadata {
    pub contract_id: String,
    pub contract_name: String,
    pub contract_type: String,
    pub supplier: String,
    pub start_date: String,
    pub end_date: String,
    pub start_year: String,
    /// [`OPEN_ENDED_YEAR`] when no end date could be determined.
    pub end_year: String,
    #[serde(default)]
    pub parties: Vec<String>,
    pub business_area: String,
    pub project_scope: String,
    #[serde(default)]
    pub confidence: f64,
    /// Analyzer that produced this record, e.g. `"openai"` or `"pattern"`.
    pub extraction_method: String,
}

impl ContractMetadata {
    /// Builds metadata from an analyzer's JSON payload, applying the
    /// placeholder defaults for missing or null fields and deriving the
    /// year columns from the date strings.
    pub fn from_payload(data: &Value) -> Self {
        let start_date = field_or(data, "start_date", "");
        let end_date = field_or(data, "end_date", "");

        let start_year = extract_year(&start_date).unwrap_or_default();
        let mut end_year = extract_year(&end_date).unwrap_or_default();
        if end_year.is_empty() {
            end_year = OPEN_ENDED_YEAR.to_string();
        }

        let parties = data
            .get("parties")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        ContractMetadata {
            contract_id: field_or(data, "contract_id", "UNKNOWN"),
            contract_name: field_or(data, "contract_name", "Unknown Contract"),
            contract_type: field_or(data, "contract_type", "Unknown"),
            supplier: field_or(data, "supplier", "Unknown"),
            start_date,
            end_date,
            start_year,
            end_year,
            parties,
            business_area: field_or(data, "business_area", "Unknown"),
            project_scope: field_or(data, "project_scope", ""),
            confidence: data.get("confidence").and_then(Value::as_f64).unwrap_or(0.0),
            extraction_method: "openai".to_string(),
        }
    }
}

fn field_or(data: &Value, key: &str, default: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_fills_defaults() {
        let data = json!({
            "contract_id": "MSA-2024-001",
            "supplier": null,
            "confidence": 0.9
        });
        let m = ContractMetadata::from_payload(&data);
        assert_eq!(m.contract_id, "MSA-2024-001");
        assert_eq!(m.contract_name, "Unknown Contract");
        assert_eq!(m.supplier, "Unknown");
        assert_eq!(m.confidence, 0.9);
        assert_eq!(m.extraction_method, "openai");
        assert!(m.parties.is_empty());
    }

    #[test]
    fn missing_end_date_gets_open_ended_year() {
        let data = json!({
            "start_date": "2024-01-15",
            "end_date": null
        });
        let m = ContractMetadata::from_payload(&data);
        assert_eq!(m.start_year, "2024");
        assert_eq!(m.end_year, OPEN_ENDED_YEAR);
    }

    #[test]
    fn placeholder_end_date_stays_open_ended() {
        // "2999" is outside the recognised year range, so the year column
        // falls through to the placeholder rather than parsing it.
        let data = json!({
            "start_date": "2023-06-01",
            "end_date": "2999"
        });
        let m = ContractMetadata::from_payload(&data);
        assert_eq!(m.start_year, "2023");
        assert_eq!(m.end_year, OPEN_ENDED_YEAR);
    }

    #[test]
    fn parties_keeps_only_strings() {
        let data = json!({"parties": ["TechCorp", 42, "DevSolutions"]});
        let m = ContractMetadata::from_payload(&data);
        assert_eq!(m.parties, vec!["TechCorp", "DevSolutions"]);
    }
}
