//! Assembled contract records and their hierarchy grouping.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;

/// Placeholder for required string fields the extraction could not fill.
pub const NOT_AVAILABLE: &str = "N/A";

/// Contract families recognised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    /// Master Service Agreement.
    Msa,
    /// Local Service Agreement.
    Lsa,
    /// Statement of Work.
    Sow,
    /// Project Work Order.
    Pwo,
    /// Change Request.
    Cr,
    /// Change Notification Form.
    Cnf,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Msa => "msa",
            ContractType::Lsa => "lsa",
            ContractType::Sow => "sow",
            ContractType::Pwo => "pwo",
            ContractType::Cr => "cr",
            ContractType::Cnf => "cnf",
        }
    }

    /// Parses a type code in any casing, e.g. `"MSA"` or `"sow"`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_lowercase().as_str() {
            "msa" => Some(ContractType::Msa),
            "lsa" => Some(ContractType::Lsa),
            "sow" => Some(ContractType::Sow),
            "pwo" => Some(ContractType::Pwo),
            "cr" => Some(ContractType::Cr),
            "cnf" => Some(ContractType::Cnf),
            _ => None,
        }
    }
}

/// Structured parsing provenance stored under `entities["parsing_metadata"]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingMetadata {
    pub parser_version: String,
    /// ISO 8601 timestamp string.
    pub extraction_date: String,
    pub confidence_score: f64,
}

/// One assembled contract record.
///
/// Built by the assembler from a single document's extraction results and
/// read-only after validation. The `entities` map carries three sub-objects
/// once assembly completes: `sections`, `extracted_entities`, and
/// `parsing_metadata`; the validator reports any that are missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub document: Document,
    pub contract_type: ContractType,
    pub contract_number: String,
    pub contract_name: String,
    pub client_name: String,
    pub vendor_name: String,
    pub effective_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub total_value: Option<f64>,
    pub currency: String,
    pub parent_contract_id: Option<String>,
    #[serde(default)]
    pub child_contracts: Vec<String>,
    #[serde(default)]
    pub entities: Map<String, Value>,
}

impl Contract {
    pub fn section_count(&self) -> usize {
        self.entities
            .get("sections")
            .and_then(Value::as_object)
            .map_or(0, Map::len)
    }

    pub fn clause_count(&self) -> usize {
        match self
            .entities
            .get("extracted_entities")
            .and_then(|v| v.get("key_clauses"))
        {
            Some(Value::Object(map)) => map.len(),
            Some(Value::Array(list)) => list.len(),
            _ => 0,
        }
    }

    pub fn confidence_score(&self) -> f64 {
        self.entities
            .get("parsing_metadata")
            .and_then(|v| v.get("confidence_score"))
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }

    pub fn has_dates(&self) -> bool {
        self.effective_date.is_some() || self.expiration_date.is_some()
    }

    pub fn has_value(&self) -> bool {
        self.total_value.is_some()
    }
}

/// A family of related contracts rooted at one master agreement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractHierarchy {
    pub hierarchy_id: String,
    pub name: String,
    pub root_contract_id: String,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    /// ISO 8601 timestamp string.
    pub created_at: String,
    /// ISO 8601 timestamp string.
    pub updated_at: String,
    pub is_valid: bool,
    #[serde(default)]
    pub validation_errors: Vec<String>,
}

// ── Tests ──────────────────────────────────────────────────────────────────
