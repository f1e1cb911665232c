//! Business-rule and structural validation for assembled records.
//!
//! Validation never fails: every check appends a message to an ordered list
//! and the caller decides what a non-empty list means. Structural problems
//! in untyped JSON are reported the same way via [`validate_json_structure`].

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::contract::{Contract, ContractHierarchy, NOT_AVAILABLE};
use crate::document::{Document, DocumentStatus};

/// Runs every business rule against an assembled contract.
///
/// Returns the full ordered list of violations; an empty list means the
/// contract passed.
pub fn validate_contract(contract: &Contract) -> Vec<String> {
    let mut errors = Vec::new();

    if is_placeholder(&contract.contract_name) {
        errors.push("Contract must have a valid name".to_string());
    }
    if is_placeholder(&contract.contract_number) {
        errors.push("Contract must have a valid contract number".to_string());
    }
    if is_placeholder(&contract.client_name) {
        errors.push("Contract must have a valid client name".to_string());
    }
    if is_placeholder(&contract.vendor_name) {
        errors.push("Contract must have a valid vendor name".to_string());
    }

    if let (Some(effective), Some(expiration)) =
        (contract.effective_date, contract.expiration_date)
        && effective >= expiration
    {
        errors.push("Effective date must be before expiration date".to_string());
    }

    if let Some(value) = contract.total_value {
        if !value.is_finite() {
            errors.push("Contract total value must be a finite number".to_string());
        } else if value <= 0.0 {
            errors.push("Contract total value must be positive".to_string());
        }
        if contract.currency.is_empty() {
            errors.push("Contract must have currency when value is specified".to_string());
        }
    }

    if !contract.entities.contains_key("sections") {
        errors.push("Contract entities must include sections".to_string());
    }
    if !contract.entities.contains_key("extracted_entities") {
        errors.push("Contract entities must include extracted entities".to_string());
    }
    if !contract.entities.contains_key("parsing_metadata") {
        errors.push("Contract entities must include parsing metadata".to_string());
    }

    debug!(errors = errors.len(), contract = %contract.contract_number, "contract validated");
    errors
}

fn is_placeholder(field: &str) -> bool {
    field.is_empty() || field == NOT_AVAILABLE
}

/// Business rules for a document record.
pub fn validate_document(document: &Document) -> Vec<String> {
    let mut errors = Vec::new();

    if document.filename.is_empty() {
        errors.push("Document must have a valid filename".to_string());
    }
    if document.file_path.is_empty() {
        errors.push("Document must have a valid file path".to_string());
    }
    if document.file_size == 0 {
        errors.push("Document must have a positive file size".to_string());
    }
    if document.status == DocumentStatus::Error && document.error_message.is_none() {
        errors.push("Document with error status must have an error message".to_string());
    }
    if let Some(content) = &document.content
        && content.chars().count() as u64 > document.file_size
    {
        errors.push("Document content length cannot exceed file size".to_string());
    }

    errors
}

/// Business rules for a contract hierarchy.
pub fn validate_hierarchy(hierarchy: &ContractHierarchy) -> Vec<String> {
    let mut errors = Vec::new();

    if hierarchy.name.is_empty() {
        errors.push("Contract hierarchy must have a valid name".to_string());
    }
    if hierarchy.root_contract_id.is_empty() {
        errors.push("Contract hierarchy must have a root contract ID".to_string());
    }
    if !hierarchy.contracts.is_empty()
        && !hierarchy
            .contracts
            .iter()
            .any(|c| c.document.id == hierarchy.root_contract_id)
    {
        errors.push("Root contract ID must exist in contracts list".to_string());
    }
    if !hierarchy.is_valid && hierarchy.validation_errors.is_empty() {
        errors.push("Invalid hierarchy must have validation error messages".to_string());
    }

    errors
}

/// Recursively checks untyped JSON against a minimal schema with `type`,
/// `required`, `properties`, and `items` keywords. Nested findings carry
/// `Property 'x': ` and `Item i: ` prefixes.
pub fn validate_json_structure(data: &Value, schema: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(required) = schema.get("required").and_then(Value::as_array)
        && let Some(object) = data.as_object()
    {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                errors.push(format!("Required field '{field}' is missing"));
            }
        }
    }

    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        let actual = json_type_name(data);
        let matches = match expected {
            "object" => data.is_object(),
            "array" => data.is_array(),
            "string" => data.is_string(),
            "integer" => data.as_i64().is_some() || data.as_u64().is_some(),
            "number" => data.is_number(),
            "boolean" => data.is_boolean(),
            _ => true,
        };
        if !matches {
            errors.push(format!("Expected {expected} type, got {actual}"));
        }
    }

    if let (Some(object), Some(properties)) = (
        data.as_object(),
        schema.get("properties").and_then(Value::as_object),
    ) {
        for (name, prop_schema) in properties {
            if let Some(value) = object.get(name) {
                for err in validate_json_structure(value, prop_schema) {
                    errors.push(format!("Property '{name}': {err}"));
                }
            }
        }
    }

    if let (Some(items), Some(item_schema)) = (data.as_array(), schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            for err in validate_json_structure(item, item_schema) {
                errors.push(format!("Item {i}: {err}"));
            }
        }
    }

    errors
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validation outcome plus the headline numbers a report needs.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub is_valid: bool,
    pub error_count: usize,
    pub errors: Vec<String>,
    pub confidence_score: f64,
    pub extracted_clauses: usize,
    pub section_count: usize,
    /// ISO 8601 timestamp string.
    pub validation_timestamp: String,
    pub contract_type: String,
    pub has_dates: bool,
    pub has_value: bool,
}

/// Validates a contract and condenses the outcome into a summary record.
pub fn validation_summary(contract: &Contract) -> ValidationSummary {
    let errors = validate_contract(contract);

    ValidationSummary {
        is_valid: errors.is_empty(),
        error_count: errors.len(),
        errors,
        confidence_score: contract.confidence_score(),
        extracted_clauses: contract.clause_count(),
        section_count: contract.section_count(),
        validation_timestamp: Utc::now().to_rfc3339(),
        contract_type: contract.contract_type.as_str().to_string(),
        has_dates: contract.has_dates(),
        has_value: contract.has_value(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
