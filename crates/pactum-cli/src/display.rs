//! Vertical card display for assembled contracts and search hits.

use chrono::NaiveDate;
use pactum_core::{Contract, ValidationSummary, NOT_AVAILABLE};
use pactum_store::StoredContract;
use serde_json::Value;

const MAX_LIST_ITEMS: usize = 8;

/// Print one contract as a grouped, human-readable card.
pub fn print_contract(contract: &Contract, summary: &ValidationSummary) {
    println!("=== {} ===", contract.contract_name);
    println!("{}", contract.document.filename);
    println!();

    println!("Identity");
    println!("  {:<26} {}", "contract_number", contract.contract_number);
    println!(
        "  {:<26} {}",
        "contract_type",
        contract.contract_type.as_str().to_uppercase()
    );
    println!("  {:<26} {}", "client", contract.client_name);
    println!("  {:<26} {}", "vendor", contract.vendor_name);
    if let Some(parent) = &contract.parent_contract_id {
        println!("  {:<26} {}", "parent_contract", parent);
    }
    println!();

    println!("Dates");
    println!(
        "  {:<26} {}",
        "effective_date",
        date_or_na(contract.effective_date)
    );
    println!(
        "  {:<26} {}",
        "expiration_date",
        date_or_na(contract.expiration_date)
    );
    println!();

    println!("Value");
    match contract.total_value {
        Some(value) => println!("  {:<26} {:.2} {}", "total_value", value, contract.currency),
        None => println!("  {:<26} {}", "total_value", NOT_AVAILABLE),
    }
    println!();

    print_reconciled(contract);

    println!("Validation");
    println!(
        "  {:<26} {}",
        "valid",
        if summary.is_valid { "yes" } else { "no" }
    );
    println!("  {:<26} {:.2}", "confidence", summary.confidence_score);
    println!("  {:<26} {}", "sections", summary.section_count);
    println!("  {:<26} {}", "clauses", summary.extracted_clauses);
    if !summary.errors.is_empty() {
        println!("  errors ({}):", summary.error_count);
        let show = summary.errors.len().min(MAX_LIST_ITEMS);
        for error in &summary.errors[..show] {
            println!("    - {error}");
        }
        if summary.errors.len() > show {
            println!("    ... and {} more", summary.errors.len() - show);
        }
    }
    println!();
}

/// Print vector-search hits, closest first.
pub fn print_search_hits(query: &str, hits: &[StoredContract]) {
    if hits.is_empty() {
        println!("no matches for \"{query}\"");
        return;
    }

    println!("=== {} matches for \"{query}\" ===", hits.len());
    println!();
    for hit in hits {
        println!("{}", hit.id);
        if let Some(supplier) = &hit.supplier {
            println!("  {:<26} {}", "supplier", supplier);
        }
        if let Some(distance) = hit.distance {
            println!("  {:<26} {:.4}", "distance", distance);
        }
        for key in [
            "contract_name",
            "contract_type",
            "effective_date",
            "expiration_date",
        ] {
            if let Some(value) = hit.metadata.get(key).and_then(Value::as_str) {
                println!("  {:<26} {}", key, value);
            }
        }
        println!();
    }
}

// ── Internal ───────────────────────────────────────────────────────────────

fn date_or_na(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| NOT_AVAILABLE.to_string(), |d| d.to_string())
}

fn print_reconciled(contract: &Contract) {
    let Some(items) = contract
        .entities
        .get("extracted_entities")
        .and_then(|v| v.get("reconciled"))
        .and_then(Value::as_array)
    else {
        return;
    };
    if items.is_empty() {
        return;
    }

    println!("Extracted Entities ({}):", items.len());
    let show = items.len().min(MAX_LIST_ITEMS);
    for item in &items[..show] {
        let kind = item.get("entity_type").and_then(Value::as_str).unwrap_or("-");
        let text = item.get("text").and_then(Value::as_str).unwrap_or("-");
        let confidence = item.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
        println!("  {kind:<26} {text} ({confidence:.2})");
    }
    if items.len() > show {
        println!("  ... and {} more", items.len() - show);
    }
    println!();
}
