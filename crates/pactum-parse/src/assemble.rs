//! Final contract assembly.
//!
//! Takes everything the pattern layer and the entity extractor produced for
//! one document and builds the [`Contract`] record, applying the `N/A`
//! placeholder defaults for fields nothing could fill.

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use pactum_core::{
    Contract, ContractType, Document, ParsingMetadata, ReconciledEntity, NOT_AVAILABLE,
};

use crate::patterns::{EntityScan, PatternMetadata};

/// Version string recorded under `parsing_metadata.parser_version`.
pub const PARSER_VERSION: &str = "1.0";

/// Builds the contract record. Dates fall back to positional order: the
/// first date found in the document becomes the effective date and the
/// second the expiration date, unless an analyzer supplied explicit ones.
pub fn assemble(
    document: Document,
    metadata: &PatternMetadata,
    sections: Map<String, Value>,
    scan: &EntityScan,
    reconciled: &[ReconciledEntity],
) -> Contract {
    let effective_date = metadata
        .effective_date
        .or_else(|| metadata.dates.first().map(|d| d.date));
    let expiration_date = metadata
        .expiration_date
        .or_else(|| metadata.dates.get(1).map(|d| d.date));

    let confidence = checklist_confidence(metadata, sections.len(), scan);

    let parsing_metadata = ParsingMetadata {
        parser_version: PARSER_VERSION.to_string(),
        extraction_date: Utc::now().to_rfc3339(),
        confidence_score: confidence,
    };

    let mut entities = Map::new();
    entities.insert("sections".into(), Value::Object(sections));
    entities.insert(
        "extracted_entities".into(),
        extracted_value(scan, reconciled),
    );
    entities.insert(
        "parsing_metadata".into(),
        serde_json::to_value(&parsing_metadata).unwrap_or_else(|_| Value::Object(Map::new())),
    );

    let contract_name = metadata
        .title
        .clone()
        .unwrap_or_else(|| document.filename.clone());

    let contract = Contract {
        document,
        contract_type: metadata.contract_type.unwrap_or(ContractType::Msa),
        contract_number: metadata
            .contract_number
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        contract_name,
        client_name: metadata
            .client_name
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        vendor_name: metadata
            .vendor_name
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        effective_date,
        expiration_date,
        total_value: metadata.total_value,
        currency: metadata.currency.clone().unwrap_or_else(|| "USD".to_string()),
        parent_contract_id: None,
        child_contracts: Vec::new(),
        entities,
    };

    info!(contract = %contract.contract_name, confidence, "assembled contract");
    contract
}

/// Six-point extraction completeness score in `0.0..=1.0`: title, contract
/// number, both parties, any date, sections (full credit at five), and
/// clause keywords (full credit at three).
pub fn checklist_confidence(
    metadata: &PatternMetadata,
    section_count: usize,
    scan: &EntityScan,
) -> f64 {
    let mut score = 0.0;
    if metadata.title.is_some() {
        score += 1.0;
    }
    if metadata.contract_number.is_some() {
        score += 1.0;
    }
    if metadata.client_name.is_some() && metadata.vendor_name.is_some() {
        score += 1.0;
    }
    if !metadata.dates.is_empty()
        || metadata.effective_date.is_some()
        || metadata.expiration_date.is_some()
    {
        score += 1.0;
    }
    score += (section_count as f64 / 5.0).min(1.0);
    score += (scan.key_clauses.len() as f64 / 3.0).min(1.0);
    score / 6.0
}

fn extracted_value(scan: &EntityScan, reconciled: &[ReconciledEntity]) -> Value {
    let mut map = match scan.to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if !reconciled.is_empty() {
        map.insert(
            "reconciled".into(),
            serde_json::to_value(reconciled).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
    }
    Value::Object(map)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use chrono::NaiveDate;
    use pactum_core::{
        validate_contract, DocumentStatus, DocumentType, EntitySource, EntityType,
        RawEntityCandidate,
    };

    use crate::parser::parse_markdown;
    use crate::patterns::DatedMatch;

    fn make_document() -> Document {
        Document {
            id: "d-1".into(),
            filename: "contract.md".into(),
            file_path: "/tmp/contract.md".into(),
            document_type: DocumentType::Markdown,
            mime_type: "text/markdown".into(),
            file_size: 64,
            status: DocumentStatus::Converted,
            uploaded_at: "2024-01-01T00:00:00+00:00".into(),
            processed_at: None,
            content: None,
            metadata: Map::new(),
            error_message: None,
        }
    }

    fn dated(date: NaiveDate, position: usize) -> DatedMatch {
        DatedMatch {
            date,
            text: date.to_string(),
            position,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_was_extracted() {
        let contract = assemble(
            make_document(),
            &PatternMetadata::default(),
            Map::new(),
            &EntityScan::default(),
            &[],
        );
        assert_eq!(contract.contract_type, ContractType::Msa);
        assert_eq!(contract.contract_number, NOT_AVAILABLE);
        assert_eq!(contract.contract_name, "contract.md");
        assert_eq!(contract.client_name, NOT_AVAILABLE);
        assert_eq!(contract.vendor_name, NOT_AVAILABLE);
        assert_eq!(contract.currency, "USD");
        assert_eq!(contract.total_value, None);
        assert!(!contract.has_dates());
        assert_eq!(contract.confidence_score(), 0.0);
        assert!(contract.entities.contains_key("sections"));
        assert!(contract.entities.contains_key("extracted_entities"));
        assert!(contract.entities.contains_key("parsing_metadata"));
    }

    #[test]
    fn positional_dates_fill_effective_and_expiration() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let metadata = PatternMetadata {
            dates: vec![dated(start, 10), dated(end, 40)],
            ..PatternMetadata::default()
        };
        let contract = assemble(
            make_document(),
            &metadata,
            Map::new(),
            &EntityScan::default(),
            &[],
        );
        assert_eq!(contract.effective_date, Some(start));
        assert_eq!(contract.expiration_date, Some(end));
    }

    #[test]
    fn explicit_dates_beat_positional_ones() {
        let positional = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let explicit = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let metadata = PatternMetadata {
            dates: vec![dated(positional, 0), dated(positional, 5)],
            effective_date: Some(explicit),
            ..PatternMetadata::default()
        };
        let contract = assemble(
            make_document(),
            &metadata,
            Map::new(),
            &EntityScan::default(),
            &[],
        );
        assert_eq!(contract.effective_date, Some(explicit));
        assert_eq!(contract.expiration_date, Some(positional));
    }

    #[test]
    fn full_checklist_scores_one() {
        let metadata = PatternMetadata {
            title: Some("MSA".into()),
            contract_number: Some("MSA-1".into()),
            client_name: Some("A".into()),
            vendor_name: Some("B".into()),
            dates: vec![dated(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 0)],
            ..PatternMetadata::default()
        };
        let scan = EntityScan {
            key_clauses: vec!["vigência".into(), "pagamento".into(), "foro".into()],
            ..EntityScan::default()
        };
        let confidence = checklist_confidence(&metadata, 5, &scan);
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn reconciled_entities_land_in_entity_map() {
        let candidate = RawEntityCandidate {
            text: "TechCorp".into(),
            entity_type: EntityType::Supplier,
            start_pos: 0,
            end_pos: 8,
            confidence: 0.9,
            source: EntitySource::TokenModel,
        };
        let reconciled =
            vec![pactum_core::ReconciledEntity::from_candidate(candidate, "techcorp".into())];
        let contract = assemble(
            make_document(),
            &PatternMetadata::default(),
            Map::new(),
            &EntityScan::default(),
            &reconciled,
        );
        let list = &contract.entities["extracted_entities"]["reconciled"];
        assert_eq!(list.as_array().map(Vec::len), Some(1));
        assert_eq!(list[0]["normalized_text"], "techcorp");
        assert_eq!(list[0]["source"], "token-model");
    }

    #[test]
    fn empty_reconciliation_leaves_no_key() {
        let contract = assemble(
            make_document(),
            &PatternMetadata::default(),
            Map::new(),
            &EntityScan::default(),
            &[],
        );
        assert!(contract.entities["extracted_entities"]
            .get("reconciled")
            .is_none());
    }

    #[test]
    fn parsing_metadata_records_version_and_confidence() {
        let metadata = PatternMetadata {
            title: Some("MSA".into()),
            ..PatternMetadata::default()
        };
        let contract = assemble(
            make_document(),
            &metadata,
            Map::new(),
            &EntityScan::default(),
            &[],
        );
        let meta = &contract.entities["parsing_metadata"];
        assert_eq!(meta["parser_version"], PARSER_VERSION);
        let expected = 1.0 / 6.0;
        assert!((contract.confidence_score() - expected).abs() < 1e-9);
    }

    #[test]
    fn sample_contract_assembles_and_validates_cleanly() {
        let content = "\
# Master Service Agreement

**Contract Number:** MSA-2024-001
**Client:** TechCorp Inc.
**Vendor:** DevSolutions Ltd.
**Effective Date:** 01/01/2024
**Expiration Date:** 31/12/2025
**Total Value:** R$ 150.000,00
";
        let parsed = parse_markdown(content, Path::new("/tmp/msa.md"));
        let contract = parsed.into_contract(&[]);

        assert_eq!(contract.contract_number, "MSA-2024-001");
        assert_eq!(contract.contract_type, ContractType::Msa);
        assert_eq!(
            contract.effective_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            contract.expiration_date,
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        assert_eq!(contract.total_value, Some(150_000.0));
        assert_eq!(contract.currency, "R$");
        assert!((contract.confidence_score() - 0.7).abs() < 1e-9);

        let errors = validate_contract(&contract);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }
}
