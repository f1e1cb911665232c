//! Parsing entry points for converted contract documents.
//!
//! Two input shapes are supported: markdown produced by PDF conversion, and
//! the converter's block-structured JSON (`blocks[].{type, text}`). Both
//! yield a [`ParsedDocument`] holding the source [`Document`] record plus
//! everything the pattern layer could extract.

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde_json::{Map, Value};

use pactum_core::{
    fnv1a_hex, Contract, Document, DocumentStatus, DocumentType, ReconciledEntity,
};

use crate::assemble::assemble;
use crate::error::ParseError;
use crate::patterns::{self, EntityScan, PatternMetadata, TableStats};
use crate::sections::{sections_from_blocks, sections_from_markdown};

/// One parsed document, ready for entity reconciliation and assembly.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub document: Document,
    pub metadata: PatternMetadata,
    pub sections: Map<String, Value>,
    pub scan: EntityScan,
}

impl ParsedDocument {
    /// Assembles the final contract, folding reconciled entity-extractor
    /// output into the entity map.
    pub fn into_contract(self, reconciled: &[ReconciledEntity]) -> Contract {
        assemble(
            self.document,
            &self.metadata,
            self.sections,
            &self.scan,
            reconciled,
        )
    }
}

/// Parses markdown contract content. Extraction is best-effort and never
/// fails; missing fields surface as assembler defaults.
pub fn parse_markdown(content: &str, source: &Path) -> ParsedDocument {
    let metadata = patterns::extract_metadata(content);
    let sections = sections_from_markdown(content);
    let scan = patterns::scan_text(content);
    let document = make_document(source, content);
    ParsedDocument {
        document,
        metadata,
        sections,
        scan,
    }
}

pub fn parse_markdown_file(path: &Path) -> Result<ParsedDocument, ParseError> {
    let content = fs::read_to_string(path)?;
    Ok(parse_markdown(&content, path))
}

/// Parses a block-structured document. Field extraction walks the blocks:
/// the first non-empty heading becomes the title, and each paragraph is
/// scanned for whichever fields are still missing.
pub fn parse_json_value(data: &Value, source: &Path) -> ParsedDocument {
    let blocks = data
        .get("blocks")
        .and_then(Value::as_array)
        .map(Vec::as_slice);

    let mut metadata = blocks.map(metadata_from_blocks).unwrap_or_default();
    if metadata.contract_type.is_none() {
        metadata.contract_type = patterns::detect_contract_type(&data.to_string());
    }

    let sections = blocks.map(sections_from_blocks).unwrap_or_default();
    let scan = blocks.map(scan_blocks).unwrap_or_default();
    let document = make_document(source, &data.to_string());
    ParsedDocument {
        document,
        metadata,
        sections,
        scan,
    }
}

pub fn parse_json_file(path: &Path) -> Result<ParsedDocument, ParseError> {
    let raw = fs::read_to_string(path)?;
    let data: Value = serde_json::from_str(&raw)?;
    Ok(parse_json_value(&data, path))
}

fn metadata_from_blocks(blocks: &[Value]) -> PatternMetadata {
    let mut metadata = PatternMetadata::default();

    for block in blocks {
        let text = block.get("text").and_then(Value::as_str).unwrap_or("");
        match block.get("type").and_then(Value::as_str) {
            Some("heading") => {
                if metadata.title.is_none() {
                    let title = text.trim();
                    if !title.is_empty() {
                        metadata.title = Some(title.to_string());
                    }
                }
            }
            Some("paragraph") => {
                if metadata.contract_number.is_none() {
                    metadata.contract_number = patterns::contract_number_plain(text);
                }
                if metadata.currency.is_none() {
                    metadata.currency = patterns::extract_currency(text);
                }
                if metadata.dates.is_empty() {
                    metadata.dates = patterns::extract_dates(text);
                }
                if metadata.client_name.is_none() || metadata.vendor_name.is_none() {
                    let (client, vendor) = patterns::extract_parties(text);
                    // A later paragraph that names both parties replaces
                    // whichever side an earlier one already supplied.
                    if client.is_some() {
                        metadata.client_name = client;
                    }
                    if vendor.is_some() {
                        metadata.vendor_name = vendor;
                    }
                }
            }
            _ => {}
        }
    }

    metadata
}

fn scan_blocks(blocks: &[Value]) -> EntityScan {
    let content = blocks
        .iter()
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut scan = patterns::scan_shared(&content);

    let table_blocks: Vec<&Value> = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("table"))
        .collect();
    if !table_blocks.is_empty() {
        scan.tables = Some(TableStats {
            count: table_blocks.len(),
            has_headers: None,
            has_content: Some(table_blocks.iter().any(|b| {
                b.get("text")
                    .and_then(Value::as_str)
                    .is_some_and(|t| !t.is_empty())
            })),
        });
    }
    scan
}

fn make_document(source: &Path, content: &str) -> Document {
    let is_markdown = source.extension().is_some_and(|e| e == "md");
    let (document_type, mime_type) = if is_markdown {
        (DocumentType::Markdown, "text/markdown")
    } else {
        (DocumentType::Json, "application/json")
    };

    let path_str = source.display().to_string();
    let mut metadata = Map::new();
    metadata.insert("source".into(), Value::String("conversion".into()));
    metadata.insert("parser".into(), Value::String("pactum-parse".into()));

    Document {
        // Stable across runs so re-parsing a file yields the same record.
        id: fnv1a_hex(&path_str),
        filename: source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path_str.clone()),
        file_path: path_str,
        document_type,
        mime_type: mime_type.to_string(),
        file_size: content.len() as u64,
        status: DocumentStatus::Converted,
        uploaded_at: Utc::now().to_rfc3339(),
        processed_at: None,
        content: Some(content.chars().take(1000).collect()),
        metadata,
        error_message: None,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
