//! Labeled extraction history mined from Parquet.
//!
//! Rows are per-contract labels: a category (entity-type name) and the
//! phrase a reviewer confirmed for it. Aggregated per category, the
//! distinct phrases feed the domain pass so patterns grow with the
//! corpus instead of staying a hardcoded table.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pactum_core::EntityType;

use crate::error::ExtractError;

/// Categories to exclude from pattern mining (noise/placeholder values).
pub const EXCLUDE_CATEGORIES: &[&str] = &["UNKNOWN", "OTHER"];

/// Distinct confirmed phrases keyed by category name.
///
/// Categories and phrases are kept sorted, so mining the same file always
/// yields the same pattern order.
#[derive(Debug)]
pub struct HistoricalExamples {
    phrases: BTreeMap<String, Vec<String>>,
    total_rows: usize,
}

/// Summary statistics for a mined history file.
pub struct HistorySummary {
    pub total_rows: usize,
    pub distinct_categories: usize,
    pub distinct_phrases: usize,
}

impl HistoricalExamples {
    /// Read a labeled-history Parquet file.
    pub fn from_parquet(path: &Path) -> Result<Self, ExtractError> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches: Result<Vec<RecordBatch>, _> = reader.collect();
        Self::from_batches(&batches?)
    }

    /// Build from Arrow batches.
    ///
    /// Expects columns `category` and `phrase`; rows where either is null
    /// or the phrase is blank are skipped.
    pub fn from_batches(batches: &[RecordBatch]) -> Result<Self, ExtractError> {
        let mut sets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut total_rows = 0;

        for batch in batches {
            let category_col = batch
                .column_by_name("category")
                .ok_or_else(|| ExtractError::Other("missing 'category' column".into()))?;
            let phrase_col = batch
                .column_by_name("phrase")
                .ok_or_else(|| ExtractError::Other("missing 'phrase' column".into()))?;

            for row in 0..batch.num_rows() {
                total_rows += 1;
                let Some(category) = get_string(category_col.as_ref(), row) else {
                    continue;
                };
                let Some(phrase) = get_string(phrase_col.as_ref(), row) else {
                    continue;
                };
                if EXCLUDE_CATEGORIES.contains(&category.as_str()) {
                    continue;
                }
                let phrase = phrase.trim();
                if phrase.is_empty() {
                    continue;
                }
                sets.entry(category).or_default().insert(phrase.to_string());
            }
        }

        let phrases = sets
            .into_iter()
            .map(|(category, set)| (category, set.into_iter().collect()))
            .collect();
        Ok(Self {
            phrases,
            total_rows,
        })
    }

    /// Distinct phrases confirmed for a category, sorted.
    pub fn patterns_for(&self, category: &str) -> &[String] {
        self.phrases
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.phrases.keys().map(String::as_str)
    }

    /// Categories that map onto domain-pattern entity types, with their
    /// phrases, ready for [`crate::DomainPass::extend_patterns`].
    pub fn domain_patterns(&self) -> impl Iterator<Item = (EntityType, &[String])> {
        self.phrases.iter().filter_map(|(category, phrases)| {
            entity_type_for(category).map(|kind| (kind, phrases.as_slice()))
        })
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            total_rows: self.total_rows,
            distinct_categories: self.phrases.len(),
            distinct_phrases: self.phrases.values().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

/// Maps a history category name onto the entity type whose patterns it
/// extends. Only the domain-pass categories participate.
pub fn entity_type_for(category: &str) -> Option<EntityType> {
    match category {
        "CONTRACT_TYPE" => Some(EntityType::ContractType),
        "SERVICE_TYPE" => Some(EntityType::ServiceType),
        "BUSINESS_AREA" => Some(EntityType::BusinessArea),
        _ => None,
    }
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Build a test batch with the expected columns.
    fn test_batch(rows: &[(Option<&str>, Option<&str>, Option<&str>)]) -> RecordBatch {
        let text_arr = StringArray::from(rows.iter().map(|r| r.0).collect::<Vec<_>>());
        let category_arr = StringArray::from(rows.iter().map(|r| r.1).collect::<Vec<_>>());
        let phrase_arr = StringArray::from(rows.iter().map(|r| r.2).collect::<Vec<_>>());

        let schema = Schema::new(vec![
            Field::new("text", DataType::Utf8, true),
            Field::new("category", DataType::Utf8, true),
            Field::new("phrase", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(text_arr),
                Arc::new(category_arr),
                Arc::new(phrase_arr),
            ],
        )
        .unwrap()
    }

    fn write_parquet(dir: &TempDir, batch: &RecordBatch) -> std::path::PathBuf {
        let path = dir.path().join("history.parquet");
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn mines_distinct_phrases_per_category() {
        let batch = test_batch(&[
            (Some("doc a"), Some("CONTRACT_TYPE"), Some("Statement of Work")),
            (Some("doc b"), Some("CONTRACT_TYPE"), Some("Statement of Work")),
            (Some("doc c"), Some("CONTRACT_TYPE"), Some("Master Service Agreement")),
            (Some("doc d"), Some("SERVICE_TYPE"), Some("Cloud Hosting")),
        ]);
        let history = HistoricalExamples::from_batches(&[batch]).unwrap();

        assert_eq!(
            history.patterns_for("CONTRACT_TYPE"),
            ["Master Service Agreement", "Statement of Work"]
        );
        assert_eq!(history.patterns_for("SERVICE_TYPE"), ["Cloud Hosting"]);
        assert!(history.patterns_for("BUSINESS_AREA").is_empty());

        let summary = history.summary();
        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.distinct_categories, 2);
        assert_eq!(summary.distinct_phrases, 3);
    }

    #[test]
    fn excluded_and_null_rows_are_skipped() {
        let batch = test_batch(&[
            (None, Some("UNKNOWN"), Some("noise phrase")),
            (None, Some("OTHER"), Some("more noise")),
            (None, None, Some("orphan phrase")),
            (None, Some("SERVICE_TYPE"), None),
            (None, Some("SERVICE_TYPE"), Some("   ")),
            (None, Some("SERVICE_TYPE"), Some("Managed Services")),
        ]);
        let history = HistoricalExamples::from_batches(&[batch]).unwrap();

        assert_eq!(history.patterns_for("SERVICE_TYPE"), ["Managed Services"]);
        assert!(history.patterns_for("UNKNOWN").is_empty());
        assert_eq!(history.summary().distinct_phrases, 1);
        assert_eq!(history.summary().total_rows, 6);
    }

    #[test]
    fn missing_column_is_an_error() {
        let schema = Schema::new(vec![Field::new("category", DataType::Utf8, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["CONTRACT_TYPE"]))],
        )
        .unwrap();

        let err = HistoricalExamples::from_batches(&[batch]).unwrap_err();
        assert!(err.to_string().contains("phrase"));
    }

    #[test]
    fn round_trips_through_a_parquet_file() {
        let tmp = TempDir::new().unwrap();
        let batch = test_batch(&[
            (Some("doc"), Some("BUSINESS_AREA"), Some("Data Management")),
            (Some("doc"), Some("CONTRACT_TYPE"), Some("Framework Agreement")),
        ]);
        let path = write_parquet(&tmp, &batch);

        let history = HistoricalExamples::from_parquet(&path).unwrap();
        assert_eq!(history.patterns_for("BUSINESS_AREA"), ["Data Management"]);
        assert!(!history.is_empty());

        let kinds: Vec<EntityType> = history.domain_patterns().map(|(k, _)| k).collect();
        assert_eq!(kinds, [EntityType::BusinessArea, EntityType::ContractType]);
    }

    #[test]
    fn category_mapping_covers_domain_kinds_only() {
        assert_eq!(entity_type_for("CONTRACT_TYPE"), Some(EntityType::ContractType));
        assert_eq!(entity_type_for("SERVICE_TYPE"), Some(EntityType::ServiceType));
        assert_eq!(entity_type_for("BUSINESS_AREA"), Some(EntityType::BusinessArea));
        assert_eq!(entity_type_for("SUPPLIER"), None);
    }
}
