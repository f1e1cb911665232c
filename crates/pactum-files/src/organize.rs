//! Standardized contract filing.
//!
//! Analyzed contracts are renamed to
//! `{supplier}_{TYPE}_{years}_{id}.pdf` and filed under one directory per
//! supplier. ASCII originals are moved; non-ASCII originals are copied so
//! the untranslatable name survives as its own backup. Every applied change
//! is appended to the operation log with an integrity hash.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use pactum_core::{
    normalize_supplier_name, operation_hash, ContractMetadata, FileOperation, OperationKind,
};

use crate::oplog::OperationLog;
use crate::FileError;

/// Directory under the output root that holds the per-supplier folders.
pub const PROCESSED_DIR: &str = "processed_contracts";

/// Builds the standardized filename for an analyzed contract.
///
/// Unknown fields degrade to explicit placeholders rather than empty
/// segments, and the result is restricted to alphanumerics plus `._-`.
pub fn organized_filename(metadata: &ContractMetadata) -> String {
    let supplier = normalize_supplier_name(&metadata.supplier);

    let contract_type = if metadata.contract_type.is_empty() {
        "UNKNOWN".to_string()
    } else {
        metadata.contract_type.to_uppercase()
    };

    let year_range = if metadata.start_year.is_empty() {
        "UNKNOWN_PERIOD".to_string()
    } else if metadata.start_year == metadata.end_year {
        metadata.start_year.clone()
    } else {
        format!("{}_{}", metadata.start_year, metadata.end_year)
    };

    let mut contract_id: String = metadata
        .contract_id
        .chars()
        .map(|c| if c == ' ' || c == '/' || c == '-' { '_' } else { c })
        .collect();
    if contract_id.is_empty() || contract_id == "null" {
        contract_id = "UNKNOWN_ID".to_string();
    }

    let filename = format!("{supplier}_{contract_type}_{year_range}_{contract_id}.pdf");
    filename
        .chars()
        .filter(|c| c.is_alphanumeric() || "._-".contains(*c))
        .collect()
}

/// Decides how a file should be organized based on its current name.
pub fn operation_kind(filename: &str) -> OperationKind {
    if filename.is_ascii() {
        OperationKind::Rename
    } else {
        OperationKind::Translate
    }
}

/// First path under `dir` that does not collide with an existing file,
/// appending `_1`, `_2`, ... before the extension.
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let mut candidate = dir.join(filename);
    let mut counter = 1;
    while candidate.exists() {
        let next = match filename.rsplit_once('.') {
            Some((base, ext)) => format!("{base}_{counter}.{ext}"),
            None => format!("{filename}_{counter}"),
        };
        candidate = dir.join(next);
        counter += 1;
    }
    candidate
}

/// Files analyzed contracts into the output tree and keeps the log.
pub struct Organizer {
    output_dir: PathBuf,
    log: OperationLog,
}

impl Organizer {
    /// Organizer writing under `output_dir`, logging alongside it.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let log = OperationLog::new(&output_dir);
        Self { output_dir, log }
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Move or copy `source` to its standardized location.
    ///
    /// Renames move the file; translations copy it and record the original
    /// path as the backup. The returned entry has already been logged.
    pub fn organize(
        &self,
        source: &Path,
        metadata: &ContractMetadata,
    ) -> Result<FileOperation, FileError> {
        if !source.exists() {
            return Err(FileError::NotFound(source.to_path_buf()));
        }

        let original_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = operation_kind(&original_name);
        let filename = organized_filename(metadata);

        let supplier_dir = self
            .output_dir
            .join(PROCESSED_DIR)
            .join(normalize_supplier_name(&metadata.supplier));
        fs::create_dir_all(&supplier_dir)?;

        let destination = unique_destination(&supplier_dir, &filename);

        let backup_path = match kind {
            OperationKind::Translate => {
                fs::copy(source, &destination)?;
                Some(source.to_string_lossy().into_owned())
            }
            _ => {
                fs::rename(source, &destination)?;
                None
            }
        };

        let timestamp = Utc::now().to_rfc3339();
        let original_path = source.to_string_lossy().into_owned();
        let new_path = destination.to_string_lossy().into_owned();
        let digest = operation_hash(&timestamp, kind.as_str(), &original_path, &new_path);

        let operation = FileOperation {
            timestamp,
            operation: kind,
            original_path,
            new_path,
            backup_path,
            metadata: Some(metadata.clone()),
            reversible: true,
            operation_hash: digest,
        };
        self.log.append(&operation)?;

        info!(
            kind = kind.as_str(),
            from = %operation.original_path,
            to = %operation.new_path,
            "organized contract"
        );
        Ok(operation)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn metadata() -> ContractMetadata {
        ContractMetadata {
            contract_id: "MSA-2024-001".to_string(),
            contract_name: "Master Service Agreement".to_string(),
            contract_type: "MSA".to_string(),
            supplier: "TechCorp Solutions".to_string(),
            start_date: "2024-01-15".to_string(),
            end_date: "2026-12-31".to_string(),
            start_year: "2024".to_string(),
            end_year: "2026".to_string(),
            parties: vec!["TechCorp Solutions".to_string()],
            business_area: "Information Technology".to_string(),
            project_scope: "Managed services".to_string(),
            confidence: 0.9,
            extraction_method: "openai".to_string(),
        }
    }

    #[test]
    fn filename_combines_all_segments() {
        assert_eq!(
            organized_filename(&metadata()),
            "TechCorp_Solutions_MSA_2024_2026_MSA_2024_001.pdf"
        );
    }

    #[test]
    fn filename_placeholders_cover_missing_fields() {
        let mut m = metadata();
        m.contract_type = String::new();
        m.contract_id = "null".to_string();
        m.start_year = String::new();
        assert_eq!(
            organized_filename(&m),
            "TechCorp_Solutions_UNKNOWN_UNKNOWN_PERIOD_UNKNOWN_ID.pdf"
        );
    }

    #[test]
    fn filename_collapses_equal_years_and_drops_symbols() {
        let mut m = metadata();
        m.end_year = "2024".to_string();
        m.contract_type = "M&A".to_string();
        assert_eq!(
            organized_filename(&m),
            "TechCorp_Solutions_MA_2024_MSA_2024_001.pdf"
        );
    }

    #[test]
    fn open_ended_contracts_keep_the_placeholder_year() {
        let mut m = metadata();
        m.end_year = "2999".to_string();
        assert!(organized_filename(&m).contains("2024_2999"));
    }

    #[test]
    fn kind_follows_ascii_check() {
        assert_eq!(operation_kind("contract.pdf"), OperationKind::Rename);
        assert_eq!(operation_kind("契約書.pdf"), OperationKind::Translate);
    }

    #[test]
    fn collisions_get_numbered_suffixes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        fs::write(dir.path().join("a_1.pdf"), b"x").unwrap();

        let dest = unique_destination(dir.path(), "a.pdf");
        assert_eq!(dest, dir.path().join("a_2.pdf"));

        let fresh = unique_destination(dir.path(), "b.pdf");
        assert_eq!(fresh, dir.path().join("b.pdf"));
    }

    #[test]
    fn rename_moves_into_supplier_directory() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("old_contract.pdf");
        fs::write(&source, b"pdf bytes").unwrap();

        let organizer = Organizer::new(output.path());
        let op = organizer.organize(&source, &metadata()).unwrap();

        assert_eq!(op.operation, OperationKind::Rename);
        assert!(op.backup_path.is_none());
        assert!(!source.exists());

        let expected = output
            .path()
            .join(PROCESSED_DIR)
            .join("TechCorp_Solutions")
            .join("TechCorp_Solutions_MSA_2024_2026_MSA_2024_001.pdf");
        assert!(expected.exists());
        assert_eq!(op.operation_hash, op.expected_hash());

        let logged = organizer.log().load().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].new_path, op.new_path);
    }

    #[test]
    fn translate_copies_and_keeps_the_original() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let source = input.path().join("契約書.pdf");
        fs::write(&source, b"pdf bytes").unwrap();

        let organizer = Organizer::new(output.path());
        let op = organizer.organize(&source, &metadata()).unwrap();

        assert_eq!(op.operation, OperationKind::Translate);
        assert_eq!(op.backup_path.as_deref(), Some(source.to_str().unwrap()));
        assert!(source.exists());
        assert!(Path::new(&op.new_path).exists());
    }

    #[test]
    fn missing_source_is_reported() {
        let output = TempDir::new().unwrap();
        let organizer = Organizer::new(output.path());
        let missing = output.path().join("absent.pdf");

        let err = organizer.organize(&missing, &metadata()).unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
    }
}
