//! The operation log: one JSON file listing every applied file operation.
//!
//! Entries carry an FNV-1a digest over their identifying fields, so the log
//! doubles as a tamper check for the organize workflow. Appends rewrite the
//! file through a temp-file rename, same as the translation queue.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use pactum_core::FileOperation;

use crate::FileError;

/// Log file name inside the output directory.
pub const OPERATIONS_LOG_FILE: &str = "operations_log.json";

/// Append-only JSON log of applied file operations.
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    /// Log under its conventional name inside `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(OPERATIONS_LOG_FILE),
        }
    }

    /// Log at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All logged operations; a missing file is an empty log.
    pub fn load(&self) -> Result<Vec<FileOperation>, FileError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn append(&self, operation: &FileOperation) -> Result<(), FileError> {
        let mut operations = self.load()?;
        operations.push(operation.clone());
        self.write(&operations)
    }

    /// Hashes of entries whose digest no longer matches their fields.
    pub fn verify(&self) -> Result<Vec<String>, FileError> {
        let mismatched = self
            .load()?
            .into_iter()
            .filter(|op| op.operation_hash != op.expected_hash())
            .map(|op| op.operation_hash)
            .collect();
        Ok(mismatched)
    }

    fn write(&self, operations: &[FileOperation]) -> Result<(), FileError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(operations)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            count = operations.len(),
            path = %self.path.display(),
            "saved operation log"
        );
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pactum_core::{operation_hash, OperationKind};
    use tempfile::TempDir;

    use super::*;

    fn operation(original: &str, new: &str) -> FileOperation {
        let timestamp = "2024-01-15T00:00:00+00:00".to_string();
        let digest = operation_hash(&timestamp, "rename", original, new);
        FileOperation {
            timestamp,
            operation: OperationKind::Rename,
            original_path: original.to_string(),
            new_path: new.to_string(),
            backup_path: None,
            metadata: None,
            reversible: true,
            operation_hash: digest,
        }
    }

    #[test]
    fn missing_log_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let log = OperationLog::new(tmp.path());
        assert!(log.load().unwrap().is_empty());
    }

    #[test]
    fn appends_accumulate_in_order() {
        let tmp = TempDir::new().unwrap();
        let log = OperationLog::new(tmp.path());

        log.append(&operation("/in/a.pdf", "/out/a.pdf")).unwrap();
        log.append(&operation("/in/b.pdf", "/out/b.pdf")).unwrap();

        let loaded = log.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].original_path, "/in/a.pdf");
        assert_eq!(loaded[1].original_path, "/in/b.pdf");
    }

    #[test]
    fn verify_flags_tampered_entries() {
        let tmp = TempDir::new().unwrap();
        let log = OperationLog::new(tmp.path());

        log.append(&operation("/in/a.pdf", "/out/a.pdf")).unwrap();
        let mut tampered = operation("/in/b.pdf", "/out/b.pdf");
        tampered.new_path = "/elsewhere/b.pdf".to_string();
        log.append(&tampered).unwrap();

        let bad = log.verify().unwrap();
        assert_eq!(bad, vec![tampered.operation_hash]);
    }

    #[test]
    fn round_trips_metadata_payload() {
        let tmp = TempDir::new().unwrap();
        let log = OperationLog::new(tmp.path());

        let mut op = operation("/in/契約書.pdf", "/out/Contract.pdf");
        op.backup_path = Some("/in/契約書.pdf".to_string());
        log.append(&op).unwrap();

        let loaded = log.load().unwrap();
        assert_eq!(loaded[0].backup_path.as_deref(), Some("/in/契約書.pdf"));
        assert!(loaded[0].reversible);
    }
}
