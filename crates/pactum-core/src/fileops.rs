//! File-organization records: translation tracking and reversible operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::ContractMetadata;

/// Status of one filename-translation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    Pending,
    Success,
    Failed,
    RetryReady,
    Skipped,
}

impl TranslationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationStatus::Pending => "pending",
            TranslationStatus::Success => "success",
            TranslationStatus::Failed => "failed",
            TranslationStatus::RetryReady => "retry_ready",
            TranslationStatus::Skipped => "skipped",
        }
    }
}

/// One filename-translation attempt, persisted in the reprocessing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub original_filename: String,
    pub translated_filename: String,
    pub status: TranslationStatus,
    pub error_message: Option<String>,
    /// Earliest time at which a retry may run.
    pub retry_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attempts: u32,
    pub last_attempt: DateTime<Utc>,
}

impl TranslationRecord {
    pub fn failed(
        original_filename: impl Into<String>,
        translated_filename: impl Into<String>,
        error: impl Into<String>,
        retry_after: DateTime<Utc>,
    ) -> Self {
        TranslationRecord {
            original_filename: original_filename.into(),
            translated_filename: translated_filename.into(),
            status: TranslationStatus::Failed,
            error_message: Some(error.into()),
            retry_after: Some(retry_after),
            attempts: 0,
            last_attempt: Utc::now(),
        }
    }

    /// Whether this record qualifies for another translation attempt.
    pub fn ready_for_retry(&self, now: DateTime<Utc>, max_attempts: u32) -> bool {
        self.status == TranslationStatus::Failed
            && self.retry_after.is_some_and(|t| now >= t)
            && self.attempts < max_attempts
    }
}

/// What a logged file operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// In-place rename; the original path is the backup.
    Rename,
    /// Copy under a translated name, leaving the original untouched.
    Translate,
    /// Full pipeline processing of a document.
    Process,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Rename => "rename",
            OperationKind::Translate => "translate",
            OperationKind::Process => "process",
        }
    }
}

/// Log entry for one reversible file operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOperation {
    /// ISO 8601 timestamp string.
    pub timestamp: String,
    pub operation: OperationKind,
    pub original_path: String,
    pub new_path: String,
    pub backup_path: Option<String>,
    #[serde(default)]
    pub metadata: Option<ContractMetadata>,
    pub reversible: bool,
    /// Integrity digest over timestamp, kind, and both paths.
    pub operation_hash: String,
}

impl FileOperation {
    /// Recomputes the digest this entry should carry.
    pub fn expected_hash(&self) -> String {
        operation_hash(
            &self.timestamp,
            self.operation.as_str(),
            &self.original_path,
            &self.new_path,
        )
    }
}

/// FNV-1a 64-bit digest of a string, as 16 lowercase hex characters.
pub fn fnv1a_hex(input: &str) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("{hash:016x}")
}

/// FNV-1a 64-bit digest over the concatenated operation fields.
pub fn operation_hash(
    timestamp: &str,
    operation: &str,
    original_path: &str,
    new_path: &str,
) -> String {
    fnv1a_hex(&format!("{timestamp}{operation}{original_path}{new_path}"))
}

// ── Tests ──────────────────────────────────────────────────────────────────
