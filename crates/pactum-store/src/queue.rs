//! Persistence for the filename-translation retry queue.
//!
//! The queue is a plain list of [`TranslationRecord`]s; callers own the
//! retry policy and just need load/save. The trait seam lets the file
//! organizer run against any backing store.

use std::fs;
use std::path::{Path, PathBuf};

use pactum_core::TranslationRecord;
use tracing::debug;

use crate::StoreError;

/// Queue file name inside the store directory.
pub const QUEUE_FILE: &str = "translation_queue.json";

/// Persistence seam for the translation retry queue.
pub trait QueueStore {
    fn load(&self) -> Result<Vec<TranslationRecord>, StoreError>;
    fn save(&self, records: &[TranslationRecord]) -> Result<(), StoreError>;
}

/// JSON-file queue store; a missing file loads as an empty queue.
///
/// Saves go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous queue intact.
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    /// Store the queue under its conventional name inside `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(QUEUE_FILE),
        }
    }

    /// Store the queue at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> Result<Vec<TranslationRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, records: &[TranslationRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(records)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            count = records.len(),
            path = %self.path.display(),
            "saved translation queue"
        );
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
