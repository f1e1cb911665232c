//! Retry bookkeeping for failed filename translations.
//!
//! Failures recorded by [`sanitize_filename`](crate::sanitize_filename) are
//! parked in the injected [`QueueStore`] with a retry-after timestamp.
//! `retry_failed` reloads the queue, reattempts whatever is due, and marks
//! entries that exhausted their attempts as skipped.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use pactum_core::{TranslationRecord, TranslationStatus};
use pactum_remote::Translate;
use pactum_store::{QueueStore, StoreError};

use crate::sanitize::sanitize_filename;

/// Retry schedule for queued translations.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub retry_delay_hours: i64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_hours: 24,
        }
    }
}

/// Counts returned by one retry sweep.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RetryOutcome {
    pub successful: usize,
    pub still_failed: usize,
    pub errors: Vec<String>,
}

/// Snapshot of the queue by status.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct QueueStatus {
    pub total: usize,
    pub pending: usize,
    pub failed: usize,
    /// Failed entries whose retry-after has passed and that still have
    /// attempts left.
    pub retry_ready: usize,
}

/// The reprocessing queue: enqueue failures, retry them later.
pub struct ReprocessingQueue<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S: QueueStore> ReprocessingQueue<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Park a failed translation for a later attempt.
    pub fn enqueue(&self, record: &TranslationRecord) -> Result<(), StoreError> {
        let mut records = self.store.load()?;
        let mut queued = record.clone();
        queued.status = TranslationStatus::Failed;
        queued.retry_after = Some(Utc::now() + Duration::hours(self.policy.retry_delay_hours));
        info!(
            file = %queued.original_filename,
            delay_hours = self.policy.retry_delay_hours,
            "queued failed translation for retry"
        );
        records.push(queued);
        self.store.save(&records)
    }

    pub fn status(&self) -> Result<QueueStatus, StoreError> {
        let records = self.store.load()?;
        let now = Utc::now();
        let mut status = QueueStatus {
            total: records.len(),
            ..QueueStatus::default()
        };
        for record in &records {
            match record.status {
                TranslationStatus::Pending => status.pending += 1,
                TranslationStatus::Failed => status.failed += 1,
                _ => {}
            }
            if record.ready_for_retry(now, self.policy.max_attempts) {
                status.retry_ready += 1;
            }
        }
        Ok(status)
    }

    /// Retry every due entry once, persisting the updated queue.
    pub async fn retry_failed(
        &self,
        translator: Option<&dyn Translate>,
    ) -> Result<RetryOutcome, StoreError> {
        let mut records = self.store.load()?;
        let now = Utc::now();
        let mut outcome = RetryOutcome::default();

        for record in records.iter_mut() {
            if !record.ready_for_retry(now, self.policy.max_attempts) {
                continue;
            }
            record.attempts += 1;
            record.last_attempt = now;

            let attempt = sanitize_filename(&record.original_filename, translator).await;
            if attempt.status == TranslationStatus::Success {
                record.status = TranslationStatus::Success;
                record.translated_filename = attempt.translated_filename;
                record.error_message = None;
                record.retry_after = None;
                outcome.successful += 1;
                debug!(file = %record.original_filename, "retry succeeded");
            } else {
                record.status = TranslationStatus::Failed;
                record.error_message = attempt.error_message.clone();
                record.retry_after =
                    Some(now + Duration::hours(self.policy.retry_delay_hours));
                outcome.still_failed += 1;
                if let Some(message) = attempt.error_message {
                    outcome
                        .errors
                        .push(format!("{}: {message}", record.original_filename));
                }
                if record.attempts >= self.policy.max_attempts {
                    record.status = TranslationStatus::Skipped;
                    info!(
                        file = %record.original_filename,
                        attempts = record.attempts,
                        "max retries reached, skipping"
                    );
                }
            }
        }

        self.store.save(&records)?;
        Ok(outcome)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
