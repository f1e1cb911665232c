//! File workflow: filename sanitization, standardized contract filing, the
//! reversible operation log, and retry bookkeeping for failed translations.

mod error;
pub mod oplog;
pub mod organize;
pub mod retry;
pub mod sanitize;

pub use error::FileError;
pub use oplog::{OperationLog, OPERATIONS_LOG_FILE};
pub use organize::{
    operation_kind, organized_filename, unique_destination, Organizer, PROCESSED_DIR,
};
pub use retry::{QueueStatus, ReprocessingQueue, RetryOutcome, RetryPolicy};
pub use sanitize::{clean_translated, fallback_map, sanitize_filename, split_for_translation};
