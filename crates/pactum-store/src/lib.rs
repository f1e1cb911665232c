//! Storage layer: LanceDB vector index (feature `lancedb`) and JSON-file
//! queue persistence for the filename-translation retry loop.

mod error;
pub use error::StoreError;

mod queue;
pub use queue::{JsonQueueStore, QueueStore, QUEUE_FILE};

#[cfg(feature = "lancedb")]
mod vector;
#[cfg(feature = "lancedb")]
pub use vector::{ContractIndex, IndexRecord, StoredContract};
