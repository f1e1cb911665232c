use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding has {got} dimensions, index expects {want}")]
    DimensionMismatch { got: usize, want: usize },

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] lancedb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
