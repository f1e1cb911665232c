use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no JSON payload in model response")]
    MissingPayload,
}

impl AnalyzeError {
    /// Whether a retry could plausibly succeed: rate limits, server-side
    /// failures, and network-level timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            AnalyzeError::Server { status, .. } => *status == 429 || *status >= 500,
            AnalyzeError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
