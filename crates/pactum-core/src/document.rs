//! Document lifecycle types shared by the conversion and parsing layers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Markdown,
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Converted,
    Analyzed,
    Error,
}

/// A source document as tracked through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub file_path: String,
    pub document_type: DocumentType,
    pub mime_type: String,
    /// Size of the source content in bytes.
    pub file_size: u64,
    pub status: DocumentStatus,
    /// ISO 8601 timestamp string.
    pub uploaded_at: String,
    pub processed_at: Option<String>,
    /// Leading excerpt of the extracted text, for quick inspection.
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub error_message: Option<String>,
}

/// Outcome of one external PDF-to-text conversion call.
///
/// Conversion itself runs out of process; this is only its return contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub markdown_content: Option<String>,
    pub json_content: Option<Value>,
    pub error_message: Option<String>,
    pub processing_time: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ConversionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        ConversionResult {
            success: false,
            markdown_content: None,
            json_content: None,
            error_message: Some(error.into()),
            processing_time: None,
            metadata: Map::new(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
