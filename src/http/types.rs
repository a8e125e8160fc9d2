use serde::{Deserialize, Serialize};

/// JSON form of a processing request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub pdf_base64: Option<String>,
    #[serde(default)]
    pub output_mode: Option<String>,
    /// Original file name, used for bank detection when the text has no hint.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Query string accepted alongside a raw PDF body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessQuery {
    pub output_mode: Option<String>,
    pub filename: Option<String>,
}

/// Body of every 4xx/5xx that is not a processing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityStatus {
    pub pdf_extract: bool,
    pub pdftotext: bool,
    pub pdftoppm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: String,
    pub version: String,
    pub capabilities: CapabilityStatus,
    pub available_methods: Vec<String>,
    pub primary_engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_engine: Option<String>,
    pub max_pages: Option<usize>,
}
