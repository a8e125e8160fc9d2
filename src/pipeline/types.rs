use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which streams a request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Text,
    Image,
    #[default]
    Hybrid,
}

impl OutputMode {
    pub fn wants_text(&self) -> bool {
        matches!(self, OutputMode::Text | OutputMode::Hybrid)
    }

    pub fn wants_image(&self) -> bool {
        matches!(self, OutputMode::Image | OutputMode::Hybrid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Text => "text",
            OutputMode::Image => "image",
            OutputMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputMode::Text),
            "image" => Ok(OutputMode::Image),
            "hybrid" => Ok(OutputMode::Hybrid),
            other => Err(format!(
                "Invalid output_mode '{}' (expected text, image or hybrid)",
                other
            )),
        }
    }
}

/// The JSON record returned for every processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub extracted_text: String,
    pub image_base64: String,
    pub metadata: ProcessingMetadata,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub page_count: usize,
    pub text_length: usize,
    pub has_text: bool,
    pub has_image: bool,
    pub found_keywords: Vec<String>,
    pub keyword_count: usize,
    pub processing_method: String,
    pub detected_bank: String,
}

impl Default for ProcessingMetadata {
    fn default() -> Self {
        Self {
            page_count: 0,
            text_length: 0,
            has_text: false,
            has_image: false,
            found_keywords: Vec::new(),
            keyword_count: 0,
            processing_method: "unknown".to_string(),
            detected_bank: String::new(),
        }
    }
}

impl Default for ProcessingResult {
    fn default() -> Self {
        Self {
            success: false,
            extracted_text: String::new(),
            image_base64: String::new(),
            metadata: ProcessingMetadata::default(),
            error: None,
        }
    }
}

impl ProcessingResult {
    /// Record for a document whose processing hit a hard failure.
    pub fn failure(message: impl Into<String>) -> Self {
        let mut result = Self::default();
        result.error = Some(message.into());
        result.metadata.processing_method = "error".to_string();
        result
    }
}
