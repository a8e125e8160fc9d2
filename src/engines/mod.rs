// PDF capability providers, probed once at startup.

pub mod command;
pub mod embedded;
pub mod poppler;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use self::embedded::PdfExtractEngine;
use self::poppler::{PdftoppmEngine, PdftotextEngine};

/// Errors raised by a single engine invocation.
///
/// The orchestrator never propagates these; they only decide whether a
/// stream ends up empty.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("external tool not found: {0}")]
    ToolNotFound(&'static str),

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    TimedOut {
        tool: &'static str,
        timeout: Duration,
    },

    #[error("{0} panicked on this document")]
    Panicked(&'static str),

    #[error("{engine} failed: {message}")]
    Library {
        engine: &'static str,
        message: String,
    },

    #[error("{0} requires a scratch file but none was provided")]
    MissingScratch(&'static str),

    #[error("unexpected output: {0}")]
    InvalidOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The PDF handed to an engine: always the in-memory bytes, plus the path
/// of the scratch copy when one was materialized.
#[derive(Debug, Clone, Copy)]
pub struct PdfSource<'a> {
    bytes: &'a [u8],
    path: Option<&'a Path>,
}

impl<'a> PdfSource<'a> {
    pub fn new(bytes: &'a [u8], path: Option<&'a Path>) -> Self {
        Self { bytes, path }
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Path of the scratch copy, for engines that only read files.
    pub fn path(&self, engine: &'static str) -> Result<&'a Path, EngineError> {
        self.path.ok_or(EngineError::MissingScratch(engine))
    }
}

/// Text of the leading pages of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTexts {
    /// Text of pages 1..=n in order, already capped by the engine.
    pub pages: Vec<String>,
    /// Total number of pages in the document.
    pub page_count: usize,
}

pub trait TextEngine: Send + Sync {
    /// Method tag recorded in results.
    fn tag(&self) -> &'static str;

    /// Whether the engine reads the PDF from a file rather than memory.
    fn needs_file(&self) -> bool {
        false
    }

    /// Extracts at most `max_pages` pages (`None` means every page).
    fn extract_pages(
        &self,
        source: &PdfSource<'_>,
        max_pages: Option<usize>,
    ) -> Result<PageTexts, EngineError>;
}

pub trait RasterEngine: Send + Sync {
    fn tag(&self) -> &'static str;

    fn needs_file(&self) -> bool {
        false
    }

    /// Renders the first page to PNG bytes at `scale` times 72 DPI.
    fn render_first_page(&self, source: &PdfSource<'_>, scale: f32)
        -> Result<Vec<u8>, EngineError>;
}

/// Identifies a text engine in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextEngineKind {
    PdfExtract,
    Pdftotext,
}

impl TextEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextEngineKind::PdfExtract => "pdf_extract",
            TextEngineKind::Pdftotext => "pdftotext",
        }
    }
}

impl fmt::Display for TextEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextEngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "pdf_extract" => Ok(TextEngineKind::PdfExtract),
            "pdftotext" => Ok(TextEngineKind::Pdftotext),
            other => Err(format!(
                "unknown text engine '{}' (expected pdf_extract or pdftotext)",
                other
            )),
        }
    }
}

/// The set of engines available to this process.
#[derive(Default)]
pub struct CapabilityRegistry {
    text: BTreeMap<TextEngineKind, Box<dyn TextEngine>>,
    raster: Option<Box<dyn RasterEngine>>,
}

impl CapabilityRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Looks for every supported engine. `pdf-extract` is linked in and
    /// always present; the poppler tools depend on the host's `PATH`.
    pub fn probe(step_timeout: Duration) -> Self {
        let mut registry = Self::empty().with_text_engine(
            TextEngineKind::PdfExtract,
            Box::new(PdfExtractEngine::new()),
        );

        match PdftotextEngine::locate(step_timeout) {
            Some(engine) => {
                registry = registry.with_text_engine(TextEngineKind::Pdftotext, Box::new(engine));
            }
            None => debug!("pdftotext not found on PATH"),
        }

        match PdftoppmEngine::locate(step_timeout) {
            Some(engine) => registry = registry.with_raster_engine(Box::new(engine)),
            None => debug!("pdftoppm not found on PATH"),
        }

        info!(
            text_engines = ?registry.text_engine_tags(),
            raster_engine = registry.raster_engine().map(|e| e.tag()).unwrap_or("none"),
            "Capability probe finished"
        );
        registry
    }

    pub fn with_text_engine(mut self, kind: TextEngineKind, engine: Box<dyn TextEngine>) -> Self {
        self.text.insert(kind, engine);
        self
    }

    pub fn with_raster_engine(mut self, engine: Box<dyn RasterEngine>) -> Self {
        self.raster = Some(engine);
        self
    }

    pub fn text_engine(&self, kind: TextEngineKind) -> Option<&dyn TextEngine> {
        self.text.get(&kind).map(|engine| engine.as_ref())
    }

    pub fn raster_engine(&self) -> Option<&dyn RasterEngine> {
        self.raster.as_deref()
    }

    pub fn has_text_engine(&self, kind: TextEngineKind) -> bool {
        self.text.contains_key(&kind)
    }

    pub fn text_engine_tags(&self) -> Vec<&'static str> {
        self.text.values().map(|engine| engine.tag()).collect()
    }

    /// Method names advertised by the health probe.
    pub fn available_methods(&self) -> Vec<String> {
        let mut methods = Vec::new();
        if !self.text.is_empty() {
            methods.push("text_extraction".to_string());
        }
        if self.raster.is_some() {
            methods.push("image_conversion".to_string());
        }
        methods.extend(self.text.values().map(|e| format!("{}_text", e.tag())));
        if let Some(raster) = &self.raster {
            methods.push(format!("{}_image", raster.tag()));
        }
        methods
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("text", &self.text_engine_tags())
            .field("raster", &self.raster_engine().map(|e| e.tag()))
            .finish()
    }
}
