// Engine errors and panics never escape this module. Only failing to write
// the scratch copy is reported to the caller.

use std::io::Write;
use std::path::Path;
use std::panic::{self, AssertUnwindSafe};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::engines::{
    CapabilityRegistry, EngineError, PageTexts, PdfSource, TextEngine, TextEngineKind,
};
use crate::pipeline::types::OutputMode;
use crate::utils::log_preview::text_preview;

/// Hard failures that abort processing of a document.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to prepare scratch file: {0}")]
    Scratch(#[source] std::io::Error),
}

/// What the engines produced for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub page_count: usize,
    pub method: String,
    pub image_base64: String,
}

pub struct Orchestrator<'a> {
    config: &'a PipelineConfig,
    registry: &'a CapabilityRegistry,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a PipelineConfig, registry: &'a CapabilityRegistry) -> Self {
        Self { config, registry }
    }

    pub fn extract(&self, bytes: &[u8], mode: OutputMode) -> Result<Extraction, PipelineError> {
        let primary = self.text_engine(Some(self.config.primary), mode);
        let secondary = self.text_engine(self.config.secondary, mode);
        let raster = self.registry.raster_engine().filter(|_| mode.wants_image());

        let needs_file = primary.is_some_and(|e| e.needs_file())
            || secondary.is_some_and(|e| e.needs_file())
            || raster.is_some_and(|e| e.needs_file());

        // Dropped at the end of this call, which deletes the file.
        let scratch = if needs_file {
            Some(write_scratch(bytes, self.config.scratch_dir.as_deref())?)
        } else {
            None
        };
        let source = PdfSource::new(bytes, scratch.as_ref().map(|f| f.path()));

        let mut text = String::new();
        let mut page_count = 0;
        let mut method = "unknown".to_string();

        if let Some(engine) = primary {
            let (primary_text, primary_pages) = self.run_text_engine(engine, &source);
            text = primary_text;
            page_count = primary_pages;
            method = engine.tag().to_string();
        }

        if text.is_empty() {
            if let Some(engine) = secondary {
                info!(engine = engine.tag(), "No text from primary engine, trying fallback");
                let (fallback_text, fallback_pages) = self.run_text_engine(engine, &source);
                if !fallback_text.is_empty() {
                    text = fallback_text;
                    page_count = fallback_pages;
                    method = engine.tag().to_string();
                }
            }
        }

        let mut image_base64 = String::new();
        if let Some(engine) = raster {
            let result = guarded(engine.tag(), || {
                engine.render_first_page(&source, self.config.raster_scale)
            });
            match result {
                Ok(png) => {
                    image_base64 = STANDARD.encode(png);
                    method.push_str("_with_");
                    method.push_str(engine.tag());
                    info!(
                        engine = engine.tag(),
                        base64_len = image_base64.len(),
                        "Rendered first page"
                    );
                }
                Err(e) => {
                    warn!(stage = "rasterization", engine = engine.tag(), "{}", e);
                }
            }
        }

        Ok(Extraction {
            text,
            page_count,
            method,
            image_base64,
        })
    }

    fn text_engine(
        &self,
        kind: Option<TextEngineKind>,
        mode: OutputMode,
    ) -> Option<&'a dyn TextEngine> {
        if !mode.wants_text() {
            return None;
        }
        let kind = kind?;
        let engine = self.registry.text_engine(kind);
        if engine.is_none() {
            debug!(engine = %kind, "Configured text engine is not available");
        }
        engine
    }

    /// Returns the formatted text and the page count, or empty output if
    /// the engine failed.
    fn run_text_engine(&self, engine: &dyn TextEngine, source: &PdfSource<'_>) -> (String, usize) {
        match guarded(engine.tag(), || {
            engine.extract_pages(source, self.config.max_pages)
        }) {
            Ok(pages) => {
                let text = format_pages(&pages, self.config.max_pages);
                info!(
                    engine = engine.tag(),
                    chars = text.chars().count(),
                    pages = pages.page_count,
                    "Text extracted"
                );
                debug!(preview = %text_preview(&text, 200, "..."), "Text preview");
                (text, pages.page_count)
            }
            Err(e) => {
                warn!(stage = "extraction", engine = engine.tag(), "{}", e);
                (String::new(), 0)
            }
        }
    }
}

/// Joins page texts as `PAGE {n}:\n{text}\n\n`, skipping blank pages.
pub fn format_pages(pages: &PageTexts, max_pages: Option<usize>) -> String {
    let limit = max_pages.unwrap_or(usize::MAX);
    let mut out = String::new();
    for (index, page) in pages.pages.iter().take(limit).enumerate() {
        if page.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("PAGE {}:\n{}\n\n", index + 1, page));
    }
    out
}

fn write_scratch(bytes: &[u8], dir: Option<&Path>) -> Result<NamedTempFile, PipelineError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pdfscan-").suffix(".pdf");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(PipelineError::Scratch)?;
    file.write_all(bytes).map_err(PipelineError::Scratch)?;
    file.flush().map_err(PipelineError::Scratch)?;
    Ok(file)
}

/// Runs an engine call, turning a panic into an error.
fn guarded<T>(
    engine: &'static str,
    call: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or(Err(EngineError::Panicked(engine)))
}
