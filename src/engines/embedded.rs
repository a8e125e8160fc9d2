// In-process text extraction backed by the `pdf-extract` crate.
// Keep this module small: it is the one engine every deployment has.

use std::panic::{self, AssertUnwindSafe};

use super::{EngineError, PageTexts, PdfSource, TextEngine};

const TAG: &str = "pdf_extract";

/// Extracts the text of every page of a PDF stored fully in memory.
/// This is a thin wrapper over the `pdf-extract` crate API, which may
/// panic on malformed documents instead of returning an error.
pub fn extract_pages_from_mem(bytes: &[u8]) -> Result<Vec<String>, EngineError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        ::pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(EngineError::Library {
            engine: TAG,
            message: e.to_string(),
        }),
        Err(_) => Err(EngineError::Panicked(TAG)),
    }
}

#[derive(Debug, Default)]
pub struct PdfExtractEngine;

impl PdfExtractEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TextEngine for PdfExtractEngine {
    fn tag(&self) -> &'static str {
        TAG
    }

    fn extract_pages(
        &self,
        source: &PdfSource<'_>,
        max_pages: Option<usize>,
    ) -> Result<PageTexts, EngineError> {
        // pdf-extract has no page range option, so the cap is applied after
        // the whole document was read.
        let mut pages = extract_pages_from_mem(source.bytes())?;
        let page_count = pages.len();
        if let Some(max) = max_pages {
            pages.truncate(max);
        }
        Ok(PageTexts { pages, page_count })
    }
}
