pub mod classify;
pub mod keywords;
pub mod orchestrator;
pub mod types;

use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::engines::CapabilityRegistry;

use self::classify::{detect_bank_from_filename, detect_bank_from_text};
use self::keywords::find_keywords;
use self::orchestrator::{Extraction, Orchestrator};
pub use self::types::{OutputMode, ProcessingMetadata, ProcessingResult};

/// Extracted text shorter than this does not count as "has text".
pub const MIN_TEXT_LENGTH: usize = 50;
/// Base64 images shorter than this do not count as "has image".
pub const MIN_IMAGE_BASE64_LENGTH: usize = 1000;

/// Configuration plus the engines found at startup. Shared read-only by
/// every request.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: CapabilityRegistry,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, registry: CapabilityRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Processes one PDF. Never fails: hard failures come back as a record
    /// with `error` set.
    pub fn process(&self, bytes: &[u8], mode: OutputMode, filename: Option<&str>) -> ProcessingResult {
        info!(size = bytes.len(), %mode, "Processing PDF");

        let result = match Orchestrator::new(&self.config, &self.registry).extract(bytes, mode) {
            Ok(extraction) => assemble(extraction, filename),
            Err(e) => {
                error!("Error processing PDF: {}", e);
                ProcessingResult::failure(e.to_string())
            }
        };

        info!(
            success = result.success,
            method = %result.metadata.processing_method,
            "Processing completed"
        );
        result
    }
}

/// Derives keywords, bank, flags and the success bit from an extraction.
pub fn assemble(extraction: Extraction, filename: Option<&str>) -> ProcessingResult {
    let Extraction {
        text,
        page_count,
        method,
        image_base64,
    } = extraction;

    let found_keywords: Vec<String> = find_keywords(&text)
        .into_iter()
        .map(str::to_string)
        .collect();

    let bank = if text.is_empty() {
        None
    } else {
        detect_bank_from_text(&text)
    }
    .or_else(|| filename.and_then(detect_bank_from_filename));
    info!(bank = bank.map(|b| b.canonical_name()).unwrap_or("none"), "Detected bank");

    let text_length = text.chars().count();
    let has_text = text_length > MIN_TEXT_LENGTH;
    let has_image = image_base64.len() > MIN_IMAGE_BASE64_LENGTH;
    let keyword_count = found_keywords.len();

    ProcessingResult {
        success: has_text || has_image || keyword_count > 0,
        extracted_text: text,
        image_base64,
        metadata: ProcessingMetadata {
            page_count,
            text_length,
            has_text,
            has_image,
            found_keywords,
            keyword_count,
            processing_method: method,
            detected_bank: bank.map(|b| b.canonical_name().to_string()).unwrap_or_default(),
        },
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{EngineError, PageTexts, PdfSource, TextEngine, TextEngineKind};
    use crate::test_fixtures::minimal_pdf;

    fn extraction(text: &str, image_len: usize) -> Extraction {
        Extraction {
            text: text.to_string(),
            page_count: 1,
            method: "pdf_extract".to_string(),
            image_base64: "A".repeat(image_len),
        }
    }

    struct FixedText(&'static str);

    // Reads the scratch copy like the poppler engines do.
    struct FileBackedText;

    impl TextEngine for FileBackedText {
        fn tag(&self) -> &'static str {
            "file_backed"
        }

        fn needs_file(&self) -> bool {
            true
        }

        fn extract_pages(
            &self,
            source: &PdfSource<'_>,
            _max_pages: Option<usize>,
        ) -> Result<PageTexts, EngineError> {
            let text = std::fs::read_to_string(source.path(self.tag())?)?;
            Ok(PageTexts {
                pages: vec![text],
                page_count: 1,
            })
        }
    }

    impl TextEngine for FixedText {
        fn tag(&self) -> &'static str {
            "fixed"
        }

        fn extract_pages(
            &self,
            _source: &PdfSource<'_>,
            _max_pages: Option<usize>,
        ) -> Result<PageTexts, EngineError> {
            Ok(PageTexts {
                pages: vec![self.0.to_string()],
                page_count: 1,
            })
        }
    }

    #[test]
    fn test_long_text_alone_is_success() {
        let text = "x".repeat(MIN_TEXT_LENGTH + 1);
        let result = assemble(extraction(&text, 0), None);
        assert!(result.metadata.has_text);
        assert!(!result.metadata.has_image);
        assert_eq!(result.metadata.keyword_count, 0);
        assert!(result.success);
        assert_eq!(result.metadata.text_length, MIN_TEXT_LENGTH + 1);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let text = "x".repeat(MIN_TEXT_LENGTH);
        let result = assemble(extraction(&text, MIN_IMAGE_BASE64_LENGTH), None);
        assert!(!result.metadata.has_text);
        assert!(!result.metadata.has_image);
        assert!(!result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_image_alone_is_success() {
        let result = assemble(extraction("", MIN_IMAGE_BASE64_LENGTH + 1), None);
        assert!(result.metadata.has_image);
        assert!(result.success);
    }

    #[test]
    fn test_keyword_alone_is_success() {
        let result = assemble(extraction("solde", 0), None);
        assert_eq!(result.metadata.found_keywords, vec!["solde".to_string()]);
        assert_eq!(result.metadata.keyword_count, 1);
        assert!(result.success);
    }

    #[test]
    fn test_text_length_counts_characters() {
        let result = assemble(extraction("relevé €", 0), None);
        assert_eq!(result.metadata.text_length, 8);
    }

    #[test]
    fn test_keywords_are_substrings_of_text() {
        let text = "PAGE 1:\nBNP PARIBAS - Relevé de compte\nSolde créditeur 1 200,00 EUR\n\n";
        let result = assemble(extraction(text, 0), None);
        let lower = result.extracted_text.to_lowercase();
        assert_eq!(result.metadata.keyword_count, result.metadata.found_keywords.len());
        for keyword in &result.metadata.found_keywords {
            assert!(lower.contains(keyword.as_str()), "{keyword}");
        }
        assert_eq!(result.metadata.detected_bank, "BNP Paribas");
    }

    #[test]
    fn test_text_bank_wins_over_filename() {
        let result = assemble(extraction("HSBC France", 0), Some("revolut.pdf"));
        assert_eq!(result.metadata.detected_bank, "HSBC");
    }

    #[test]
    fn test_filename_used_when_text_has_no_bank() {
        let result = assemble(extraction("", 0), Some("Releve_Boursorama_2024.pdf"));
        assert_eq!(result.metadata.detected_bank, "Boursorama");
        let result = assemble(extraction("rien a signaler", 0), None);
        assert_eq!(result.metadata.detected_bank, "");
    }

    #[test]
    fn test_pipeline_extracts_minimal_pdf() {
        let registry = CapabilityRegistry::empty().with_text_engine(
            TextEngineKind::PdfExtract,
            Box::new(crate::engines::embedded::PdfExtractEngine::new()),
        );
        let pipeline = Pipeline::new(PipelineConfig::default(), registry);
        let result = pipeline.process(&minimal_pdf("Test Document"), OutputMode::Text, None);

        assert!(result.extracted_text.contains("Test Document"));
        assert!(result.extracted_text.starts_with("PAGE 1:\n"));
        assert_eq!(result.metadata.page_count, 1);
        assert_eq!(result.metadata.processing_method, "pdf_extract");
        assert!(result.image_base64.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let registry = CapabilityRegistry::probe(std::time::Duration::from_secs(30));
        let pipeline = Pipeline::new(PipelineConfig::default(), registry);
        let pdf = minimal_pdf("Releve de compte BNP Paribas - Solde");
        let first = pipeline.process(&pdf, OutputMode::Hybrid, Some("bnp.pdf"));
        let second = pipeline.process(&pdf, OutputMode::Hybrid, Some("bnp.pdf"));
        assert_eq!(first, second);
        assert_eq!(first.metadata.detected_bank, "BNP Paribas");
    }

    #[test]
    fn test_pipeline_with_fixed_engine() {
        let registry = CapabilityRegistry::empty()
            .with_text_engine(TextEngineKind::Pdftotext, Box::new(FixedText("Virement SEPA")));
        let pipeline = Pipeline::new(PipelineConfig::default(), registry);
        let result = pipeline.process(b"%PDF-1.7", OutputMode::Text, None);
        assert_eq!(result.metadata.processing_method, "fixed");
        assert_eq!(result.metadata.found_keywords, vec!["virement".to_string()]);
        assert!(result.success);
    }

    #[test]
    fn test_scratch_failure_yields_error_record() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            scratch_dir: Some(dir.path().join("gone")),
            ..PipelineConfig::default()
        };
        let registry = CapabilityRegistry::empty()
            .with_text_engine(TextEngineKind::PdfExtract, Box::new(FileBackedText));
        let result = Pipeline::new(config, registry).process(b"%PDF-1.7 solde", OutputMode::Text, None);

        assert!(!result.success);
        assert_eq!(result.metadata.processing_method, "error");
        assert!(result
            .error
            .as_deref()
            .is_some_and(|e| e.starts_with("failed to prepare scratch file")));
        assert!(result.extracted_text.is_empty());
    }

    #[test]
    fn test_file_backed_engine_reads_scratch_copy() {
        let registry = CapabilityRegistry::empty()
            .with_text_engine(TextEngineKind::PdfExtract, Box::new(FileBackedText));
        let pipeline = Pipeline::new(PipelineConfig::default(), registry);
        let result = pipeline.process(b"%PDF-1.7 solde", OutputMode::Text, None);
        assert!(result.error.is_none());
        assert_eq!(result.extracted_text, "PAGE 1:\n%PDF-1.7 solde\n\n");
        assert_eq!(result.metadata.processing_method, "file_backed");
    }
}
