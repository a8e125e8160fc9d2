// Engines backed by the poppler command line tools. They read the scratch
// copy of the input and are only registered when found on PATH.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use super::command::run_with_timeout;
use super::{EngineError, PageTexts, PdfSource, RasterEngine, TextEngine};

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

static PAGES_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").expect("valid pdfinfo regex"));

/// Parses the `Pages:` line of `pdfinfo` output.
pub fn parse_pdfinfo_pages(output: &str) -> Option<usize> {
    PAGES_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Splits `pdftotext` output into pages. Every page, including the last,
/// is terminated by a form feed.
pub fn split_pages(output: &str) -> Vec<String> {
    let mut pages: Vec<String> = output.split('\u{000C}').map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

pub struct PdftotextEngine {
    pdftotext: PathBuf,
    pdfinfo: Option<PathBuf>,
    timeout: Duration,
}

impl PdftotextEngine {
    pub fn locate(timeout: Duration) -> Option<Self> {
        let pdftotext = which::which("pdftotext").ok()?;
        let pdfinfo = which::which("pdfinfo").ok();
        if pdfinfo.is_none() {
            debug!("pdfinfo not found, page counts will come from pdftotext output");
        }
        Some(Self {
            pdftotext,
            pdfinfo,
            timeout,
        })
    }

    fn page_count(&self, source: &PdfSource<'_>) -> Option<usize> {
        let pdfinfo = self.pdfinfo.as_ref()?;
        let mut cmd = Command::new(pdfinfo);
        cmd.arg(source.path("pdfinfo").ok()?);
        match run_with_timeout(cmd, "pdfinfo", self.timeout) {
            Ok(out) => parse_pdfinfo_pages(&String::from_utf8_lossy(&out)),
            Err(e) => {
                debug!("pdfinfo failed: {}", e);
                None
            }
        }
    }
}

impl TextEngine for PdftotextEngine {
    fn tag(&self) -> &'static str {
        "pdftotext"
    }

    fn needs_file(&self) -> bool {
        true
    }

    fn extract_pages(
        &self,
        source: &PdfSource<'_>,
        max_pages: Option<usize>,
    ) -> Result<PageTexts, EngineError> {
        let path = source.path(self.tag())?;

        let mut cmd = Command::new(&self.pdftotext);
        cmd.args(["-enc", "UTF-8", "-f", "1"]);
        if let Some(max) = max_pages {
            cmd.arg("-l").arg(max.max(1).to_string());
        }
        cmd.arg(path).arg("-");

        let out = run_with_timeout(cmd, "pdftotext", self.timeout)?;
        let mut pages = split_pages(&String::from_utf8_lossy(&out));
        if let Some(max) = max_pages {
            pages.truncate(max);
        }
        let page_count = self.page_count(source).unwrap_or(pages.len());

        Ok(PageTexts { pages, page_count })
    }
}

pub struct PdftoppmEngine {
    pdftoppm: PathBuf,
    timeout: Duration,
}

impl PdftoppmEngine {
    pub fn locate(timeout: Duration) -> Option<Self> {
        which::which("pdftoppm")
            .ok()
            .map(|pdftoppm| Self { pdftoppm, timeout })
    }
}

impl RasterEngine for PdftoppmEngine {
    fn tag(&self) -> &'static str {
        "pdftoppm"
    }

    fn needs_file(&self) -> bool {
        true
    }

    fn render_first_page(
        &self,
        source: &PdfSource<'_>,
        scale: f32,
    ) -> Result<Vec<u8>, EngineError> {
        let path = source.path(self.tag())?;
        let output_dir = tempfile::Builder::new().prefix("pdfscan-raster-").tempdir()?;
        let output_prefix = output_dir.path().join("page");
        let dpi = (72.0 * scale).round().max(1.0) as u32;

        let mut cmd = Command::new(&self.pdftoppm);
        cmd.args(["-png", "-singlefile", "-f", "1", "-l", "1", "-r"])
            .arg(dpi.to_string())
            .arg(path)
            .arg(&output_prefix);
        run_with_timeout(cmd, "pdftoppm", self.timeout)?;

        // -singlefile writes <prefix>.png without a page suffix
        let png = fs::read(output_prefix.with_extension("png"))?;
        if !png.starts_with(PNG_SIGNATURE) {
            return Err(EngineError::InvalidOutput(
                "pdftoppm did not produce a PNG".to_string(),
            ));
        }
        Ok(png)
    }
}
