// Flags win over environment variables, which win over defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::ArgMatches;
use tracing::warn;

use crate::engines::TextEngineKind;

/// How the extraction pipeline chooses and bounds its engines.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub primary: TextEngineKind,
    /// Tried when the primary engine yields no text.
    pub secondary: Option<TextEngineKind>,
    /// Pages read per document; `None` reads every page.
    pub max_pages: Option<usize>,
    /// Linear upscale of the rendered first page (1.0 = 72 DPI).
    pub raster_scale: f32,
    /// Wall-clock budget for each external tool invocation.
    pub step_timeout: Duration,
    /// Where scratch copies of the input are written; the system temp
    /// directory when unset.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary: TextEngineKind::PdfExtract,
            secondary: Some(TextEngineKind::Pdftotext),
            max_pages: Some(3),
            raster_scale: 2.0,
            step_timeout: Duration::from_secs(30),
            scratch_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(60),
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Builds settings from parsed arguments. Flags win over environment
    /// variables, which win over defaults.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let mut settings = Settings::default();
        let pipeline = &mut settings.pipeline;
        let server = &mut settings.server;

        if let Some(primary) = lookup::<TextEngineKind>(matches, "primary", "PDFSCAN_PRIMARY")? {
            pipeline.primary = primary;
        }
        if let Some(secondary) = lookup_raw(matches, "secondary", "PDFSCAN_SECONDARY") {
            pipeline.secondary = parse_optional_engine(&secondary)?;
        }
        if let Some(max_pages) = lookup::<usize>(matches, "max-pages", "PDFSCAN_MAX_PAGES")? {
            pipeline.max_pages = (max_pages > 0).then_some(max_pages);
        }
        if let Some(scale) = lookup::<f32>(matches, "raster-scale", "PDFSCAN_RASTER_SCALE")? {
            if !(scale > 0.0 && scale <= 8.0) {
                bail!("raster scale must be in (0, 8], got {}", scale);
            }
            pipeline.raster_scale = scale;
        }
        if let Some(secs) = lookup::<u64>(matches, "step-timeout", "PDFSCAN_STEP_TIMEOUT_SECS")? {
            pipeline.step_timeout = positive_secs(secs, "step timeout")?;
        }
        if let Some(dir) = lookup_raw(matches, "scratch-dir", "PDFSCAN_SCRATCH_DIR") {
            pipeline.scratch_dir = Some(PathBuf::from(dir));
        }

        if let Some(host) = lookup_raw(matches, "host", "PDFSCAN_HOST") {
            server.host = host;
        }
        if let Some(port) = lookup::<u16>(matches, "port", "PORT")? {
            server.port = port;
        }
        if let Some(secs) =
            lookup::<u64>(matches, "request-timeout", "PDFSCAN_REQUEST_TIMEOUT_SECS")?
        {
            server.request_timeout = positive_secs(secs, "request timeout")?;
        }
        if let Some(bytes) = lookup::<usize>(matches, "max-body-bytes", "PDFSCAN_MAX_BODY_BYTES")? {
            server.max_body_bytes = bytes;
        }

        if pipeline.secondary == Some(pipeline.primary) {
            warn!(
                "Secondary engine is the same as the primary ({}), fallback disabled",
                pipeline.primary
            );
            pipeline.secondary = None;
        }

        Ok(settings)
    }
}

fn parse_optional_engine(value: &str) -> Result<Option<TextEngineKind>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        other => other.parse().map(Some).map_err(|e: String| anyhow!(e)),
    }
}

fn positive_secs(secs: u64, what: &str) -> Result<Duration> {
    if secs == 0 {
        bail!("{} must be at least one second", what);
    }
    Ok(Duration::from_secs(secs))
}

/// Raw value of a flag if the command defines and sets it, otherwise of
/// the environment variable.
fn lookup_raw(matches: &ArgMatches, id: &str, env_var: &str) -> Option<String> {
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .cloned()
        .or_else(|| env::var(env_var).ok())
        .filter(|value| !value.trim().is_empty())
}

fn lookup<T>(matches: &ArgMatches, id: &str, env_var: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup_raw(matches, id, env_var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("{}", e))
            .with_context(|| format!("invalid value '{}' for --{} / {}", raw, id, env_var)),
        None => Ok(None),
    }
}
