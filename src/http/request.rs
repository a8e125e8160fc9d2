// Decodes a POST body into the PDF bytes and processing options.

use axum::body::Bytes;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use super::error::{AppError, Result};
use super::types::{ProcessQuery, ProcessRequest};
use crate::pipeline::OutputMode;
use crate::utils::pdf::has_pdf_magic;

#[derive(Debug, Clone)]
pub struct DecodedRequest {
    pub pdf: Bytes,
    pub mode: OutputMode,
    pub filename: Option<String>,
}

/// Accepts either a raw PDF body or a JSON object carrying `pdf_base64`.
/// Anything that does not end up as bytes starting with `%PDF` is rejected.
pub fn decode_body(body: Bytes, query: &ProcessQuery) -> Result<DecodedRequest> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No data received".to_string()));
    }

    if has_pdf_magic(&body) {
        debug!("Raw PDF body, {} bytes", body.len());
        return Ok(DecodedRequest {
            pdf: body,
            mode: parse_mode(query.output_mode.as_deref())?,
            filename: query.filename.clone(),
        });
    }

    // Not a PDF, so it has to be a JSON object
    let value = match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) if value.is_object() => value,
        Ok(_) | Err(_) => return Err(invalid_pdf()),
    };
    let request: ProcessRequest = serde_json::from_value(value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request: {}", e)))?;

    let encoded = request
        .pdf_base64
        .as_deref()
        .map(strip_data_url)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("pdf_base64 is required".to_string()))?;

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let pdf = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AppError::BadRequest(format!("Invalid base64 in pdf_base64: {}", e)))?;

    if !has_pdf_magic(&pdf) {
        return Err(invalid_pdf());
    }

    let mode = parse_mode(
        request
            .output_mode
            .as_deref()
            .or(query.output_mode.as_deref()),
    )?;

    debug!("JSON body with {} PDF bytes", pdf.len());
    Ok(DecodedRequest {
        pdf: Bytes::from(pdf),
        mode,
        filename: request.filename.or_else(|| query.filename.clone()),
    })
}

fn parse_mode(raw: Option<&str>) -> Result<OutputMode> {
    match raw {
        None => Ok(OutputMode::default()),
        Some(raw) if raw.trim().is_empty() => Ok(OutputMode::default()),
        Some(raw) => raw.parse().map_err(AppError::BadRequest),
    }
}

/// Drops a `data:application/pdf;base64,` prefix if the client sent one.
fn strip_data_url(encoded: &str) -> &str {
    let trimmed = encoded.trim_start();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(";base64,") {
            return payload;
        }
    }
    encoded
}

fn invalid_pdf() -> AppError {
    AppError::BadRequest("Invalid PDF format".to_string())
}
