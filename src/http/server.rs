use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get, MethodRouter},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument, Span};
use uuid::Uuid;

use super::error::{AppError, Result};
use super::request::decode_body;
use super::types::{CapabilityStatus, HealthResponse, ProcessQuery};
use crate::config::ServerConfig;
use crate::engines::TextEngineKind;
use crate::pipeline::Pipeline;

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>, request_timeout: Duration) -> Self {
        Self {
            pipeline,
            request_timeout,
        }
    }
}

pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    let fallback: MethodRouter = any(not_found).layer(cors.clone());

    Router::new()
        .route("/", pdf_routes(cors.clone()))
        // Path used by older clients
        .route("/api/process-pdf", pdf_routes(cors))
        .fallback_service(fallback)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// CorsLayer answers every OPTIONS request on its own, so it only wraps the
// methods registered before `.options(preflight)`.
fn pdf_routes(cors: CorsLayer) -> MethodRouter<AppState> {
    get(health)
        .post(process_pdf)
        .layer(cors)
        .options(preflight)
}

/// Binds the listener and serves until Ctrl-C.
pub async fn serve(pipeline: Arc<Pipeline>, config: &ServerConfig) -> anyhow::Result<()> {
    let state = AppState::new(pipeline, config.request_timeout);
    let app = create_router(state, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Capability report shared by `GET /` and the `capabilities` subcommand.
pub fn health_report(pipeline: &Pipeline) -> HealthResponse {
    let registry = pipeline.registry();
    let config = pipeline.config();

    HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        capabilities: CapabilityStatus {
            pdf_extract: registry.has_text_engine(TextEngineKind::PdfExtract),
            pdftotext: registry.has_text_engine(TextEngineKind::Pdftotext),
            pdftoppm: registry.raster_engine().is_some(),
        },
        available_methods: registry.available_methods(),
        primary_engine: config.primary.to_string(),
        secondary_engine: config.secondary.map(|kind| kind.to_string()),
        max_pages: config.max_pages,
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_report(&state.pipeline))
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOWED_METHODS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            ),
        ],
    )
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

async fn process_pdf(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProcessQuery>, QueryRejection>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let span = info_span!("process_pdf", request_id = %Uuid::new_v4());
    match handle_process(state, query, body).instrument(span).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn handle_process(
    state: AppState,
    query: std::result::Result<Query<ProcessQuery>, QueryRejection>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let Query(query) = query?;
    let request = decode_body(body?, &query)?;
    info!(
        size = request.pdf.len(),
        mode = %request.mode,
        filename = request.filename.as_deref().unwrap_or(""),
        "Accepted PDF"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let span = Span::current();
    let task = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        pipeline.process(&request.pdf, request.mode, request.filename.as_deref())
    });

    let result = match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => return Err(AppError::Internal(e.to_string())),
        Err(_) => return Err(AppError::Timeout(state.request_timeout)),
    };

    let status = if result.error.is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)).into_response())
}
