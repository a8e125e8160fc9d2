use std::time::Duration;

use axum::{
    extract::rejection::{BytesRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::types::ErrorBody;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("No route for {0}")]
    NotFound(String),

    #[error("PDF processing failed: {0}")]
    Internal(String),

    #[error("PDF processing did not finish within {0:?}")]
    Timeout(Duration),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) | AppError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::BadRequest(_) | AppError::PayloadTooLarge(_) | AppError::NotFound(_) => {
                tracing::info!("Rejected request: {}", self)
            }
            _ => tracing::error!("Handler error: {}", self),
        }

        let body = Json(ErrorBody {
            success: false,
            error: self.to_string(),
            status_code: status.as_u16(),
        });
        (status, body).into_response()
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(rejection.body_text()),
            status if status.is_client_error() => AppError::BadRequest(rejection.body_text()),
            _ => AppError::Internal(rejection.body_text()),
        }
    }
}
