//! HTTP error envelope.
//!
//! Every failure leaves the server as `{"success": false, "error": "..."}`
//! with a status chosen from the error's origin: caller mistakes are 400,
//! oversized uploads 413, everything else 500.

use crate::error::PaperRewriteError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid input.
    BadRequest(String),
    /// Upload exceeds the configured cap.
    PayloadTooLarge(String),
    /// Processing failed on the server side.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Prefix the message with what it is about, e.g. the uploaded filename.
    pub fn about(self, subject: &str) -> Self {
        match self {
            ApiError::BadRequest(m) => ApiError::BadRequest(format!("{subject}: {m}")),
            ApiError::PayloadTooLarge(m) => ApiError::PayloadTooLarge(format!("{subject}: {m}")),
            ApiError::Internal(m) => ApiError::Internal(format!("{subject}: {m}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(m) | ApiError::PayloadTooLarge(m) => {
                warn!("Rejected request ({}): {}", status.as_u16(), m);
                m
            }
            ApiError::Internal(m) => {
                error!("Request failed: {}", m);
                m
            }
        };
        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<PaperRewriteError> for ApiError {
    fn from(err: PaperRewriteError) -> Self {
        if err.is_client_error() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!("Upload too large: {}", err.body_text()))
        } else {
            ApiError::BadRequest(format!("Failed to read multipart form: {}", err.body_text()))
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!(
            "Expected a multipart/form-data upload: {}",
            rejection.body_text()
        ))
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(format!("Request body too large: {}", rejection.body_text()))
        } else {
            ApiError::BadRequest(format!("Failed to read request body: {}", rejection.body_text()))
        }
    }
}
