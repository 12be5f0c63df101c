//! HTTP surface: an axum router over the rewriting library.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /` | [`routes::index`] |
//! | `GET /api/health` | [`routes::health_check`] |
//! | `POST /api/rewrite` | [`routes::rewrite_text_handler`] |
//! | `POST /api/rewrite-file` | [`routes::rewrite_file_handler`] |
//!
//! State is immutable and shared: the [`Rewriter`] (an `Arc`'d completion
//! service plus an `Arc`'d config). Requests never share mutable data.

pub mod error;
pub mod routes;

use crate::config::RewriteConfig;
use crate::pipeline::llm::CompletionService;
use crate::rewriter::Rewriter;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use routes::{RewriteFileResponse, RewriteTextRequest, RewriteTextResponse};

/// Slack on top of the upload cap for multipart framing and form fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared router state.
#[derive(Clone)]
pub struct AppState {
    pub rewriter: Rewriter,
}

impl AppState {
    pub fn new(service: Arc<dyn CompletionService>, config: RewriteConfig) -> Self {
        Self {
            rewriter: Rewriter::new(service, Arc::new(config)),
        }
    }
}

/// Build the application router with all routes and layers.
pub fn app(state: AppState) -> Router {
    let body_limit = state
        .rewriter
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/health", get(routes::health_check))
        .route("/api/rewrite", post(routes::rewrite_text_handler))
        .route("/api/rewrite-file", post(routes::rewrite_file_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
