//! Route handlers.

use super::error::ApiError;
use super::AppState;
use crate::batch::{rewrite_document, rewrite_text};
use crate::config::RewriteOptions;
use crate::output::{BatchStatistics, RewrittenSegment, TextRewrite};
use crate::pipeline::input::stage_upload;
use crate::pipeline::segment::FileType;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

/// Body of `POST /api/rewrite`.
#[derive(Debug, Default, Deserialize)]
pub struct RewriteTextRequest {
    pub text: Option<String>,
    pub temperature: Option<f32>,
    pub use_knowledge_base: Option<bool>,
}

/// Successful `POST /api/rewrite` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RewriteTextResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: TextRewrite,
}

/// Successful `POST /api/rewrite-file` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RewriteFileResponse {
    pub success: bool,
    pub filename: String,
    pub file_type: FileType,
    pub segments: Vec<RewrittenSegment>,
    pub total_segments: usize,
    pub statistics: BatchStatistics,
}

/// `GET /`
pub async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "Paper rewrite API",
        "endpoints": {
            "health": "GET /api/health",
            "rewrite_text": "POST /api/rewrite",
            "rewrite_file": "POST /api/rewrite-file",
        },
    }))
}

/// `GET /api/health`
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "paper-rewrite",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `POST /api/rewrite`
///
/// The body is parsed by hand so that malformed JSON gets the same error
/// envelope as every other bad request.
pub async fn rewrite_text_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<RewriteTextResponse>, ApiError> {
    let body = body?;
    let request: RewriteTextRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RewriteTextRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?
    };

    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required field 'text'".into()))?;

    let defaults = state.rewriter.config().default_options();
    let options = RewriteOptions {
        temperature: request.temperature.unwrap_or(defaults.temperature),
        use_knowledge_base: request
            .use_knowledge_base
            .unwrap_or(defaults.use_knowledge_base),
    };

    info!(
        "Rewrite text: {} chars, temperature {}, knowledge base {}",
        text.chars().count(),
        options.temperature,
        options.use_knowledge_base
    );
    let result = rewrite_text(&state.rewriter, &text, &options).await?;

    Ok(Json(RewriteTextResponse {
        success: true,
        result,
    }))
}

/// A validated multipart upload.
struct FileUpload {
    filename: String,
    file_type: FileType,
    data: Bytes,
}

/// `POST /api/rewrite-file`
pub async fn rewrite_file_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RewriteFileResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut upload: Option<FileUpload> = None;
    let mut temperature: Option<String> = None;
    let mut use_knowledge_base: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|f| !f.trim().is_empty())
                    .ok_or_else(|| ApiError::BadRequest("No file selected".into()))?;
                // Reject before reading the body so unsupported uploads never
                // reach staging or segmentation.
                let file_type = FileType::from_filename(&filename)?;
                let data = field.bytes().await?;
                upload = Some(FileUpload {
                    filename,
                    file_type,
                    data,
                });
            }
            Some("temperature") => temperature = Some(field.text().await?),
            Some("use_knowledge_base") => use_knowledge_base = Some(field.text().await?),
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;
    let max_bytes = state.rewriter.config().max_upload_bytes;
    if upload.data.len() > max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File is {} bytes, the limit is {} bytes",
            upload.data.len(),
            max_bytes
        )));
    }
    let options = parse_form_options(
        temperature.as_deref(),
        use_knowledge_base.as_deref(),
        state.rewriter.config().default_options(),
    )?;
    options.validate()?;

    info!(
        "Rewrite file '{}' ({}, {} bytes), temperature {}, knowledge base {}",
        upload.filename,
        upload.file_type,
        upload.data.len(),
        options.temperature,
        options.use_knowledge_base
    );

    let staged = stage_upload(&upload.data, upload.file_type).await?;
    let result = rewrite_document(&state.rewriter, staged.path(), staged.file_type(), &options).await;
    drop(staged);
    let document = result.map_err(|e| ApiError::from(e).about(&upload.filename))?;

    Ok(Json(RewriteFileResponse {
        success: true,
        filename: upload.filename,
        file_type: upload.file_type,
        total_segments: document.segments.len(),
        segments: document.segments,
        statistics: document.statistics,
    }))
}

/// Interpret the optional text form fields.
///
/// A blank `temperature` means "use the default". `use_knowledge_base` is
/// true only for a case-insensitive `"true"`.
fn parse_form_options(
    temperature: Option<&str>,
    use_knowledge_base: Option<&str>,
    defaults: RewriteOptions,
) -> Result<RewriteOptions, ApiError> {
    let temperature = match temperature.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => raw
            .parse::<f32>()
            .map_err(|_| ApiError::BadRequest(format!("Invalid temperature '{raw}'")))?,
        None => defaults.temperature,
    };
    let use_knowledge_base = match use_knowledge_base {
        Some(raw) => raw.trim().eq_ignore_ascii_case("true"),
        None => defaults.use_knowledge_base,
    };
    Ok(RewriteOptions {
        temperature,
        use_knowledge_base,
    })
}
