//! Integration tests for the HTTP API, driven through the router with a
//! scripted completion service in place of the real endpoint.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use paper_rewrite::server::{ErrorResponse, RewriteFileResponse, RewriteTextResponse};
use paper_rewrite::{
    app, AppState, CompletionError, CompletionRequest, CompletionService, FileType, RewriteConfig,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

const BOUNDARY: &str = "----paper-rewrite-boundary";

/// Prefixes the paragraph with "改写：". Paragraphs containing "FAIL"
/// fail permanently.
struct MockService {
    calls: AtomicUsize,
    last_temperature: std::sync::Mutex<Option<f32>>,
}

impl MockService {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            last_temperature: std::sync::Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_temperature.lock().unwrap() = Some(request.temperature);
        let paragraph = request.prompt.rsplit("'''").nth(1).unwrap_or_default();
        if paragraph.contains("FAIL") {
            return Err(CompletionError::Api {
                status: 400,
                detail: "upstream rejected the paragraph".into(),
            });
        }
        Ok(format!("'''改写：{paragraph}'''"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("paper_rewrite=debug"))
        .with_test_writer()
        .try_init();
}

fn test_app(service: Arc<MockService>) -> Router {
    init_tracing();
    let config = RewriteConfig::builder()
        .api_key("test-key")
        .retry_backoff_ms(1)
        .knowledge_base_path("/nonexistent/writing_style_knowledge.txt")
        .max_upload_bytes(1024)
        .build()
        .unwrap();
    app(AppState::new(service, config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a multipart body with one optional file part and extra text fields.
fn multipart_request(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    if let Some((filename, data)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .uri("/api/rewrite-file")
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ── Service endpoints ────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check_endpoint() {
    let response = test_app(MockService::new())
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_index_lists_endpoints() {
    let response = test_app(MockService::new())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["endpoints"]["rewrite_file"]
        .as_str()
        .unwrap()
        .contains("/api/rewrite-file"));
}

// ── POST /api/rewrite ────────────────────────────────────────────────────

#[tokio::test]
async fn test_rewrite_text_success() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(json_request("/api/rewrite", json!({ "text": "这是一个测试段落。" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let resp: RewriteTextResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(resp.success);
    assert_eq!(resp.result.original_text, "这是一个测试段落。");
    assert_eq!(resp.result.rewritten_text, "改写：这是一个测试段落。");
    assert_eq!(resp.result.original_length, 9);
    assert_eq!(
        resp.result.rewritten_length,
        resp.result.rewritten_text.chars().count()
    );
    assert_eq!(service.calls(), 1);
    assert_eq!(*service.last_temperature.lock().unwrap(), Some(0.5));
}

#[tokio::test]
async fn test_rewrite_text_passes_temperature() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(json_request(
            "/api/rewrite",
            json!({ "text": "段落", "temperature": 0.9, "use_knowledge_base": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*service.last_temperature.lock().unwrap(), Some(0.9));
}

#[tokio::test]
async fn test_rewrite_text_missing_or_blank() {
    for body in [json!({}), json!({ "text": "" }), json!({ "text": "   \n" })] {
        let service = MockService::new();
        let response = test_app(service.clone())
            .oneshot(json_request("/api/rewrite", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let err: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!err.success);
        assert!(!err.error.is_empty());
        assert_eq!(service.calls(), 0);
    }
}

#[tokio::test]
async fn test_rewrite_text_malformed_json() {
    let request = Request::builder()
        .uri("/api/rewrite")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app(MockService::new()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_rewrite_text_out_of_range_temperature() {
    let response = test_app(MockService::new())
        .oneshot(json_request(
            "/api/rewrite",
            json!({ "text": "段落", "temperature": 3.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rewrite_text_service_failure_is_500() {
    let response = test_app(MockService::new())
        .oneshot(json_request("/api/rewrite", json!({ "text": "please FAIL" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("upstream rejected the paragraph"));
}

// ── POST /api/rewrite-file ───────────────────────────────────────────────

#[tokio::test]
async fn test_rewrite_file_three_paragraph_txt() {
    let text = "第一段内容。\n\n第二段内容。\n\n第三段内容。";
    let response = test_app(MockService::new())
        .oneshot(multipart_request(Some(("paper.txt", text.as_bytes())), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let resp: RewriteFileResponse = serde_json::from_slice(&bytes).unwrap();
    assert!(resp.success);
    assert_eq!(resp.filename, "paper.txt");
    assert_eq!(resp.file_type, FileType::Txt);
    assert_eq!(resp.total_segments, 3);

    let indices: Vec<usize> = resp.segments.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(resp.segments[0].original, "第一段内容。");
    assert_eq!(resp.segments[2].rewritten, "改写：第三段内容。");
    assert!(resp.segments.iter().all(|s| s.page.is_none()));

    let total_original: usize = resp.segments.iter().map(|s| s.original_length).sum();
    let total_rewritten: usize = resp.segments.iter().map(|s| s.rewritten_length).sum();
    assert_eq!(resp.statistics.total_original_length, total_original);
    assert_eq!(resp.statistics.total_rewritten_length, total_rewritten);
    assert_eq!(
        resp.statistics.length_change,
        total_rewritten as i64 - total_original as i64
    );
}

#[tokio::test]
async fn test_rewrite_file_markdown_uppercase_extension() {
    let response = test_app(MockService::new())
        .oneshot(multipart_request(
            Some(("NOTES.MD", "# 标题\n\n正文。".as_bytes())),
            &[("use_knowledge_base", "false")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["file_type"], "md");
    assert_eq!(json["total_segments"], 2);
}

#[tokio::test]
async fn test_rewrite_file_unsupported_extension() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(multipart_request(Some(("figure.png", b"\x89PNG\r\n")), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("png"));
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_rewrite_file_missing_file() {
    let response = test_app(MockService::new())
        .oneshot(multipart_request(None, &[("temperature", "0.5")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rewrite_file_empty_filename() {
    let response = test_app(MockService::new())
        .oneshot(multipart_request(Some(("", b"text")), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rewrite_file_one_failing_segment() {
    let text = "正常段落一。\n\nplease FAIL here\n\n正常段落三。";
    let response = test_app(MockService::new())
        .oneshot(multipart_request(Some(("paper.txt", text.as_bytes())), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let resp: RewriteFileResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(resp.total_segments, 3);
    assert_eq!(resp.segments[0].rewritten, "改写：正常段落一。");
    assert_eq!(resp.segments[2].rewritten, "改写：正常段落三。");

    let failed = &resp.segments[1];
    assert!(failed.rewritten.starts_with("[rewrite failed:"));
    assert!(failed.rewritten.contains("upstream rejected the paragraph"));
    assert!(failed.error.is_some());
    assert!(resp.segments[0].error.is_none());
}

#[tokio::test]
async fn test_rewrite_file_bad_temperature() {
    for temperature in ["hot", "1.5"] {
        let service = MockService::new();
        let response = test_app(service.clone())
            .oneshot(multipart_request(
                Some(("paper.txt", "段落".as_bytes())),
                &[("temperature", temperature)],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "temperature={temperature}");
        assert_eq!(service.calls(), 0);
    }
}

#[tokio::test]
async fn test_rewrite_file_form_temperature_used() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(multipart_request(
            Some(("paper.txt", "段落".as_bytes())),
            &[("temperature", "0.2"), ("use_knowledge_base", "TRUE")],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*service.last_temperature.lock().unwrap(), Some(0.2));
}

#[tokio::test]
async fn test_rewrite_file_too_large() {
    let big = vec![b'a'; 4096];
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(multipart_request(Some(("big.txt", &big)), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["success"], false);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_rewrite_file_fake_pdf_is_500() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(multipart_request(Some(("paper.pdf", b"not really a pdf")), &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("not a valid PDF"));
    assert!(error.starts_with("paper.pdf: "), "got: {error}");
    assert!(!error.contains("paper-rewrite-"), "staging path leaked: {error}");
    assert_eq!(service.calls(), 0);
}

// ── Extractor rejections keep the error envelope ─────────────────────────

#[tokio::test]
async fn test_rewrite_file_json_body_is_400_envelope() {
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(json_request("/api/rewrite-file", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert!(!error.success);
    assert!(error.error.contains("multipart"), "got: {}", error.error);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_rewrite_file_without_content_type_is_400_envelope() {
    let response = test_app(MockService::new())
        .oneshot(
            Request::builder()
                .uri("/api/rewrite-file")
                .method("POST")
                .body(Body::from("file=thesis.txt"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_rewrite_file_truncated_multipart_is_400_envelope() {
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\nno closing boundary"
    );
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(
            Request::builder()
                .uri("/api/rewrite-file")
                .method("POST")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn test_rewrite_text_oversized_body_is_413_envelope() {
    // The router limit is max_upload_bytes (1024) plus 64 KiB of slack.
    let text = "a".repeat(128 * 1024);
    let service = MockService::new();
    let response = test_app(service.clone())
        .oneshot(json_request("/api/rewrite", json!({ "text": text })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: ErrorResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert!(!error.success);
    assert!(!error.error.is_empty());
    assert_eq!(service.calls(), 0);
}
