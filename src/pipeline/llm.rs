//! Completion service: the only stage with network I/O.
//!
//! [`CompletionService`] is the seam between the rewriter and whatever model
//! endpoint is behind it. The production implementation,
//! [`ChatCompletionClient`], speaks the OpenAI-compatible
//! `POST {base_url}/chat/completions` protocol used by Zhipu, OpenAI and most
//! self-hosted gateways. Tests inject scripted implementations instead.
//!
//! Retry and timeout policy is not implemented here; it lives in
//! [`crate::rewriter`] so every implementation gets the same behaviour.
//! This module only classifies failures as transient or permanent.

use crate::config::RewriteConfig;
use crate::error::PaperRewriteError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// The complete user prompt.
    pub prompt: String,
    /// Sampling temperature, passed through unmodified.
    pub temperature: f32,
    /// Output-token ceiling.
    pub max_tokens: usize,
}

/// Failure of a single completion call.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    /// The call did not finish within the per-call timeout.
    #[error("completion call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// HTTP 429 from the provider.
    #[error("rate limit exceeded (retry after {retry_after_secs:?}s): {detail}")]
    RateLimited {
        retry_after_secs: Option<u64>,
        detail: String,
    },

    /// HTTP 401/403: retrying will not help.
    #[error("authentication rejected (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    /// Any other non-success HTTP status.
    #[error("completion API returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// Connection, DNS or TLS failure before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response parsed but carried no message content.
    #[error("completion response contained no content")]
    EmptyResponse,

    /// The response body was not the expected JSON shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// Transient failures are worth retrying; permanent ones are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Timeout { .. }
            | CompletionError::RateLimited { .. }
            | CompletionError::Transport(_) => true,
            CompletionError::Api { status, .. } => *status >= 500,
            CompletionError::Auth { .. }
            | CompletionError::EmptyResponse
            | CompletionError::MalformedResponse(_) => false,
        }
    }

    /// Server-suggested delay before the next attempt, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CompletionError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// A text-completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Short provider label used in logs.
    fn name(&self) -> &str;

    /// Run one completion and return the raw message content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

// ── OpenAI-compatible client ─────────────────────────────────────────────

/// [`CompletionService`] backed by an OpenAI-compatible chat endpoint.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    disable_thinking: bool,
    http_timeout_secs: u64,
}

impl ChatCompletionClient {
    /// Build a client from the service configuration.
    ///
    /// Fails with [`PaperRewriteError::ProviderNotConfigured`] when no API key
    /// was supplied.
    pub fn from_config(config: &RewriteConfig) -> Result<Self, PaperRewriteError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PaperRewriteError::ProviderNotConfigured {
                provider: config.base_url.clone(),
                hint: "Set PAPER_REWRITE_API_KEY or pass --api-key.".to_string(),
            })?
            .to_string();

        // Slightly above the per-call timeout so the rewriter's own timeout
        // normally fires first.
        let http_timeout_secs = config.api_timeout_secs + 5;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(http_timeout_secs))
            .pool_max_idle_per_host(config.concurrency.max(1))
            .build()
            .map_err(|e| PaperRewriteError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url),
            api_key,
            model: config.model.clone(),
            disable_thinking: config.disable_thinking,
            http_timeout_secs,
        })
    }

    /// Full URL the client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequestBody<'a> {
        ChatRequestBody {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: false,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            thinking: self
                .disable_thinking
                .then_some(ThinkingOption { kind: "disabled" }),
        }
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = self.build_body(request);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        secs: self.http_timeout_secs,
                    }
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let retry_after_secs = parse_retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_status(status, retry_after_secs, text));
        }

        let parsed: ChatResponseBody = serde_json::from_str(&text)
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "{}: {} prompt tokens, {} completion tokens",
                self.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Map a non-success HTTP status to a [`CompletionError`].
fn classify_status(status: StatusCode, retry_after_secs: Option<u64>, body: String) -> CompletionError {
    let detail = extract_error_message(&body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited {
            retry_after_secs,
            detail,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CompletionError::Auth {
            status: status.as_u16(),
            detail,
        },
        _ => CompletionError::Api {
            status: status.as_u16(),
            detail,
        },
    }
}

/// Pull `error.message` out of a provider error body, falling back to the
/// raw (truncated) body.
fn extract_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: ErrorDetail,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: String,
    }

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => env.error.message,
        Err(_) => body.chars().take(300).collect(),
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingOption>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ThinkingOption {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
