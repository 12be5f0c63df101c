//! Configuration types for the rewriting service.
//!
//! Process-wide behaviour is controlled through [`RewriteConfig`], built via
//! its [`RewriteConfigBuilder`] once at start-up and then shared read-only
//! behind an `Arc`. Per-request knobs live in [`RewriteOptions`].

use crate::error::PaperRewriteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default completion endpoint (OpenAI-compatible chat completions).
pub const DEFAULT_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "glm-4.5-flash";

/// Default location of the style-reference knowledge base.
pub const DEFAULT_KNOWLEDGE_BASE: &str = "docs/writing_style_knowledge.txt";

/// Default upload cap: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration for the rewriting service.
///
/// Built via [`RewriteConfig::builder()`] or using [`RewriteConfig::default()`].
///
/// # Example
/// ```rust
/// use paper_rewrite::RewriteConfig;
///
/// let config = RewriteConfig::builder()
///     .api_key("sk-test")
///     .concurrency(2)
///     .model("glm-4.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RewriteConfig {
    /// API key for the completion service. Never has a literal default; the
    /// binary resolves it from `PAPER_REWRITE_API_KEY` at start-up.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint, without `/chat/completions`.
    pub base_url: String,

    /// Model identifier sent with every completion request.
    pub model: String,

    /// Output-token ceiling per paragraph. Default: 96000.
    ///
    /// Set high enough that a normal paragraph is never truncated.
    pub max_tokens: usize,

    /// Send `thinking: {type: "disabled"}` with each request. Default: true.
    pub disable_thinking: bool,

    /// Number of paragraphs rewritten concurrently within one document. Default: 2.
    ///
    /// The upstream service rejects requests with a concurrency error above
    /// two in-flight calls per key.
    pub concurrency: usize,

    /// Retry attempts on a transient completion failure. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Path of the style-reference document. Read on every rewrite call.
    pub knowledge_base_path: PathBuf,

    /// Maximum accepted request body for file uploads. Default: 10 MiB.
    pub max_upload_bytes: usize,

    /// Temperature used when a request does not specify one. Default: 0.5.
    pub default_temperature: f32,

    /// Knowledge-base switch used when a request does not specify one. Default: true.
    pub default_use_knowledge_base: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 96_000,
            disable_thinking: true,
            concurrency: 2,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            knowledge_base_path: PathBuf::from(DEFAULT_KNOWLEDGE_BASE),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            default_temperature: 0.5,
            default_use_knowledge_base: true,
        }
    }
}

impl fmt::Debug for RewriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RewriteConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("disable_thinking", &self.disable_thinking)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("knowledge_base_path", &self.knowledge_base_path)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl RewriteConfig {
    /// Create a new builder for `RewriteConfig`.
    pub fn builder() -> RewriteConfigBuilder {
        RewriteConfigBuilder {
            config: Self::default(),
        }
    }

    /// Request options populated from the configured defaults.
    pub fn default_options(&self) -> RewriteOptions {
        RewriteOptions {
            temperature: self.default_temperature,
            use_knowledge_base: self.default_use_knowledge_base,
        }
    }
}

/// Builder for [`RewriteConfig`].
#[derive(Debug)]
pub struct RewriteConfigBuilder {
    config: RewriteConfig,
}

impl RewriteConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn disable_thinking(mut self, v: bool) -> Self {
        self.config.disable_thinking = v;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn knowledge_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.knowledge_base_path = path.into();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn default_temperature(mut self, t: f32) -> Self {
        self.config.default_temperature = t;
        self
    }

    pub fn default_use_knowledge_base(mut self, v: bool) -> Self {
        self.config.default_use_knowledge_base = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RewriteConfig, PaperRewriteError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(PaperRewriteError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(PaperRewriteError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(PaperRewriteError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(PaperRewriteError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if c.base_url.is_empty() {
            return Err(PaperRewriteError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        validate_temperature(c.default_temperature)
            .map_err(|e| PaperRewriteError::InvalidConfig(e.to_string()))?;
        Ok(self.config)
    }
}

// ── Per-request options ──────────────────────────────────────────────────

/// Knobs a single rewrite request may set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewriteOptions {
    /// Sampling temperature passed to the completion service unmodified.
    pub temperature: f32,
    /// Append the style-reference knowledge base to the prompt.
    pub use_knowledge_base: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            use_knowledge_base: true,
        }
    }
}

impl RewriteOptions {
    /// Reject temperatures outside the recognised 0.0–1.0 range.
    pub fn validate(&self) -> Result<(), PaperRewriteError> {
        validate_temperature(self.temperature)
    }
}

fn validate_temperature(t: f32) -> Result<(), PaperRewriteError> {
    if !t.is_finite() || !(0.0..=1.0).contains(&t) {
        return Err(PaperRewriteError::InvalidInput(format!(
            "temperature must be between 0.0 and 1.0, got {t}"
        )));
    }
    Ok(())
}
