//! Paragraph rewriter: prompt assembly, completion call, cleanup.
//!
//! [`Rewriter`] is cheap to clone (two `Arc`s) and is shared by every
//! request. It owns the retry policy so that any [`CompletionService`]
//! implementation gets the same behaviour:
//!
//! * every attempt is bounded by `api_timeout_secs`;
//! * transient failures (timeout, 429, 5xx, transport) are retried up to
//!   `max_retries` times with exponential backoff
//!   (`retry_backoff_ms * 2^(attempt-1)`), or the server's `Retry-After`
//!   when it is longer;
//! * permanent failures return immediately.

use crate::config::{RewriteConfig, RewriteOptions};
use crate::error::PaperRewriteError;
use crate::knowledge::load_knowledge_base;
use crate::pipeline::llm::{CompletionError, CompletionRequest, CompletionService};
use crate::pipeline::postprocess::clean_rewrite;
use crate::prompts::build_rewrite_prompt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Rewrites single paragraphs through a [`CompletionService`].
#[derive(Clone)]
pub struct Rewriter {
    service: Arc<dyn CompletionService>,
    config: Arc<RewriteConfig>,
}

impl Rewriter {
    pub fn new(service: Arc<dyn CompletionService>, config: Arc<RewriteConfig>) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &RewriteConfig {
        &self.config
    }

    /// Rewrite one paragraph.
    ///
    /// # Errors
    /// * [`PaperRewriteError::InvalidInput`] for a blank paragraph or an
    ///   out-of-range temperature
    /// * [`PaperRewriteError::RewriteFailed`] when the completion service
    ///   fails after retries
    pub async fn rewrite(
        &self,
        paragraph: &str,
        options: &RewriteOptions,
    ) -> Result<String, PaperRewriteError> {
        if paragraph.trim().is_empty() {
            return Err(PaperRewriteError::InvalidInput(
                "paragraph must not be empty".into(),
            ));
        }
        options.validate()?;

        let knowledge = if options.use_knowledge_base {
            load_knowledge_base(&self.config.knowledge_base_path).await
        } else {
            None
        };
        let request = CompletionRequest {
            prompt: build_rewrite_prompt(paragraph, knowledge.as_deref()),
            temperature: options.temperature,
            max_tokens: self.config.max_tokens,
        };

        let start = Instant::now();
        let raw = self
            .complete_with_retry(&request)
            .await
            .map_err(|e| PaperRewriteError::RewriteFailed {
                detail: e.to_string(),
            })?;

        let rewritten = clean_rewrite(&raw);
        debug!(
            "{}: rewrote {} → {} chars in {}ms (knowledge base: {})",
            self.service.name(),
            paragraph.chars().count(),
            rewritten.chars().count(),
            start.elapsed().as_millis(),
            knowledge.is_some()
        );
        Ok(rewritten)
    }

    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let call_timeout = Duration::from_secs(self.config.api_timeout_secs);
        let mut last_err = CompletionError::EmptyResponse;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff =
                    Duration::from_millis(self.config.retry_backoff_ms * 2u64.pow(attempt - 1));
                let delay = last_err.retry_after().map_or(backoff, |ra| ra.max(backoff));
                warn!(
                    "Retry {}/{} after {}ms",
                    attempt,
                    self.config.max_retries,
                    delay.as_millis()
                );
                sleep(delay).await;
            }

            let result = match timeout(call_timeout, self.service.complete(request)).await {
                Ok(r) => r,
                Err(_) => Err(CompletionError::Timeout {
                    secs: self.config.api_timeout_secs,
                }),
            };

            match result {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() => {
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_err = e;
                }
                Err(e) => {
                    warn!("Attempt {} failed permanently: {}", attempt + 1, e);
                    return Err(e);
                }
            }
        }

        Err(last_err)
    }
}
