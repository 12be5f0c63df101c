//! Batch entry points: rewrite every segment of a document.
//!
//! Segments fan out through `buffer_unordered(config.concurrency)`, the same
//! bounded-concurrency shape for every file type. Completion order is
//! arbitrary; results are sorted back by segment index before assembly, so
//! the output always follows extraction order.
//!
//! A failed paragraph never fails the batch. It becomes a
//! [`RewrittenSegment::failed`] placeholder and the remaining paragraphs are
//! still rewritten.

use crate::config::RewriteOptions;
use crate::error::PaperRewriteError;
use crate::output::{BatchStatistics, DocumentRewrite, RewrittenSegment, TextRewrite};
use crate::pipeline::segment::{segment_document, FileType, TextSegment};
use crate::rewriter::Rewriter;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Rewrite a single piece of text.
///
/// The text is trimmed first; blank input is rejected before any call.
pub async fn rewrite_text(
    rewriter: &Rewriter,
    text: &str,
    options: &RewriteOptions,
) -> Result<TextRewrite, PaperRewriteError> {
    let original = text.trim();
    if original.is_empty() {
        return Err(PaperRewriteError::InvalidInput("text must not be empty".into()));
    }
    let rewritten = rewriter.rewrite(original, options).await?;
    Ok(TextRewrite::new(original.to_string(), rewritten))
}

/// Rewrite already-extracted segments, preserving their order.
///
/// Indices in the result are 1-based positions in `segments`.
pub async fn rewrite_segments(
    rewriter: &Rewriter,
    segments: Vec<TextSegment>,
    options: &RewriteOptions,
) -> DocumentRewrite {
    let total = segments.len();
    let concurrency = rewriter.config().concurrency.max(1);
    let start = Instant::now();

    let mut results: Vec<RewrittenSegment> = stream::iter(
        segments.into_iter().enumerate().map(|(i, segment)| {
            let rewriter = rewriter.clone();
            let options = *options;
            async move {
                let index = i + 1;
                match rewriter.rewrite(&segment.text, &options).await {
                    Ok(rewritten) => {
                        RewrittenSegment::new(index, segment.page, segment.text, rewritten)
                    }
                    Err(e) => {
                        warn!("Segment {}/{} failed: {}", index, total, e);
                        let detail = match e {
                            PaperRewriteError::RewriteFailed { detail } => detail,
                            other => other.to_string(),
                        };
                        RewrittenSegment::failed(index, segment.page, segment.text, detail)
                    }
                }
            }
        }),
    )
    .buffer_unordered(concurrency)
    .collect()
    .await;

    results.sort_by_key(|s| s.index);

    let statistics = BatchStatistics::from_segments(&results);
    let output = DocumentRewrite {
        segments: results,
        statistics,
    };
    info!(
        "Rewrote {}/{} segments in {}ms (length change {})",
        total - output.failed_segments(),
        total,
        start.elapsed().as_millis(),
        statistics.length_change
    );
    output
}

/// Segment the document at `path` and rewrite every segment.
///
/// # Errors
/// Fails only when the document cannot be segmented (missing, corrupt, not
/// a PDF, pdfium unavailable) or the options are invalid. Individual
/// rewrite failures are reported per segment.
pub async fn rewrite_document(
    rewriter: &Rewriter,
    path: impl AsRef<Path>,
    file_type: FileType,
    options: &RewriteOptions,
) -> Result<DocumentRewrite, PaperRewriteError> {
    options.validate()?;
    let segments = segment_document(path.as_ref(), file_type).await?;
    Ok(rewrite_segments(rewriter, segments, options).await)
}
