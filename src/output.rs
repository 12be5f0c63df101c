//! Result types returned by the rewriting entry points.
//!
//! These are also the JSON shapes of the HTTP responses, so field names are
//! part of the public wire contract.

use crate::error::SegmentError;
use serde::{Deserialize, Serialize};

/// One rewritten segment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenSegment {
    /// 1-based position in extraction order.
    pub index: usize,
    /// 1-based source page (PDF only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub page: Option<usize>,
    pub original: String,
    /// Rewritten text, or a failure placeholder when `error` is set.
    pub rewritten: String,
    /// Character count of `original`.
    pub original_length: usize,
    /// Character count of `rewritten`.
    pub rewritten_length: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<SegmentError>,
}

impl RewrittenSegment {
    pub fn new(index: usize, page: Option<usize>, original: String, rewritten: String) -> Self {
        Self {
            index,
            page,
            original_length: original.chars().count(),
            rewritten_length: rewritten.chars().count(),
            original,
            rewritten,
            error: None,
        }
    }

    /// A segment whose rewrite failed; `rewritten` carries a placeholder.
    pub fn failed(index: usize, page: Option<usize>, original: String, detail: String) -> Self {
        let placeholder = format!("[rewrite failed: {detail}]");
        let mut seg = Self::new(index, page, original, placeholder);
        seg.error = Some(SegmentError::RewriteFailed { index, detail });
        seg
    }
}

/// Aggregate length statistics for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total_original_length: usize,
    pub total_rewritten_length: usize,
    /// `total_rewritten_length - total_original_length`; negative when the
    /// rewrite is shorter.
    pub length_change: i64,
}

impl BatchStatistics {
    pub fn from_segments(segments: &[RewrittenSegment]) -> Self {
        let total_original_length: usize = segments.iter().map(|s| s.original_length).sum();
        let total_rewritten_length: usize = segments.iter().map(|s| s.rewritten_length).sum();
        Self {
            total_original_length,
            total_rewritten_length,
            length_change: total_rewritten_length as i64 - total_original_length as i64,
        }
    }
}

/// A fully rewritten document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRewrite {
    /// Segments in extraction order.
    pub segments: Vec<RewrittenSegment>,
    pub statistics: BatchStatistics,
}

impl DocumentRewrite {
    /// Segments whose rewrite failed.
    pub fn failed_segments(&self) -> usize {
        self.segments.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Result of rewriting a single piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRewrite {
    pub original_text: String,
    pub rewritten_text: String,
    pub original_length: usize,
    pub rewritten_length: usize,
}

impl TextRewrite {
    pub fn new(original_text: String, rewritten_text: String) -> Self {
        Self {
            original_length: original_text.chars().count(),
            rewritten_length: rewritten_text.chars().count(),
            original_text,
            rewritten_text,
        }
    }
}
