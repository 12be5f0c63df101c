//! Error types for the paper-rewrite library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PaperRewriteError`]: **fatal**, the request cannot proceed at all
//!   (blank input, unsupported file, corrupt document, completion service not
//!   configured). Returned as `Err(PaperRewriteError)` from
//!   [`crate::Rewriter::rewrite`] and [`crate::rewrite_document`].
//!
//! * [`SegmentError`]: **non-fatal**, one paragraph of a document could not
//!   be rewritten, but every other paragraph is fine. Stored inside
//!   [`crate::output::RewrittenSegment`] next to a placeholder text so a
//!   single bad paragraph never discards the rest of the document.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paper-rewrite library.
#[derive(Debug, Error)]
pub enum PaperRewriteError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied something unusable (blank paragraph, bad option).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The file extension is not one of pdf, docx, txt, md.
    #[error("Unsupported file format '{extension}', supported: pdf, docx, txt, md")]
    UnsupportedFormat { extension: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// The file could not be read or parsed as its declared type.
    ///
    /// The message leaves out `path`, which is usually a server-side
    /// staging file.
    #[error("Document could not be processed: {detail}")]
    CorruptDocument { path: PathBuf, detail: String },

    /// The file was declared as PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or place the library next to the executable."
    )]
    PdfiumBindingFailed(String),

    // ── Completion errors ─────────────────────────────────────────────────
    /// The completion service failed for this paragraph (after retries).
    #[error("Paragraph rewrite failed: {detail}")]
    RewriteFailed { detail: String },

    /// The completion client is missing something it needs (API key etc.).
    #[error("Completion service '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PaperRewriteError {
    /// Whether the error was caused by the caller's input rather than by the
    /// service or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PaperRewriteError::InvalidInput(_) | PaperRewriteError::UnsupportedFormat { .. }
        )
    }
}

/// A non-fatal error for a single segment.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentError {
    /// The completion call failed after retries.
    #[error("Segment {index}: rewrite failed: {detail}")]
    RewriteFailed { index: usize, detail: String },
}
