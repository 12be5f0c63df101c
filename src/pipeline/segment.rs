//! Segmentation: turn an uploaded document into ordered paragraph-like units.
//!
//! The file type is resolved exactly once, from the upload's filename, into
//! the closed [`FileType`] variant. Everything downstream dispatches on that
//! variant and never re-inspects the extension string.
//!
//! All parsers are synchronous library calls, so [`segment_document`] runs
//! them on the blocking pool.

use crate::error::PaperRewriteError;
use crate::pipeline::{docx, pdf, plain};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Txt,
    Md,
}

impl FileType {
    /// Every accepted format, in allow-list order.
    pub const ALL: [FileType; 4] = [FileType::Pdf, FileType::Docx, FileType::Txt, FileType::Md];

    /// Resolve a bare extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Result<Self, PaperRewriteError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "docx" => Ok(FileType::Docx),
            "txt" => Ok(FileType::Txt),
            "md" => Ok(FileType::Md),
            other => Err(PaperRewriteError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    /// Resolve from an uploaded filename such as `Thesis.PDF`.
    ///
    /// A name without a dot has no extension and is rejected.
    pub fn from_filename(name: &str) -> Result<Self, PaperRewriteError> {
        match name.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Err(PaperRewriteError::UnsupportedFormat {
                extension: String::new(),
            }),
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
            FileType::Txt => "txt",
            FileType::Md => "md",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// An sRGB fill colour observed on a PDF text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// One extracted unit of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    /// Trimmed, non-empty text.
    pub text: String,
    /// 1-based source page (PDF only).
    pub page: Option<usize>,
    /// Distinct run colours in first-seen order (PDF only).
    pub colors: Vec<Rgb>,
}

impl TextSegment {
    /// A segment with no page or colour information.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page: None,
            colors: Vec::new(),
        }
    }
}

/// Segment the document at `path` according to `file_type`.
///
/// Returns segments in extraction order. An empty vector is a valid result
/// (e.g. a scanned PDF without a text layer).
pub async fn segment_document(
    path: &Path,
    file_type: FileType,
) -> Result<Vec<TextSegment>, PaperRewriteError> {
    let path: PathBuf = path.to_path_buf();
    if !path.exists() {
        return Err(PaperRewriteError::FileNotFound { path });
    }

    let task_path = path.clone();
    let segments = tokio::task::spawn_blocking(move || match file_type {
        FileType::Pdf => pdf::extract_segments(&task_path),
        FileType::Docx => docx::extract_segments(&task_path),
        FileType::Txt | FileType::Md => plain::extract_segments(&task_path),
    })
    .await
    .map_err(|e| PaperRewriteError::Internal(format!("Segmentation task panicked: {e}")))??;

    info!(
        "Segmented {} ({}) into {} segments",
        path.display(),
        file_type,
        segments.len()
    );
    for (i, s) in segments.iter().enumerate() {
        debug!(
            "  segment {}: page={:?} chars={}",
            i + 1,
            s.page,
            s.text.chars().count()
        );
    }
    Ok(segments)
}
