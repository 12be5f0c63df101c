//! Input staging: persist an uploaded document to a scoped temp file.
//!
//! pdfium and docx-rs read from the filesystem, and both care about the
//! extension. The upload is therefore written to a uniquely named temp file
//! that keeps the canonical extension of its [`FileType`]. The file lives
//! exactly as long as the [`StagedUpload`] value: it is removed on drop,
//! whether the request succeeded, failed part-way, or was cancelled by a
//! client disconnect.

use crate::error::PaperRewriteError;
use crate::pipeline::segment::FileType;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// An uploaded document on disk, deleted when dropped.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
    file_type: FileType,
}

impl StagedUpload {
    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Format the upload was resolved to.
    pub fn file_type(&self) -> FileType {
        self.file_type
    }
}

/// Write `bytes` to a fresh temp file carrying `file_type`'s extension.
pub async fn stage_upload(bytes: &[u8], file_type: FileType) -> Result<StagedUpload, PaperRewriteError> {
    let file = tempfile::Builder::new()
        .prefix("paper-rewrite-")
        .suffix(&format!(".{}", file_type.extension()))
        .tempfile()
        .map_err(|e| PaperRewriteError::Internal(format!("Failed to create temp file: {e}")))?;

    tokio::fs::write(file.path(), bytes)
        .await
        .map_err(|e| PaperRewriteError::Internal(format!("Failed to write temp file: {e}")))?;

    debug!(
        "Staged {} bytes as {}",
        bytes.len(),
        file.path().display()
    );
    Ok(StagedUpload { file, file_type })
}
