//! Style-reference knowledge base.
//!
//! The knowledge base is a plain UTF-8 text file of human-rewritten examples.
//! It is read fresh on every call so edits take effect without a restart.
//! A missing file is normal; the prompt simply goes without a reference
//! section.

use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Load the knowledge base, returning `None` when it is absent, unreadable,
/// or blank.
pub async fn load_knowledge_base(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => {
            debug!("Knowledge base {} is empty", path.display());
            None
        }
        Ok(content) => {
            debug!(
                "Loaded knowledge base {} ({} chars)",
                path.display(),
                content.chars().count()
            );
            Some(content)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Knowledge base {} not found", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read knowledge base {}: {}", path.display(), e);
            None
        }
    }
}
