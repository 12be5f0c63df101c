//! DOCX segmentation via `docx-rs`: one segment per non-empty body paragraph.
//!
//! Only top-level body paragraphs count. Tables, headers and footers are not
//! part of the running text of a paper and are skipped.

use crate::error::PaperRewriteError;
use crate::pipeline::segment::TextSegment;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use std::path::Path;
use tracing::debug;

/// Parse the document at `path` and return its paragraphs in order.
pub fn extract_segments(path: &Path) -> Result<Vec<TextSegment>, PaperRewriteError> {
    let bytes = std::fs::read(path).map_err(|e| PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let docx = docx_rs::read_docx(&bytes).map_err(|e| PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail: format!("DOCX parse error: {e}"),
    })?;

    let mut segments = Vec::new();
    let mut skipped = 0usize;
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            let text = paragraph_text(para);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                skipped += 1;
            } else {
                segments.push(TextSegment::plain(trimmed));
            }
        }
    }

    debug!(
        "DOCX {}: {} paragraphs, {} empty skipped",
        path.display(),
        segments.len(),
        skipped
    );
    Ok(segments)
}

/// Concatenate the text of every run in a paragraph, including runs nested
/// in hyperlinks.
fn paragraph_text(para: &Paragraph) -> String {
    let mut out = String::new();
    for child in &para.children {
        push_paragraph_child(child, &mut out);
    }
    out
}

fn push_paragraph_child(child: &ParagraphChild, out: &mut String) {
    match child {
        ParagraphChild::Run(run) => {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
        ParagraphChild::Hyperlink(link) => {
            for inner in &link.children {
                push_paragraph_child(inner, out);
            }
        }
        _ => {}
    }
}
