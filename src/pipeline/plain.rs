//! Plain-text and Markdown segmentation: one segment per blank-line block.

use crate::error::PaperRewriteError;
use crate::pipeline::segment::TextSegment;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Two or more line breaks, allowing whitespace-only lines in between.
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

/// Split text into trimmed, non-empty blocks separated by blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let normalised = text.replace("\r\n", "\n");
    BLANK_LINES
        .split(&normalised)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a UTF-8 text file and split it into segments.
pub fn extract_segments(path: &Path) -> Result<Vec<TextSegment>, PaperRewriteError> {
    let text = std::fs::read_to_string(path).map_err(|e| PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    // A UTF-8 BOM would otherwise stick to the first paragraph.
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(split_paragraphs(text)
        .into_iter()
        .map(TextSegment::plain)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_three_paragraphs() {
        let text = "第一段内容。\n\n第二段内容。\n\n第三段内容。";
        assert_eq!(
            split_paragraphs(text),
            vec!["第一段内容。", "第二段内容。", "第三段内容。"]
        );
    }

    #[test]
    fn test_single_newline_stays_in_block() {
        let text = "同一段的第一行\n同一段的第二行\n\n下一段";
        let paras = split_paragraphs(text);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0], "同一段的第一行\n同一段的第二行");
    }

    #[test]
    fn test_runs_of_blank_lines_and_whitespace() {
        let text = "\n\n  甲  \n\n\n \t \n乙\r\n\r\n丙\n\n   \n";
        assert_eq!(split_paragraphs(text), vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_paragraphs("").is_empty());
        assert!(split_paragraphs("\n\n   \n\n").is_empty());
    }

    #[test]
    fn test_extract_strips_bom() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "\u{feff}第一段\n\n第二段").unwrap();
        let segs = extract_segments(f.path()).unwrap();
        assert_eq!(segs[0].text, "第一段");
        assert_eq!(segs.len(), 2);
    }

    #[test]
    fn test_extract_rejects_non_utf8() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&[0xff, 0xfe, 0x00, 0xd8]).unwrap();
        let err = extract_segments(f.path()).unwrap_err();
        assert!(matches!(err, PaperRewriteError::CorruptDocument { .. }));
    }
}
