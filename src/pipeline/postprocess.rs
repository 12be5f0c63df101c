//! Post-processing: deterministic cleanup of the model's rewritten paragraph.
//!
//! The prompt wraps the paragraph in `'''`, and models often echo that
//! quoting back (or switch to `"""` / `"`). The rules here undo exactly one
//! layer of such wrapping without touching the content.
//!
//! ## Rule Order
//!
//! 1. Normalise line endings (CRLF → LF)
//! 2. Trim surrounding whitespace
//! 3. Strip one layer of matching `'''`, `"""`, or `"` delimiters, then trim again

/// Apply all post-processing rules to the raw completion text.
pub fn clean_rewrite(input: &str) -> String {
    let s = normalise_line_endings(input);
    strip_wrapping_quotes(s.trim())
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip one layer of wrapping quotes ───────────────────────────────

/// Delimiters checked in priority order; triple quotes before the single `"`
/// so `"""x"""` loses all three characters on each side.
const DELIMITERS: [&str; 3] = ["'''", "\"\"\"", "\""];

fn strip_wrapping_quotes(input: &str) -> String {
    for delim in DELIMITERS {
        // Both ends must carry the delimiter without overlapping.
        if input.len() >= delim.len() * 2 && input.starts_with(delim) && input.ends_with(delim) {
            let inner = &input[delim.len()..input.len() - delim.len()];
            return inner.trim().to_string();
        }
    }
    input.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_only_trimmed() {
        assert_eq!(clean_rewrite("  本文提出一种方法。\n"), "本文提出一种方法。");
    }

    #[test]
    fn test_strip_triple_single_quotes() {
        assert_eq!(clean_rewrite("'''本文提出一种方法。'''"), "本文提出一种方法。");
    }

    #[test]
    fn test_strip_triple_double_quotes() {
        assert_eq!(clean_rewrite("\"\"\"\n改写结果\n\"\"\""), "改写结果");
    }

    #[test]
    fn test_strip_single_double_quote() {
        assert_eq!(clean_rewrite("\"改写结果\""), "改写结果");
    }

    #[test]
    fn test_only_one_layer_removed() {
        assert_eq!(clean_rewrite("'''\"内层\"'''"), "\"内层\"");
    }

    #[test]
    fn test_unbalanced_quotes_untouched() {
        assert_eq!(clean_rewrite("\"开头有引号"), "\"开头有引号");
        assert_eq!(clean_rewrite("结尾有引号'''"), "结尾有引号'''");
    }

    #[test]
    fn test_overlapping_delimiters_untouched() {
        assert_eq!(clean_rewrite("\""), "\"");
        assert_eq!(clean_rewrite("'''''"), "'''''");
        // Six characters: both delimiters fit, leaving nothing inside.
        assert_eq!(clean_rewrite("''''''"), "");
    }

    #[test]
    fn test_crlf_normalised() {
        assert_eq!(clean_rewrite("第一行\r\n第二行"), "第一行\n第二行");
    }

    #[test]
    fn test_inner_quotes_preserved() {
        let input = "本文引用了\"深度学习\"这一概念。";
        assert_eq!(clean_rewrite(input), input);
    }
}
