//! PDF segmentation: group pdfium text runs into paragraph-like blocks.
//!
//! pdfium reports a page's text as *segments*: runs of characters sharing a
//! baseline and font, in content-stream order. This module rebuilds a
//! blocks → lines → runs hierarchy from them:
//!
//! 1. Runs whose vertical extents overlap are on the same **line**.
//! 2. Consecutive lines form a **block** until the vertical gap exceeds
//!    [`BLOCK_GAP_FACTOR`] × line height, or the next line sits higher on
//!    the page than the previous one (a new column or a float).
//!
//! Run text within a block is concatenated in reading order. Between two
//! lines a space is inserted only when both sides are ASCII alphanumeric, so
//! wrapped Latin words stay apart while CJK text is joined directly.
//!
//! The grouping is pure and works on [`TextRun`] values, so it is unit
//! tested without a pdfium library. Only [`extract_segments`] touches pdfium
//! and it always runs on the blocking pool.
//!
//! ## Library discovery
//!
//! 1. `PDFIUM_LIB_PATH`: the library file itself, or a directory holding it
//! 2. The directory of the running executable
//! 3. The system library search path

use crate::error::PaperRewriteError;
use crate::pipeline::segment::{Rgb, TextSegment};
use pdfium_render::prelude::*;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A vertical gap larger than this multiple of the line height starts a new block.
pub const BLOCK_GAP_FACTOR: f32 = 0.8;

/// Two runs are on the same line when their vertical overlap covers at least
/// this share of the shorter run.
const LINE_OVERLAP_RATIO: f32 = 0.5;

/// Slack in points before an upward jump counts as a new column.
const COLUMN_JUMP_TOLERANCE: f32 = 2.0;

/// One positioned text run, in PDF user-space points (y grows upward).
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub top: f32,
    pub bottom: f32,
    pub color: Option<Rgb>,
}

impl TextRun {
    fn height(&self) -> f32 {
        (self.top - self.bottom).max(0.0)
    }
}

#[derive(Debug)]
struct Line {
    runs: Vec<TextRun>,
    top: f32,
    bottom: f32,
}

impl Line {
    fn new(run: TextRun) -> Self {
        Self {
            top: run.top,
            bottom: run.bottom,
            runs: vec![run],
        }
    }

    fn height(&self) -> f32 {
        (self.top - self.bottom).max(0.0)
    }

    fn overlaps(&self, run: &TextRun) -> bool {
        let overlap = self.top.min(run.top) - self.bottom.max(run.bottom);
        let shorter = self.height().min(run.height());
        if shorter <= f32::EPSILON {
            // Degenerate boxes: fall back to "same baseline".
            return (self.bottom - run.bottom).abs() <= COLUMN_JUMP_TOLERANCE;
        }
        overlap >= shorter * LINE_OVERLAP_RATIO
    }

    fn push(&mut self, run: TextRun) {
        self.top = self.top.max(run.top);
        self.bottom = self.bottom.min(run.bottom);
        self.runs.push(run);
    }

    fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A detected block: its text and the distinct colours of its runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub text: String,
    pub colors: Vec<Rgb>,
}

fn group_lines(runs: Vec<TextRun>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match lines.last_mut() {
            Some(line) if line.overlaps(&run) => line.push(run),
            _ => lines.push(Line::new(run)),
        }
    }
    lines
}

fn starts_new_block(prev: &Line, next: &Line) -> bool {
    if next.top > prev.top + COLUMN_JUMP_TOLERANCE {
        return true;
    }
    let gap = prev.bottom - next.top;
    let line_height = prev.height().max(next.height());
    gap > line_height * BLOCK_GAP_FACTOR
}

fn join_lines(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        let text = line.text();
        let needs_space = matches!(
            (out.chars().last(), text.chars().next()),
            (Some(a), Some(b)) if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric()
        );
        if needs_space {
            out.push(' ');
        }
        out.push_str(&text);
    }
    out
}

fn collect_colors(lines: &[Line]) -> Vec<Rgb> {
    let mut colors = Vec::new();
    for color in lines.iter().flat_map(|l| l.runs.iter()).filter_map(|r| r.color) {
        if !colors.contains(&color) {
            colors.push(color);
        }
    }
    colors
}

/// Group a page's runs (in reading order) into blocks.
///
/// Blocks whose text is blank after trimming are dropped.
pub fn group_blocks(runs: Vec<TextRun>) -> Vec<Block> {
    let lines = group_lines(runs);
    let mut blocks = Vec::new();
    let mut current: Vec<Line> = Vec::new();

    let mut flush = |current: &mut Vec<Line>| {
        if current.is_empty() {
            return;
        }
        let text = join_lines(current).trim().to_string();
        if !text.is_empty() {
            blocks.push(Block {
                text,
                colors: collect_colors(current),
            });
        }
        current.clear();
    };

    for line in lines {
        if let Some(prev) = current.last() {
            if starts_new_block(prev, &line) {
                flush(&mut current);
            }
        }
        current.push(line);
    }
    flush(&mut current);

    blocks
}

// ── pdfium adapter ───────────────────────────────────────────────────────

/// Verify the `%PDF` signature before handing the file to pdfium.
pub fn check_pdf_magic(path: &Path) -> Result<(), PaperRewriteError> {
    let mut f = std::fs::File::open(path).map_err(|e| PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut magic = [0u8; 4];
    let read = f.read(&mut magic).map_err(|e| PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    if read < 4 || &magic != b"%PDF" {
        return Err(PaperRewriteError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

fn bind_pdfium() -> Result<Pdfium, PaperRewriteError> {
    if let Ok(configured) = std::env::var("PDFIUM_LIB_PATH") {
        let configured_path = Path::new(&configured);
        let lib_path = if configured_path.is_dir() {
            PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
                configured.as_str(),
            ))
        } else {
            configured_path.to_path_buf()
        };
        debug!("Binding pdfium from PDFIUM_LIB_PATH: {}", lib_path.display());
        let bindings = Pdfium::bind_to_library(&lib_path).map_err(|e| {
            PaperRewriteError::PdfiumBindingFailed(format!("{}: {e}", lib_path.display()))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        let lib_path = PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(
            exe_dir.to_string_lossy().as_ref(),
        ));
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!("Bound pdfium next to executable: {}", lib_path.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| PaperRewriteError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn map_load_error(path: &Path, e: PdfiumError) -> PaperRewriteError {
    let msg = format!("{e:?}");
    let detail = if msg.to_lowercase().contains("password") {
        "document is password protected".to_string()
    } else {
        msg
    };
    PaperRewriteError::CorruptDocument {
        path: path.to_path_buf(),
        detail,
    }
}

fn run_color(segment: &PdfPageTextSegment) -> Option<Rgb> {
    let chars = segment.chars().ok()?;
    let first = chars.iter().next()?;
    let color = first.fill_color().ok()?;
    Some(Rgb(color.red(), color.green(), color.blue()))
}

/// Blocking: open the PDF and return one segment per detected block.
pub fn extract_segments(path: &Path) -> Result<Vec<TextSegment>, PaperRewriteError> {
    check_pdf_magic(path)?;

    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| map_load_error(path, e))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut segments = Vec::new();
    for (page_idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| PaperRewriteError::CorruptDocument {
            path: path.to_path_buf(),
            detail: format!("page {}: {e:?}", page_idx + 1),
        })?;

        let runs: Vec<TextRun> = text
            .segments()
            .iter()
            .map(|segment| {
                let bounds = segment.bounds();
                TextRun {
                    text: segment.text(),
                    top: bounds.top().value,
                    bottom: bounds.bottom().value,
                    color: run_color(&segment),
                }
            })
            .collect();

        let blocks = group_blocks(runs);
        debug!("Page {}: {} blocks", page_idx + 1, blocks.len());

        segments.extend(blocks.into_iter().map(|b| {
            if b.colors.len() > 1 {
                debug!(
                    "Page {} block uses colours {:?}",
                    page_idx + 1,
                    b.colors.iter().map(Rgb::to_string).collect::<Vec<_>>()
                );
            }
            TextSegment {
                text: b.text,
                page: Some(page_idx + 1),
                colors: b.colors,
            }
        }));
    }

    Ok(segments)
}
