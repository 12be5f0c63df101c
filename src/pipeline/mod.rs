//! Pipeline stages for document rewriting.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ segment ──▶ llm ──▶ postprocess
//! (upload)  (pdf/docx/  (chat    (quote
//!            plain)      API)     stripping)
//! ```
//!
//! 1. [`input`]   stage the uploaded bytes to a scoped temp file
//! 2. [`segment`] dispatch on [`segment::FileType`] to [`pdf`], [`docx`] or
//!    [`plain`]; parsers run in `spawn_blocking`
//! 3. [`llm`]     one completion call per paragraph; the only stage with
//!    network I/O
//! 4. [`postprocess`] deterministic cleanup of the model output

pub mod docx;
pub mod input;
pub mod llm;
pub mod pdf;
pub mod plain;
pub mod postprocess;
pub mod segment;
