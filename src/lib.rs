//! # paper-rewrite
//!
//! Rewrite academic-paper paragraphs with a chat-completion model so they
//! read more naturally, either one text at a time or a whole uploaded
//! document (PDF, DOCX, TXT, Markdown) at once.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload / text
//!  │
//!  ├─ 1. Stage     write the upload to a scoped temp file (RAII cleanup)
//!  ├─ 2. Segment   pdfium layout blocks / docx paragraphs / blank-line blocks
//!  ├─ 3. Prompt    fixed instructions + optional style knowledge base
//!  ├─ 4. Complete  bounded concurrent calls with timeout and retry
//!  ├─ 5. Polish    strip echoed quote delimiters
//!  └─ 6. Output    segments in extraction order + length statistics
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_rewrite::{rewrite_document, ChatCompletionClient, FileType, RewriteConfig, Rewriter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RewriteConfig::builder()
//!         .api_key(std::env::var("PAPER_REWRITE_API_KEY")?)
//!         .build()?;
//!     let client = ChatCompletionClient::from_config(&config)?;
//!     let rewriter = Rewriter::new(Arc::new(client), Arc::new(config));
//!
//!     let options = rewriter.config().default_options();
//!     let doc = rewrite_document(&rewriter, "thesis.docx", FileType::Docx, &options).await?;
//!     for seg in &doc.segments {
//!         println!("{}\n→ {}\n", seg.original, seg.rewritten);
//!     }
//!     eprintln!("length change: {}", doc.statistics.length_change);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `paper-rewrite` server binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library or the router in another server:
//! ```toml
//! paper-rewrite = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod rewriter;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{rewrite_document, rewrite_segments, rewrite_text};
pub use config::{RewriteConfig, RewriteConfigBuilder, RewriteOptions};
pub use error::{PaperRewriteError, SegmentError};
pub use output::{BatchStatistics, DocumentRewrite, RewrittenSegment, TextRewrite};
pub use pipeline::llm::{ChatCompletionClient, CompletionError, CompletionRequest, CompletionService};
pub use pipeline::segment::{segment_document, FileType, Rgb, TextSegment};
pub use rewriter::Rewriter;
pub use server::{app, AppState};
