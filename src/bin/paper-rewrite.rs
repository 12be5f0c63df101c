//! HTTP server binary for paper-rewrite.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `RewriteConfig`, builds the completion client and serves
//! the router until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use paper_rewrite::config::{DEFAULT_BASE_URL, DEFAULT_KNOWLEDGE_BASE, DEFAULT_MODEL};
use paper_rewrite::{app, AppState, ChatCompletionClient, RewriteConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /                   Endpoint directory
  GET  /api/health         Liveness check
  POST /api/rewrite        JSON {text, temperature?, use_knowledge_base?}
  POST /api/rewrite-file   multipart: file (pdf/docx/txt/md), temperature, use_knowledge_base

EXAMPLES:
  # Serve on the default port with a Zhipu key
  PAPER_REWRITE_API_KEY=... paper-rewrite

  # Any OpenAI-compatible endpoint
  paper-rewrite --base-url https://api.openai.com/v1 --model gpt-4.1-mini --api-key sk-...

  # Rewrite one paragraph
  curl -s localhost:5000/api/rewrite -H 'content-type: application/json' \
       -d '{"text":"这是一个测试段落。"}'

  # Rewrite a document
  curl -s localhost:5000/api/rewrite-file -F file=@thesis.docx -F temperature=0.3

ENVIRONMENT VARIABLES:
  PAPER_REWRITE_API_KEY   API key for the completion endpoint (required)
  PDFIUM_LIB_PATH         libpdfium file or directory (PDF uploads only)
  RUST_LOG                Overrides the log filter
"#;

/// Serve the paper-rewrite HTTP API.
#[derive(Parser, Debug)]
#[command(
    name = "paper-rewrite",
    version,
    about = "HTTP service that rewrites academic-paper paragraphs with an LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "PAPER_REWRITE_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PAPER_REWRITE_PORT", default_value_t = 5000)]
    port: u16,

    /// API key for the completion endpoint.
    #[arg(long, env = "PAPER_REWRITE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// OpenAI-compatible base URL (without /chat/completions).
    #[arg(long, env = "PAPER_REWRITE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model identifier.
    #[arg(long, env = "PAPER_REWRITE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Max output tokens per paragraph.
    #[arg(long, env = "PAPER_REWRITE_MAX_TOKENS", default_value_t = 96_000)]
    max_tokens: usize,

    /// Paragraphs rewritten concurrently within one document.
    #[arg(short, long, env = "PAPER_REWRITE_CONCURRENCY", default_value_t = 2)]
    concurrency: usize,

    /// Retries per paragraph on transient failures.
    #[arg(long, env = "PAPER_REWRITE_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-call timeout in seconds.
    #[arg(long, env = "PAPER_REWRITE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Style-reference knowledge base file.
    #[arg(long, env = "PAPER_REWRITE_KNOWLEDGE_BASE", default_value = DEFAULT_KNOWLEDGE_BASE)]
    knowledge_base: PathBuf,

    /// Maximum upload size in bytes.
    #[arg(long, env = "PAPER_REWRITE_MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    max_upload_bytes: usize,

    /// Keep the model's reasoning mode enabled.
    #[arg(long, env = "PAPER_REWRITE_ENABLE_THINKING")]
    enable_thinking: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAPER_REWRITE_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "paper_rewrite=debug,tower_http=debug"
    } else {
        "paper_rewrite=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let mut builder = RewriteConfig::builder()
        .base_url(cli.base_url)
        .model(cli.model)
        .max_tokens(cli.max_tokens)
        .concurrency(cli.concurrency)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .knowledge_base_path(cli.knowledge_base)
        .max_upload_bytes(cli.max_upload_bytes)
        .disable_thinking(!cli.enable_thinking);
    if let Some(key) = cli.api_key {
        builder = builder.api_key(key);
    }
    let config = builder.build().context("Invalid configuration")?;

    let client = ChatCompletionClient::from_config(&config)
        .context("Failed to create completion client")?;
    info!(
        "Completion endpoint {} (model {})",
        client.endpoint(),
        config.model
    );
    if !config.knowledge_base_path.exists() {
        info!(
            "Knowledge base {} not found; prompts will omit the style reference",
            config.knowledge_base_path.display()
        );
    }

    let router = app(AppState::new(Arc::new(client), config));

    // ── Serve ────────────────────────────────────────────────────────────
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cli.host, cli.port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("paper-rewrite listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
