//! CLI binary for pixdoc.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ServerConfig` and runs the HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use pixdoc::{serve, ServerConfig};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on 0.0.0.0:5000
  pixdoc

  # Custom port and a smaller default budget
  PORT=8080 pixdoc --default-budget-kb 200

  # Use a specific pdfium build
  pixdoc --pdfium-lib /opt/pdfium/lib/libpdfium.so

ENDPOINTS:
  GET  /          capabilities (supported input/output formats)
  GET  /health    liveness probe with version and timestamp
  POST /convert   files → jpg | png | pdf | docx | pptx
  POST /collage   files → one collage image

ENVIRONMENT VARIABLES:
  PORT                       TCP port (default 5000)
  PIXDOC_HOST                Bind address (default 0.0.0.0)
  PIXDOC_MAX_REQUEST_MB      Request body ceiling in MiB (default 100)
  PIXDOC_DEFAULT_BUDGET_KB   Per-file budget when max_file_size is omitted
  PIXDOC_TITLE               Title written into DOCX/PPTX outputs
  PDFIUM_LIB_PATH            Path to libpdfium; otherwise the system library
  RUST_LOG                   Overrides the log filter
"#;

/// Convert PDFs and images over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "pixdoc",
    version,
    about = "HTTP API converting PDFs and images to JPG, PNG, PDF, DOCX, PPTX and collages",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "PIXDOC_HOST", default_value = "0.0.0.0")]
    host: String,

    /// TCP port.
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Maximum request body in MiB.
    #[arg(long, env = "PIXDOC_MAX_REQUEST_MB", default_value_t = 100,
          value_parser = clap::value_parser!(u64).range(1..=4096))]
    max_request_mb: u64,

    /// Per-file byte budget in KB when a request omits max_file_size.
    #[arg(
        long,
        env = "PIXDOC_DEFAULT_BUDGET_KB",
        default_value_t = pixdoc::config::DEFAULT_BUDGET_KB
    )]
    default_budget_kb: u64,

    /// Title written into DOCX and PPTX outputs.
    #[arg(long, env = "PIXDOC_TITLE", default_value = "Converted Images")]
    title: String,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PIXDOC_VERBOSE")]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> Result<ServerConfig> {
        let mut builder = ServerConfig::builder()
            .host(self.host.clone())
            .port(self.port)
            .max_request_bytes((self.max_request_mb * 1024 * 1024) as usize)
            .default_budget_kb(self.default_budget_kb)
            .document_title(self.title.clone());
        if let Some(path) = &self.pdfium_lib {
            builder = builder.pdfium_library(path.clone());
        }
        builder.build().context("Invalid server configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = cli.to_config()?;
    tracing::debug!(?config, "Resolved configuration");

    serve(config)
        .await
        .context("HTTP server terminated with an error")
}
