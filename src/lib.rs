//! # pixdoc
//!
//! An HTTP API that converts between image and document formats: PDF pages
//! to images, images to PDF/DOCX/PPTX, size-targeted recompression, and
//! multi-image collages.
//!
//! ## Pipeline Overview
//!
//! ```text
//! JSON request
//!  │
//!  ├─ 1. Validate  output format, collage color (400 before any decoding)
//!  ├─ 2. Decode    base64 → image / PDF pages via pdfium (skip bad files)
//!  ├─ 3. Collage   optional grid / row / column merge
//!  ├─ 4. Export    JPEG ladder, lossless PNG, or a PDF/DOCX/PPTX container
//!  └─ 5. Respond   base64 files + counts + skipped uploads
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixdoc::{serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::builder().port(8080).build()?;
//!     serve(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! The conversion core is usable without HTTP:
//!
//! ```rust,no_run
//! use pixdoc::{ConversionRequest, Converter, OutputFormat, ServerConfig, Upload};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::from_config(&ServerConfig::default());
//! let result = converter.convert(ConversionRequest {
//!     uploads: vec![Upload::new("scan.pdf", std::fs::read("scan.pdf")?)],
//!     output_format: OutputFormat::Pptx,
//!     budget: 500 * 1024,
//!     collage: None,
//!     rejected: Vec::new(),
//! })?;
//! println!("{} -> {} bytes", result.files[0].name, result.files[0].size());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pixdoc` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF input needs the pdfium shared library at runtime; point
//! `ServerConfig::pdfium_library` (or `PDFIUM_LIB_PATH` for the binary) at
//! it, or install it on the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod format;
pub mod pipeline;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServerConfig, ServerConfigBuilder};
pub use convert::{CollageRequest, CollageResult, ConversionRequest, ConversionResult, Converter};
pub use error::{ConvertError, FileError};
pub use export::OutputFile;
pub use format::OutputFormat;
pub use pipeline::collage::{CollageConfig, LayoutMode};
pub use pipeline::compress::TargetEncoding;
pub use pipeline::decode::Upload;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use server::{router, serve, AppState};
