//! JSON request and response bodies.
//!
//! Request bodies are lenient: every field except `files` has a default, and
//! a file entry missing its name or content is skipped later rather than
//! failing the whole body. Validation that can reject a request outright
//! (unknown output format, bad color) happens in the `into_*` methods before
//! any upload is decoded.

use crate::config::ServerConfig;
use crate::convert::{CollageRequest, CollageResult, ConversionRequest, ConversionResult};
use crate::error::{ConvertError, FileError};
use crate::export::OutputFile;
use crate::format::{OutputFormat, IMAGE_EXTENSIONS, PDF_EXTENSIONS};
use crate::pipeline::collage::{CollageConfig, LayoutMode};
use crate::pipeline::color::parse_color;
use crate::pipeline::compress::TargetEncoding;
use crate::pipeline::decode::Upload;
use crate::pipeline::encode::{from_base64, to_base64};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ── Requests ─────────────────────────────────────────────────────────────

/// One uploaded file, base64-encoded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilePayload {
    pub name: String,
    pub content: String,
}

/// Collage settings nested in a `/convert` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollageOptions {
    pub enabled: bool,
    pub layout: String,
    pub spacing: u32,
    pub background_color: String,
}

impl Default for CollageOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            layout: "grid".to_string(),
            spacing: 10,
            background_color: "white".to_string(),
        }
    }
}

/// `POST /convert` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertBody {
    #[serde(default)]
    pub files: Option<Vec<FilePayload>>,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Per-file budget in KB.
    #[serde(default)]
    pub max_file_size: Option<f64>,
    #[serde(default)]
    pub collage: CollageOptions,
}

/// `POST /collage` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CollageBody {
    #[serde(default)]
    pub files: Option<Vec<FilePayload>>,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default = "default_spacing")]
    pub spacing: u32,
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    #[serde(default)]
    pub max_file_size: Option<f64>,
}

fn default_output_format() -> String {
    "jpg".to_string()
}

fn default_layout() -> String {
    "grid".to_string()
}

fn default_spacing() -> u32 {
    10
}

fn default_background() -> String {
    "white".to_string()
}

impl ConvertBody {
    /// Validate and decode the transport layer into a [`ConversionRequest`].
    pub fn into_request(self, config: &ServerConfig) -> Result<ConversionRequest, ConvertError> {
        let files = self.files.ok_or(ConvertError::NoFilesProvided)?;
        let output_format: OutputFormat = self.output_format.parse()?;
        let collage = if self.collage.enabled {
            Some(collage_config(
                &self.collage.layout,
                self.collage.spacing,
                &self.collage.background_color,
            )?)
        } else {
            None
        };
        let (uploads, rejected) = decode_payloads(files);
        Ok(ConversionRequest {
            uploads,
            output_format,
            budget: budget_bytes(self.max_file_size, config.default_budget_kb),
            collage,
            rejected,
        })
    }
}

impl CollageBody {
    /// Validate and decode the transport layer into a [`CollageRequest`].
    ///
    /// `output_format` "png" selects PNG; every other value means JPEG.
    pub fn into_request(self, config: &ServerConfig) -> Result<CollageRequest, ConvertError> {
        let files = self.files.ok_or(ConvertError::NoFilesProvided)?;
        let encoding = if self.output_format.trim().eq_ignore_ascii_case("png") {
            TargetEncoding::Png
        } else {
            TargetEncoding::Jpeg
        };
        let collage = collage_config(&self.layout, self.spacing, &self.background_color)?;
        let (uploads, rejected) = decode_payloads(files);
        Ok(CollageRequest {
            uploads,
            config: collage,
            encoding,
            budget: budget_bytes(self.max_file_size, config.default_budget_kb),
            rejected,
        })
    }
}

fn collage_config(layout: &str, spacing: u32, color: &str) -> Result<CollageConfig, ConvertError> {
    Ok(CollageConfig {
        layout: LayoutMode::parse_or_grid(layout),
        spacing,
        background: parse_color(color)?,
    })
}

/// KB → bytes. Missing uses the server default; negative and NaN clamp to 0.
pub fn budget_bytes(max_file_size_kb: Option<f64>, default_kb: u64) -> u64 {
    match max_file_size_kb {
        Some(kb) if kb.is_finite() && kb > 0.0 => (kb * 1024.0).round() as u64,
        Some(kb) if kb == f64::INFINITY => u64::MAX,
        Some(_) => 0,
        None => default_kb.saturating_mul(1024),
    }
}

/// Strip base64 transport encoding; bad payloads become [`FileError`]s.
pub fn decode_payloads(files: Vec<FilePayload>) -> (Vec<Upload>, Vec<FileError>) {
    let mut uploads = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        match from_base64(&file.content) {
            Ok(bytes) => uploads.push(Upload::new(file.name, bytes)),
            Err(e) => {
                warn!(file = %file.name, error = %e, "Invalid base64 content");
                rejected.push(FileError::InvalidBase64 {
                    name: file.name,
                    detail: e.to_string(),
                });
            }
        }
    }
    (uploads, rejected)
}

// ── Responses ────────────────────────────────────────────────────────────

/// An output file, base64-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct FileDto {
    pub name: String,
    pub content: String,
    pub size: usize,
}

impl From<&OutputFile> for FileDto {
    fn from(file: &OutputFile) -> Self {
        Self {
            name: file.name.clone(),
            content: to_base64(&file.bytes),
            size: file.size(),
        }
    }
}

/// `POST /convert` success body.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    pub files: Vec<FileDto>,
    pub total_processed: usize,
    pub output_format: OutputFormat,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<FileError>,
}

impl From<ConversionResult> for ConvertResponse {
    fn from(result: ConversionResult) -> Self {
        Self {
            success: true,
            files: result.files.iter().map(FileDto::from).collect(),
            total_processed: result.total_processed,
            output_format: result.output_format,
            skipped: result.skipped,
        }
    }
}

/// `POST /collage` success body.
#[derive(Debug, Clone, Serialize)]
pub struct CollageResponse {
    pub success: bool,
    pub collage: FileDto,
    pub images_used: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<FileError>,
}

impl From<CollageResult> for CollageResponse {
    fn from(result: CollageResult) -> Self {
        Self {
            success: true,
            collage: FileDto::from(&result.file),
            images_used: result.images_used,
            skipped: result.skipped,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Input extensions grouped by kind.
#[derive(Debug, Clone, Serialize)]
pub struct SupportedInput {
    pub image: Vec<&'static str>,
    pub pdf: Vec<&'static str>,
}

/// `GET /` body.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilitiesResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub supported_input: SupportedInput,
    pub supported_output: Vec<OutputFormat>,
}

impl Default for CapabilitiesResponse {
    fn default() -> Self {
        Self {
            status: "healthy",
            message: "PDF & Image Converter API",
            supported_input: SupportedInput {
                image: IMAGE_EXTENSIONS.to_vec(),
                pdf: PDF_EXTENSIONS.to_vec(),
            },
            supported_output: OutputFormat::ALL.to_vec(),
        }
    }
}

/// `GET /health` body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn now() -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
