//! Supported input and output formats.
//!
//! Output formats form a closed enum: request strings are parsed once at the
//! HTTP boundary and anything unknown is rejected before a single byte of
//! upload is decoded.

use crate::error::ConvertError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Raster extensions accepted as uploads (lower-case, with dot).
pub const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".bmp", ".tiff", ".gif", ".webp"];

/// Document extensions accepted as uploads.
pub const PDF_EXTENSIONS: [&str; 1] = [".pdf"];

/// Target format of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpg,
    Png,
    Pdf,
    Docx,
    Pptx,
}

impl OutputFormat {
    /// Every supported output, in the order advertised by the capabilities probe.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Jpg,
        OutputFormat::Png,
        OutputFormat::Pdf,
        OutputFormat::Docx,
        OutputFormat::Pptx,
    ];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
            OutputFormat::Pptx => "pptx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension() == normalized)
            .ok_or(ConvertError::UnsupportedOutputFormat { format: normalized })
    }
}

/// How an upload is decoded, decided by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Pdf,
}

impl InputKind {
    /// Classify a filename. Returns the lower-case extension (with dot, or
    /// empty) alongside the kind so callers can report what was rejected.
    pub fn classify(file_name: &str) -> (Option<InputKind>, String) {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();

        let kind = if PDF_EXTENSIONS.contains(&ext.as_str()) {
            Some(InputKind::Pdf)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(InputKind::Image)
        } else {
            None
        };
        (kind, ext)
    }
}
