//! Error types for the pixdoc library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the request cannot produce any output
//!   (no files, unsupported output format, nothing decodable, encoder
//!   failure). Returned as `Err(ConvertError)` from the [`crate::convert`]
//!   entry points and mapped to an HTTP status by [`crate::server`].
//!
//! * [`FileError`] — **Non-fatal**: a single upload could not be used
//!   (unknown extension, bad base64, corrupt image) but the rest of the batch
//!   is fine. Collected in [`crate::convert::ConversionResult::skipped`] so a
//!   batch never aborts because of one bad file.

use thiserror::Error;

/// All fatal errors returned by the pixdoc library.
///
/// Per-file failures use [`FileError`] and are collected rather than
/// propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request body carried no `files` array.
    #[error("No files provided")]
    NoFilesProvided,

    /// The requested output format is not one of jpg, png, pdf, docx, pptx.
    #[error("Unsupported output format: {format}")]
    UnsupportedOutputFormat { format: String },

    /// Every upload was skipped; there is nothing to convert.
    #[error("No valid images to process")]
    NoUsableImages { skipped: usize },

    /// The collage endpoint received fewer usable images than it needs.
    #[error("At least {required} images required for collage (got {found})")]
    NotEnoughImages { found: usize, required: usize },

    /// The composer was called with an empty image sequence.
    #[error("No images provided for collage")]
    EmptyCollage,

    /// The collage canvas would be larger than the server allocates.
    #[error("Collage canvas too large: more than {limit} pixels")]
    CollageTooLarge { limit: u64 },

    /// The background color string is neither a known name nor hex.
    #[error("Invalid background color '{0}': expected a color name or #rrggbb")]
    InvalidColor(String),

    /// The request body could not be parsed.
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    // ── Image errors ──────────────────────────────────────────────────────
    /// Encoded image bytes could not be decoded.
    #[error("Image decode failed: {0}")]
    Decode(#[source] image::ImageError),

    /// An encoder rejected the bitmap.
    #[error("{format} encoding failed: {detail}")]
    Encode {
        format: &'static str,
        detail: String,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Bytes handed to the rasterizer do not start with the `%PDF` magic.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium on the library path."
    )]
    PdfiumBindingFailed(String),

    // ── Export errors ─────────────────────────────────────────────────────
    /// The document container (PDF/DOCX/PPTX) could not be assembled.
    #[error("{format} export failed: {detail}")]
    Export {
        format: &'static str,
        detail: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Whether the caller is at fault (HTTP 4xx) rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::NoFilesProvided
                | ConvertError::UnsupportedOutputFormat { .. }
                | ConvertError::NoUsableImages { .. }
                | ConvertError::NotEnoughImages { .. }
                | ConvertError::CollageTooLarge { .. }
                | ConvertError::InvalidColor(_)
                | ConvertError::InvalidRequest(_)
        )
    }
}

/// A non-fatal error for a single uploaded file.
///
/// The batch continues; the error is logged and reported alongside the
/// successful outputs.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FileError {
    /// Extension is not one of the supported input types.
    #[error("{name}: unsupported file format '{extension}'")]
    UnsupportedExtension { name: String, extension: String },

    /// The base64 transport encoding was invalid.
    #[error("{name}: invalid base64 content: {detail}")]
    InvalidBase64 { name: String, detail: String },

    /// The image bytes could not be decoded.
    #[error("{name}: image decode failed: {detail}")]
    DecodeFailed { name: String, detail: String },

    /// The PDF could not be rasterised.
    #[error("{name}: PDF rasterisation failed: {detail}")]
    PdfFailed { name: String, detail: String },
}

impl FileError {
    /// Name of the upload this error refers to.
    pub fn file_name(&self) -> &str {
        match self {
            FileError::UnsupportedExtension { name, .. }
            | FileError::InvalidBase64 { name, .. }
            | FileError::DecodeFailed { name, .. }
            | FileError::PdfFailed { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = ConvertError::UnsupportedOutputFormat {
            format: "tiff".into(),
        };
        assert_eq!(e.to_string(), "Unsupported output format: tiff");
        assert!(e.is_client_error());
    }

    #[test]
    fn not_enough_images_display() {
        let e = ConvertError::NotEnoughImages {
            found: 1,
            required: 2,
        };
        let msg = e.to_string();
        assert!(msg.contains("At least 2 images required for collage"), "got: {msg}");
        assert!(e.is_client_error());
    }

    #[test]
    fn server_side_errors_are_not_client_errors() {
        assert!(!ConvertError::Internal("boom".into()).is_client_error());
        assert!(!ConvertError::EmptyCollage.is_client_error());
        assert!(!ConvertError::Export {
            format: "DOCX",
            detail: "zip".into()
        }
        .is_client_error());
    }

    #[test]
    fn file_error_serialises_with_reason_tag() {
        let e = FileError::UnsupportedExtension {
            name: "notes.txt".into(),
            extension: ".txt".into(),
        };
        assert_eq!(e.file_name(), "notes.txt");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["reason"], "unsupported_extension");
        assert_eq!(json["name"], "notes.txt");
    }
}
