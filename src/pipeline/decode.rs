//! Upload decoding: turn `(filename, bytes)` uploads into bitmaps.
//!
//! Each upload is classified by extension. Images are decoded directly
//! (sniffing the magic bytes first, so a PNG named `.jpg` still works); PDFs
//! expand into one bitmap per page via the [`Rasterizer`]. A failure on one
//! file is recorded and the fold moves on; only the orchestrator decides
//! whether an empty result is fatal.

use crate::error::FileError;
use crate::format::InputKind;
use crate::pipeline::render::Rasterizer;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use tracing::{debug, warn};

/// A raw upload after transport decoding.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of decoding a batch: bitmaps in upload order (PDF pages inline)
/// plus every file that was skipped.
#[derive(Debug, Default)]
pub struct DecodedBatch {
    pub images: Vec<DynamicImage>,
    pub failures: Vec<FileError>,
}

impl DecodedBatch {
    /// Start from failures already collected upstream (e.g. bad base64).
    pub fn with_failures(failures: Vec<FileError>) -> Self {
        Self {
            images: Vec::new(),
            failures,
        }
    }

    /// Decode one upload into the batch.
    pub fn push(mut self, upload: &Upload, rasterizer: &dyn Rasterizer) -> Self {
        match decode_upload(upload, rasterizer) {
            Ok(images) => {
                debug!(file = %upload.name, images = images.len(), "Decoded upload");
                self.images.extend(images);
            }
            Err(failure) => {
                warn!(file = %upload.name, error = %failure, "Skipping upload");
                self.failures.push(failure);
            }
        }
        self
    }
}

/// Decode every upload in order, accumulating successes and failures.
pub fn decode_all(
    uploads: &[Upload],
    rasterizer: &dyn Rasterizer,
    prior_failures: Vec<FileError>,
) -> DecodedBatch {
    uploads
        .iter()
        .fold(DecodedBatch::with_failures(prior_failures), |batch, upload| {
            batch.push(upload, rasterizer)
        })
}

/// Decode a single upload into one or more bitmaps.
pub fn decode_upload(
    upload: &Upload,
    rasterizer: &dyn Rasterizer,
) -> Result<Vec<DynamicImage>, FileError> {
    let (kind, extension) = InputKind::classify(&upload.name);
    match kind {
        Some(InputKind::Image) => decode_image(&upload.bytes)
            .map(|img| vec![img])
            .map_err(|detail| FileError::DecodeFailed {
                name: upload.name.clone(),
                detail,
            }),
        Some(InputKind::Pdf) => {
            rasterizer
                .rasterize_all(&upload.bytes)
                .map_err(|e| FileError::PdfFailed {
                    name: upload.name.clone(),
                    detail: e.to_string(),
                })
        }
        None => Err(FileError::UnsupportedExtension {
            name: upload.name.clone(),
            extension,
        }),
    }
}

/// Decode image bytes, trusting magic bytes over the file extension.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, String> {
    if bytes.is_empty() {
        return Err("file is empty".to_string());
    }
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())
}
