//! Image encoding: `DynamicImage` → JPEG/PNG bytes, and base64 transport.
//!
//! Uploads and results travel base64-encoded inside JSON, so both directions
//! of the transport encoding live here next to the raster encoders.

use crate::error::ConvertError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, RgbImage};
use std::io::Cursor;
use tracing::trace;

/// Encode an opaque RGB bitmap as baseline JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality.clamp(1, 100));
    img.write_with_encoder(encoder)
        .map_err(|e| ConvertError::Encode {
            format: "JPEG",
            detail: e.to_string(),
        })?;
    trace!(quality, bytes = buf.len(), "Encoded JPEG");
    Ok(buf)
}

/// Encode a bitmap as PNG with the strongest lossless compression.
///
/// The color type is kept when PNG can store it (so alpha survives);
/// high-precision float buffers are narrowed to 8-bit RGBA first.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    let result = match img {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)
        }
        _ => img.write_with_encoder(encoder),
    };
    result.map_err(|e| ConvertError::Encode {
        format: "PNG",
        detail: e.to_string(),
    })?;
    trace!(bytes = buf.len(), "Encoded PNG");
    Ok(buf)
}

/// Base64-encode output bytes for the JSON response.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode base64 upload content.
///
/// Browsers often send `data:<mime>;base64,<payload>` URLs; the prefix is
/// stripped. Embedded whitespace and line breaks are ignored.
pub fn from_base64(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match content.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => content,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(cleaned)
}
