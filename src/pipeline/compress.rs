//! Size-targeted compression: re-encode a bitmap until it fits a byte budget.
//!
//! JPEG output walks a fixed quality ladder (95 → 20 in steps of 5) and only
//! once the floor is reached starts shrinking the image by 10 % per step.
//! The first encoding under budget wins, so the result is always the least
//! aggressive reduction that fits. When nothing fits (tiny budget, noisy
//! image) the smallest encoding attempted is returned instead of an error.
//!
//! PNG output is lossless: it is encoded once with maximum compression and
//! returned regardless of size, because dropping quality is not an option
//! and shrinking would destroy transparency-sensitive artwork.

use crate::error::ConvertError;
use crate::pipeline::color::{flatten, WHITE};
use crate::pipeline::encode::{encode_jpeg, encode_png};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use tracing::{debug, warn};

/// First JPEG quality tried.
pub const MAX_QUALITY: u8 = 95;

/// Lowest JPEG quality the ladder descends to.
pub const MIN_QUALITY: u8 = 20;

/// Quality decrement per step.
pub const QUALITY_STEP: u8 = 5;

/// Per-iteration dimension factor once the quality floor is reached.
pub const SCALE_FACTOR: f64 = 0.9;

/// The shrink loop stops once either dimension falls below this.
pub const MIN_DIMENSION: u32 = 100;

/// Container the compressor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEncoding {
    /// Lossy; alpha is flattened against white.
    Jpeg,
    /// Lossless; alpha preserved, no size search.
    Png,
}

/// Encode `image` to fit within `budget` bytes.
///
/// A budget of 0 can never be met; the smallest attempted encoding is
/// returned after the shrink loop bottoms out.
pub fn compress(
    image: &DynamicImage,
    budget: u64,
    target: TargetEncoding,
) -> Result<Vec<u8>, ConvertError> {
    match target {
        TargetEncoding::Png => {
            let bytes = encode_png(image)?;
            debug!(bytes = bytes.len(), budget, "PNG encoded losslessly");
            Ok(bytes)
        }
        TargetEncoding::Jpeg => compress_jpeg(image, budget),
    }
}

/// Decode `encoded` and compress it. Decode errors propagate unchanged.
pub fn compress_encoded(
    encoded: &[u8],
    budget: u64,
    target: TargetEncoding,
) -> Result<Vec<u8>, ConvertError> {
    let image = image::load_from_memory(encoded).map_err(ConvertError::Decode)?;
    compress(&image, budget, target)
}

fn compress_jpeg(image: &DynamicImage, budget: u64) -> Result<Vec<u8>, ConvertError> {
    let rgb = flatten(image, WHITE);
    let mut best: Option<Vec<u8>> = None;

    for quality in quality_ladder() {
        let bytes = encode_jpeg(&rgb, quality)?;
        if fits(&bytes, budget) {
            debug!(quality, bytes = bytes.len(), budget, "JPEG fits budget");
            return Ok(bytes);
        }
        keep_smallest(&mut best, bytes);
    }

    let (orig_w, orig_h) = rgb.dimensions();
    let mut scale = 1.0_f64;
    loop {
        scale *= SCALE_FACTOR;
        let width = (f64::from(orig_w) * scale) as u32;
        let height = (f64::from(orig_h) * scale) as u32;
        if width == 0 || height == 0 {
            break;
        }

        let resized: RgbImage = imageops::resize(&rgb, width, height, FilterType::Lanczos3);
        let bytes = encode_jpeg(&resized, MIN_QUALITY)?;
        if fits(&bytes, budget) {
            debug!(width, height, bytes = bytes.len(), budget, "Downscaled JPEG fits budget");
            return Ok(bytes);
        }
        keep_smallest(&mut best, bytes);

        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            break;
        }
    }

    // The quality ladder always produces at least one encoding.
    let bytes = best.unwrap_or_default();
    warn!(
        bytes = bytes.len(),
        budget, "Budget unreachable; returning smallest JPEG attempted"
    );
    Ok(bytes)
}

/// 95, 90, …, 20.
fn quality_ladder() -> impl Iterator<Item = u8> {
    (MIN_QUALITY..=MAX_QUALITY)
        .rev()
        .step_by(QUALITY_STEP as usize)
}

fn fits(bytes: &[u8], budget: u64) -> bool {
    budget > 0 && bytes.len() as u64 <= budget
}

fn keep_smallest(best: &mut Option<Vec<u8>>, candidate: Vec<u8>) {
    match best {
        Some(current) if current.len() <= candidate.len() => {}
        _ => *best = Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgba, RgbaImage};

    /// Deterministic noise compresses badly, which forces the shrink loop.
    fn noisy(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x1234_5678;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn ladder_is_95_down_to_20() {
        let steps: Vec<u8> = quality_ladder().collect();
        assert_eq!(steps.first(), Some(&95));
        assert_eq!(steps.last(), Some(&20));
        assert_eq!(steps.len(), 16);
        assert!(steps.windows(2).all(|w| w[0] - w[1] == 5));
    }

    #[test]
    fn generous_budget_returns_first_quality() {
        let img = gradient(64, 64);
        let out = compress(&img, 10 * 1024 * 1024, TargetEncoding::Jpeg).unwrap();
        let q95 = encode_jpeg(&img.to_rgb8(), 95).unwrap();
        assert_eq!(out, q95);
    }

    #[test]
    fn achievable_budget_is_met() {
        let img = noisy(400, 300);
        let budget = 20 * 1024;
        let out = compress(&img, budget, TargetEncoding::Jpeg).unwrap();
        assert!(out.len() as u64 <= budget, "{} > {budget}", out.len());
        assert!(image::load_from_memory(&out).is_ok());
    }

    #[test]
    fn unreachable_budget_stops_at_minimum_dimension() {
        let img = noisy(300, 300);
        let out = compress(&img, 1, TargetEncoding::Jpeg).unwrap();
        assert!(!out.is_empty());
        let decoded = image::load_from_memory(&out).unwrap();
        assert!(decoded.width() < MIN_DIMENSION || decoded.height() < MIN_DIMENSION);
    }

    #[test]
    fn zero_budget_returns_best_effort() {
        let img = noisy(120, 120);
        let out = compress(&img, 0, TargetEncoding::Jpeg).unwrap();
        assert!(!out.is_empty());
        let full = encode_jpeg(&img.to_rgb8(), MIN_QUALITY).unwrap();
        assert!(out.len() <= full.len());
    }

    #[test]
    fn jpeg_flattens_alpha_against_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0])));
        let out = compress(&img, 1024 * 1024, TargetEncoding::Jpeg).unwrap();
        let back = image::load_from_memory(&out).unwrap().to_rgb8();
        let px = back.get_pixel(4, 4);
        assert!(px.0.iter().all(|&c| c > 240), "expected white, got {px:?}");
    }

    #[test]
    fn png_is_lossless_and_ignores_budget() {
        let img = noisy(50, 40);
        let out = compress(&img, 1, TargetEncoding::Png).unwrap();
        let back = image::load_from_memory(&out).unwrap();
        assert_eq!(back.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn malformed_input_propagates_decode_error() {
        assert!(matches!(
            compress_encoded(&[], 1024, TargetEncoding::Jpeg),
            Err(ConvertError::Decode(_))
        ));
        assert!(matches!(
            compress_encoded(b"definitely not an image", 1024, TargetEncoding::Png),
            Err(ConvertError::Decode(_))
        ));
    }

    #[test]
    fn compress_encoded_round_trips_valid_png() {
        let img = gradient(32, 32);
        let png = encode_png(&img).unwrap();
        let out = compress_encoded(&png, 1024 * 1024, TargetEncoding::Jpeg).unwrap();
        assert_eq!(&out[..2], &[0xFF, 0xD8]);
    }
}
