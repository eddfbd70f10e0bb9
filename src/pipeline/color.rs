//! Background colors and alpha flattening.
//!
//! JPEG, PDF pages and collage canvases are all opaque, so any alpha or
//! palette image is composited onto a solid color before it reaches them.

use crate::error::ConvertError;
use image::{imageops, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Opaque white, the flattening background for JPEG and PDF output.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Parse a background color: a CSS-style name or `#rgb` / `#rrggbb`.
///
/// `transparent` maps to white since every canvas is opaque.
pub fn parse_color(input: &str) -> Result<Rgb<u8>, ConvertError> {
    let normalized = input.trim().to_ascii_lowercase();
    if let Some(rgb) = named_color(&normalized) {
        return Ok(rgb);
    }
    parse_hex(&normalized).ok_or_else(|| ConvertError::InvalidColor(input.to_string()))
}

fn named_color(name: &str) -> Option<Rgb<u8>> {
    let rgb = match name {
        "white" | "transparent" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "lightgray" | "lightgrey" => [211, 211, 211],
        "darkgray" | "darkgrey" => [169, 169, 169],
        "silver" => [192, 192, 192],
        "orange" => [255, 165, 0],
        "purple" => [128, 0, 128],
        "pink" => [255, 192, 203],
        "brown" => [165, 42, 42],
        "navy" => [0, 0, 128],
        "teal" => [0, 128, 128],
        "beige" => [245, 245, 220],
        _ => return None,
    };
    Some(Rgb(rgb))
}

fn parse_hex(input: &str) -> Option<Rgb<u8>> {
    let hex = input.strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut out = [0u8; 3];
            for (slot, ch) in out.iter_mut().zip(hex.chars()) {
                let v = ch.to_digit(16)? as u8;
                *slot = v * 17;
            }
            Some(Rgb(out))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        _ => None,
    }
}

/// Composite `image` over a solid `background`, dropping alpha.
///
/// Images without an alpha channel are converted directly.
pub fn flatten(image: &DynamicImage, background: Rgb<u8>) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let [r, g, b] = background.0;
    let mut canvas = RgbaImage::from_pixel(image.width(), image.height(), Rgba([r, g, b, 255]));
    imageops::overlay(&mut canvas, &image.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_hex() {
        assert_eq!(parse_color("white").unwrap(), WHITE);
        assert_eq!(parse_color(" Black ").unwrap(), Rgb([0, 0, 0]));
        assert_eq!(parse_color("#FF8000").unwrap(), Rgb([255, 128, 0]));
        assert_eq!(parse_color("#0f0").unwrap(), Rgb([0, 255, 0]));
        assert_eq!(parse_color("grey").unwrap(), parse_color("gray").unwrap());
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "not-a-color", "#12", "#gggggg", "123456", "#1234567"] {
            assert!(
                matches!(parse_color(bad), Err(ConvertError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn flatten_composites_transparent_pixels_onto_background() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let flat = flatten(&DynamicImage::ImageRgba8(img), Rgb([200, 100, 50]));
        assert_eq!(flat.get_pixel(0, 0), &Rgb([200, 100, 50]));
        assert_eq!(flat.get_pixel(1, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn flatten_keeps_opaque_images() {
        let img = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let flat = flatten(&DynamicImage::ImageRgb8(img.clone()), WHITE);
        assert_eq!(flat, img);
    }
}
