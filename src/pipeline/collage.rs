//! Collage composition: lay out N bitmaps on one uniform-cell canvas.
//!
//! Every cell is as large as the largest input in each dimension. Images are
//! shrunk (never enlarged) to fit their cell with aspect ratio preserved and
//! centered inside it. Cells are filled row-major in input order.
//!
//! ```text
//!  ┌──────┐ s ┌──────┐
//!  │ img0 │   │ img1 │     cols = ceil(sqrt(N)) for grid
//!  └──────┘   └──────┘     width  = cols·cellW + (cols−1)·s
//!     s                    height = rows·cellH + (rows−1)·s
//!  ┌──────┐
//!  │ img2 │
//!  └──────┘
//! ```

use crate::error::ConvertError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use serde::Serialize;
use tracing::debug;

/// Largest canvas, in pixels, a collage may allocate (1 GiB of RGBA).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 28;

/// How cells are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Near-square grid (default).
    #[default]
    Grid,
    /// One row.
    Horizontal,
    /// One column.
    Vertical,
}

impl LayoutMode {
    /// Parse a layout name. Unknown names fall back to [`LayoutMode::Grid`].
    pub fn parse_or_grid(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "grid" => LayoutMode::Grid,
            "horizontal" => LayoutMode::Horizontal,
            "vertical" => LayoutMode::Vertical,
            other => {
                debug!(layout = other, "Unknown collage layout, using grid");
                LayoutMode::Grid
            }
        }
    }

    /// `(columns, rows)` for `count` images. `count` must be ≥ 1.
    pub fn grid_dimensions(self, count: u32) -> (u32, u32) {
        match self {
            LayoutMode::Horizontal => (count, 1),
            LayoutMode::Vertical => (1, count),
            LayoutMode::Grid => {
                let cols = ceil_sqrt(count);
                (cols, count.div_ceil(cols))
            }
        }
    }
}

/// Layout parameters of a collage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollageConfig {
    pub layout: LayoutMode,
    /// Gap between cells in pixels.
    pub spacing: u32,
    pub background: Rgb<u8>,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Grid,
            spacing: 10,
            background: Rgb([255, 255, 255]),
        }
    }
}

/// Resolved geometry of a collage, computed before any pixel is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollagePlan {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub spacing: u32,
}

impl CollagePlan {
    /// Compute the plan for images of the given `(width, height)` sizes.
    ///
    /// # Errors
    /// [`ConvertError::EmptyCollage`] for no images and
    /// [`ConvertError::CollageTooLarge`] when the canvas would exceed
    /// [`MAX_CANVAS_PIXELS`] or a `u32` side.
    pub fn new(
        sizes: &[(u32, u32)],
        layout: LayoutMode,
        spacing: u32,
    ) -> Result<Self, ConvertError> {
        if sizes.is_empty() {
            return Err(ConvertError::EmptyCollage);
        }
        let count = u32::try_from(sizes.len()).map_err(|_| too_large())?;
        let (columns, rows) = layout.grid_dimensions(count);
        let cell_width = sizes.iter().map(|&(w, _)| w).max().unwrap_or(1).max(1);
        let cell_height = sizes.iter().map(|&(_, h)| h).max().unwrap_or(1).max(1);

        let canvas_width = span(columns, cell_width, spacing).ok_or_else(too_large)?;
        let canvas_height = span(rows, cell_height, spacing).ok_or_else(too_large)?;
        if u64::from(canvas_width) * u64::from(canvas_height) > MAX_CANVAS_PIXELS {
            return Err(too_large());
        }

        Ok(Self {
            columns,
            rows,
            cell_width,
            cell_height,
            canvas_width,
            canvas_height,
            spacing,
        })
    }

    /// Top-left corner of cell `index` (row-major).
    pub fn cell_origin(&self, index: u32) -> (u32, u32) {
        let row = index / self.columns;
        let col = index % self.columns;
        (
            col.saturating_mul(self.cell_width.saturating_add(self.spacing)),
            row.saturating_mul(self.cell_height.saturating_add(self.spacing)),
        )
    }

    /// Size an image of `width × height` takes inside a cell.
    pub fn fitted_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = (f64::from(self.cell_width) / f64::from(width))
            .min(f64::from(self.cell_height) / f64::from(height))
            .min(1.0);
        let w = ((f64::from(width) * scale) as u32).max(1);
        let h = ((f64::from(height) * scale) as u32).max(1);
        (w, h)
    }
}

/// `count` cells of `cell` pixels separated by `spacing`, if it fits a `u32`.
fn span(count: u32, cell: u32, spacing: u32) -> Option<u32> {
    let cells = u64::from(count).checked_mul(u64::from(cell))?;
    let gaps = u64::from(count.saturating_sub(1)).checked_mul(u64::from(spacing))?;
    u32::try_from(cells.checked_add(gaps)?).ok()
}

fn too_large() -> ConvertError {
    ConvertError::CollageTooLarge {
        limit: MAX_CANVAS_PIXELS,
    }
}

/// Compose `images` into a single opaque RGB canvas.
pub fn compose(
    images: &[DynamicImage],
    config: &CollageConfig,
) -> Result<DynamicImage, ConvertError> {
    let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();
    let plan = CollagePlan::new(&sizes, config.layout, config.spacing)?;
    debug!(
        images = images.len(),
        columns = plan.columns,
        rows = plan.rows,
        width = plan.canvas_width,
        height = plan.canvas_height,
        "Composing collage"
    );

    let [r, g, b] = config.background.0;
    let background = Rgba([r, g, b, 255]);
    let mut canvas = RgbaImage::from_pixel(plan.canvas_width, plan.canvas_height, background);

    for (index, img) in images.iter().enumerate() {
        let (w, h) = plan.fitted_size(img.width(), img.height());
        let tile = if (w, h) == (img.width(), img.height()) {
            img.to_rgba8()
        } else {
            imageops::resize(&img.to_rgba8(), w, h, FilterType::Lanczos3)
        };

        let (cell_x, cell_y) = plan.cell_origin(index as u32);
        let x = cell_x + (plan.cell_width - w) / 2;
        let y = cell_y + (plan.cell_height - h) / 2;
        imageops::overlay(&mut canvas, &tile, i64::from(x), i64::from(y));
    }

    Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()))
}

/// Smallest `c` with `c * c >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let mut c = (f64::from(n)).sqrt() as u32;
    while c * c < n {
        c += 1;
    }
    while c > 1 && (c - 1) * (c - 1) >= n {
        c -= 1;
    }
    c.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
    }

    #[test]
    fn ceil_sqrt_matches_definition() {
        let expected = [(1, 1), (2, 2), (3, 2), (4, 2), (5, 3), (9, 3), (10, 4), (16, 4), (17, 5)];
        for (n, c) in expected {
            assert_eq!(ceil_sqrt(n), c, "n={n}");
        }
    }

    #[test]
    fn grid_dimensions_follow_formula() {
        for n in 1..=30u32 {
            let (cols, rows) = LayoutMode::Grid.grid_dimensions(n);
            let expect_cols = (f64::from(n)).sqrt().ceil() as u32;
            assert_eq!(cols, expect_cols, "n={n}");
            assert_eq!(rows, n.div_ceil(expect_cols), "n={n}");
            assert!(cols * rows >= n);
        }
    }

    #[test]
    fn horizontal_and_vertical_dimensions() {
        for n in 1..=8u32 {
            assert_eq!(LayoutMode::Horizontal.grid_dimensions(n), (n, 1));
            assert_eq!(LayoutMode::Vertical.grid_dimensions(n), (1, n));
        }
    }

    #[test]
    fn unknown_layout_falls_back_to_grid() {
        assert_eq!(LayoutMode::parse_or_grid("spiral"), LayoutMode::Grid);
        assert_eq!(LayoutMode::parse_or_grid("HORIZONTAL"), LayoutMode::Horizontal);
        assert_eq!(LayoutMode::parse_or_grid(" vertical "), LayoutMode::Vertical);
    }

    #[test]
    fn three_mixed_images_on_grid() {
        let images = [
            solid(100, 100, [255, 0, 0]),
            solid(200, 50, [0, 255, 0]),
            solid(50, 200, [0, 0, 255]),
        ];
        let sizes: Vec<_> = images.iter().map(|i| (i.width(), i.height())).collect();
        let plan = CollagePlan::new(&sizes, LayoutMode::Grid, 10).unwrap();
        assert_eq!((plan.columns, plan.rows), (2, 2));
        assert_eq!((plan.cell_width, plan.cell_height), (200, 200));
        assert_eq!((plan.canvas_width, plan.canvas_height), (410, 410));

        let config = CollageConfig {
            layout: LayoutMode::Grid,
            spacing: 10,
            background: Rgb([255, 255, 255]),
        };
        let out = compose(&images, &config).unwrap();
        assert_eq!((out.width(), out.height()), (410, 410));
        assert!(!out.color().has_alpha());

        let rgb = out.to_rgb8();
        // img0: 100×100 centered in cell (0,0) → spans 50..150.
        assert_eq!(rgb.get_pixel(100, 100), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(10, 10), &Rgb([255, 255, 255]));
        // img1: 200×50 in cell (210,0) → rows 75..125.
        assert_eq!(rgb.get_pixel(310, 100), &Rgb([0, 255, 0]));
        assert_eq!(rgb.get_pixel(310, 10), &Rgb([255, 255, 255]));
        // img2: 50×200 in cell (0,210) → columns 75..125.
        assert_eq!(rgb.get_pixel(100, 310), &Rgb([0, 0, 255]));
        // Gap between cells is background.
        assert_eq!(rgb.get_pixel(205, 100), &Rgb([255, 255, 255]));
        // Unused fourth cell is background.
        assert_eq!(rgb.get_pixel(310, 310), &Rgb([255, 255, 255]));
    }

    #[test]
    fn single_image_canvas_equals_image() {
        let out = compose(&[solid(123, 45, [9, 9, 9])], &CollageConfig::default()).unwrap();
        assert_eq!((out.width(), out.height()), (123, 45));
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([9, 9, 9]));
    }

    #[test]
    fn horizontal_canvas_size() {
        let images = [solid(30, 20, [0; 3]), solid(10, 40, [0; 3]), solid(25, 25, [0; 3])];
        let config = CollageConfig {
            layout: LayoutMode::Horizontal,
            spacing: 5,
            ..CollageConfig::default()
        };
        let out = compose(&images, &config).unwrap();
        assert_eq!((out.width(), out.height()), (3 * 30 + 2 * 5, 40));
    }

    #[test]
    fn vertical_canvas_size() {
        let images = [solid(30, 20, [0; 3]), solid(10, 40, [0; 3])];
        let config = CollageConfig {
            layout: LayoutMode::Vertical,
            spacing: 0,
            ..CollageConfig::default()
        };
        let out = compose(&images, &config).unwrap();
        assert_eq!((out.width(), out.height()), (30, 80));
    }

    #[test]
    fn images_are_never_upscaled() {
        let plan = CollagePlan::new(&[(100, 100), (400, 400)], LayoutMode::Grid, 0).unwrap();
        assert_eq!(plan.fitted_size(100, 100), (100, 100));
        assert_eq!(plan.fitted_size(400, 400), (400, 400));
    }

    #[test]
    fn wide_image_is_fitted_with_aspect_ratio() {
        let plan = CollagePlan::new(&[(400, 100), (100, 200)], LayoutMode::Grid, 0).unwrap();
        // Cell is 400×200; the 400×100 image already fits.
        assert_eq!(plan.fitted_size(400, 100), (400, 100));
        assert_eq!(plan.fitted_size(100, 200), (100, 200));
    }

    #[test]
    fn background_fills_canvas() {
        let images = [solid(10, 10, [0, 0, 0]), solid(10, 10, [0, 0, 0])];
        let config = CollageConfig {
            layout: LayoutMode::Horizontal,
            spacing: 4,
            background: Rgb([12, 34, 56]),
        };
        let out = compose(&images, &config).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(11, 5), &Rgb([12, 34, 56]));
    }

    #[test]
    fn alpha_is_composited_onto_background() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let config = CollageConfig {
            background: Rgb([1, 2, 3]),
            ..CollageConfig::default()
        };
        let out = compose(&[transparent], &config).unwrap().to_rgb8();
        assert_eq!(out.get_pixel(2, 2), &Rgb([1, 2, 3]));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            compose(&[], &CollageConfig::default()),
            Err(ConvertError::EmptyCollage)
        ));
    }

    #[test]
    fn huge_spacing_is_rejected_not_wrapped() {
        let err = CollagePlan::new(&[(10, 10), (10, 10)], LayoutMode::Horizontal, u32::MAX)
            .unwrap_err();
        assert!(matches!(err, ConvertError::CollageTooLarge { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn canvas_over_pixel_limit_is_rejected() {
        // Fits in u32 on each side, but 10 × ~10⁹ pixels is far past the cap.
        let err = CollagePlan::new(&[(10, 10), (10, 10)], LayoutMode::Horizontal, 1_000_000_000)
            .unwrap_err();
        assert!(err.to_string().starts_with("Collage canvas too large"));

        let sizes = [(4000, 3000); 10];
        assert!(CollagePlan::new(&sizes, LayoutMode::Grid, 10).is_ok());
        assert!(CollagePlan::new(&sizes, LayoutMode::Grid, 1_000_000).is_err());
    }

    #[test]
    fn placement_is_row_major() {
        let plan = CollagePlan::new(&[(10, 10); 5], LayoutMode::Grid, 2).unwrap();
        assert_eq!((plan.columns, plan.rows), (3, 2));
        assert_eq!(plan.cell_origin(0), (0, 0));
        assert_eq!(plan.cell_origin(2), (24, 0));
        assert_eq!(plan.cell_origin(3), (0, 12));
        assert_eq!(plan.cell_origin(4), (12, 12));
    }
}
