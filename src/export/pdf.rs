//! PDF export via `printpdf`: one page per bitmap.
//!
//! Pages are sized to the bitmap at 72 dpi, so one pixel is one point and the
//! image fills its page exactly. Alpha is flattened against white first.

use crate::error::ConvertError;
use crate::pipeline::color::{flatten, WHITE};
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, warn};

/// Resolution at which one pixel equals one PDF point.
const PAGE_DPI: f32 = 72.0;

/// Build a PDF with one full-bleed page per image.
pub fn images_to_pdf(images: &[DynamicImage], title: &str) -> Result<Vec<u8>, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::Export {
            format: "PDF",
            detail: "no images to write".to_string(),
        });
    }

    let mut doc = PdfDocument::new(title);
    let mut pages = Vec::with_capacity(images.len());

    for (idx, image) in images.iter().enumerate() {
        let rgb = flatten(image, WHITE);
        let (width, height) = rgb.dimensions();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: width as usize,
            height: height as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = doc.add_image(&raw);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(PAGE_DPI),
                rotate: None,
            },
        }];

        debug!(page = idx + 1, width, height, "Added PDF page");
        pages.push(PdfPage::new(px_to_mm(width), px_to_mm(height), ops));
    }

    doc.with_pages(pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!(count = warnings.len(), "printpdf reported warnings while saving");
    }
    Ok(output)
}

fn px_to_mm(px: u32) -> Mm {
    Mm(px as f32 * 25.4 / PAGE_DPI)
}
