//! Format exporters: a bitmap sequence → output files.
//!
//! Every [`OutputFormat`] maps to exactly one exporter through [`exporter`].
//! Raster formats produce one file per bitmap (`converted_1.jpg`, …); the
//! document formats wrap the whole sequence into a single container
//! (`converted_images.pdf|docx|pptx`).

mod docx;
mod ooxml;
mod pdf;
mod pptx;

use crate::error::ConvertError;
use crate::format::OutputFormat;
use crate::pipeline::compress::{compress, TargetEncoding};
use chrono::{Local, NaiveDateTime};
use image::DynamicImage;
use tracing::info;

pub use docx::images_to_docx;
pub use pdf::images_to_pdf;
pub use pptx::images_to_pptx;

/// Base name shared by the container outputs.
pub const CONTAINER_STEM: &str = "converted_images";

/// One produced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Per-request export parameters.
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Byte budget for each raster output.
    pub budget: u64,
    /// Title written into DOCX and PPTX documents.
    pub title: String,
    /// Timestamp shown on the PPTX title slide.
    pub generated_at: NaiveDateTime,
}

impl ExportContext {
    /// Context stamped with the current local time.
    pub fn new(budget: u64, title: impl Into<String>) -> Self {
        Self {
            budget,
            title: title.into(),
            generated_at: Local::now().naive_local(),
        }
    }
}

/// What an exporter returns.
pub type Exported = Result<Vec<OutputFile>, ConvertError>;

/// Signature shared by every exporter.
pub type ExportFn = fn(&[DynamicImage], &ExportContext) -> Exported;

/// The exporter for `format`.
pub fn exporter(format: OutputFormat) -> ExportFn {
    match format {
        OutputFormat::Jpg => export_jpg,
        OutputFormat::Png => export_png,
        OutputFormat::Pdf => export_pdf,
        OutputFormat::Docx => export_docx,
        OutputFormat::Pptx => export_pptx,
    }
}

/// Export `images` as `format`.
pub fn export(
    format: OutputFormat,
    images: &[DynamicImage],
    ctx: &ExportContext,
) -> Result<Vec<OutputFile>, ConvertError> {
    let files = exporter(format)(images, ctx)?;
    info!(
        format = %format,
        images = images.len(),
        files = files.len(),
        bytes = files.iter().map(OutputFile::size).sum::<usize>(),
        "Export complete"
    );
    Ok(files)
}

fn export_raster(
    images: &[DynamicImage],
    budget: u64,
    target: TargetEncoding,
    extension: &str,
) -> Result<Vec<OutputFile>, ConvertError> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let bytes = compress(image, budget, target)?;
            Ok(OutputFile::new(format!("converted_{}.{extension}", i + 1), bytes))
        })
        .collect()
}

fn export_jpg(images: &[DynamicImage], ctx: &ExportContext) -> Exported {
    export_raster(images, ctx.budget, TargetEncoding::Jpeg, "jpg")
}

fn export_png(images: &[DynamicImage], ctx: &ExportContext) -> Exported {
    export_raster(images, ctx.budget, TargetEncoding::Png, "png")
}

fn export_pdf(images: &[DynamicImage], ctx: &ExportContext) -> Exported {
    let bytes = images_to_pdf(images, &ctx.title)?;
    Ok(vec![OutputFile::new(format!("{CONTAINER_STEM}.pdf"), bytes)])
}

fn export_docx(images: &[DynamicImage], ctx: &ExportContext) -> Exported {
    let bytes = images_to_docx(images, &ctx.title)?;
    Ok(vec![OutputFile::new(format!("{CONTAINER_STEM}.docx"), bytes)])
}

fn export_pptx(images: &[DynamicImage], ctx: &ExportContext) -> Exported {
    let bytes = images_to_pptx(images, &ctx.title, ctx.generated_at)?;
    Ok(vec![OutputFile::new(format!("{CONTAINER_STEM}.pptx"), bytes)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn images(n: usize) -> Vec<DynamicImage> {
        (0..n)
            .map(|i| {
                let width = 40 + i as u32;
                DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 30, Rgb([200, 10, 10])))
            })
            .collect()
    }

    fn ctx() -> ExportContext {
        ExportContext::new(500 * 1024, "Converted Images")
    }

    #[test]
    fn each_format_dispatches_to_its_own_exporter() {
        let expected: [(OutputFormat, &[u8]); 5] = [
            (OutputFormat::Jpg, &[0xFF, 0xD8]),
            (OutputFormat::Png, b"\x89PNG"),
            (OutputFormat::Pdf, b"%PDF"),
            (OutputFormat::Docx, b"PK"),
            (OutputFormat::Pptx, b"PK"),
        ];
        for (format, magic) in expected {
            let files = exporter(format)(&images(1), &ctx()).unwrap();
            assert!(files[0].bytes.starts_with(magic), "{format}");
            assert!(files[0].name.ends_with(format.extension()), "{format}");
        }
    }

    #[test]
    fn raster_exports_are_numbered_from_one() {
        let files = export(OutputFormat::Jpg, &images(3), &ctx()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["converted_1.jpg", "converted_2.jpg", "converted_3.jpg"]);
        assert!(files.iter().all(|f| f.bytes.starts_with(&[0xFF, 0xD8])));

        let files = export(OutputFormat::Png, &images(2), &ctx()).unwrap();
        assert_eq!(files[1].name, "converted_2.png");
        assert!(files[0].bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn container_exports_produce_one_file() {
        for (format, name) in [
            (OutputFormat::Pdf, "converted_images.pdf"),
            (OutputFormat::Docx, "converted_images.docx"),
            (OutputFormat::Pptx, "converted_images.pptx"),
        ] {
            let files = export(format, &images(3), &ctx()).unwrap();
            assert_eq!(files.len(), 1);
            assert_eq!(files[0].name, name);
            assert_eq!(files[0].size(), files[0].bytes.len());
            assert!(files[0].size() > 0);
        }
    }
}
