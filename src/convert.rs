//! Request orchestration: uploads in, output files out.
//!
//! [`Converter`] is stateless apart from its rasterizer handle and the
//! document title, so one instance is shared by every request. Both entry
//! points are synchronous and CPU-bound; the HTTP layer runs them on the
//! blocking pool.
//!
//! ```text
//! uploads ──▶ decode (fold) ──▶ [collage] ──▶ export table ──▶ files
//!               │
//!               └─▶ skipped: Vec<FileError>
//! ```

use crate::config::ServerConfig;
use crate::error::{ConvertError, FileError};
use crate::export::{self, ExportContext, OutputFile};
use crate::format::OutputFormat;
use crate::pipeline::collage::{self, CollageConfig};
use crate::pipeline::compress::{compress, TargetEncoding};
use crate::pipeline::decode::{decode_all, Upload};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Minimum number of usable images for the dedicated collage operation.
pub const MIN_COLLAGE_IMAGES: usize = 2;

/// A batch conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub uploads: Vec<Upload>,
    pub output_format: OutputFormat,
    /// Byte budget for each JPEG/PNG output.
    pub budget: u64,
    /// Merge all images into one collage first (only when more than one
    /// image decodes).
    pub collage: Option<CollageConfig>,
    /// Uploads that already failed before decoding (e.g. bad base64).
    pub rejected: Vec<FileError>,
}

/// Outcome of [`Converter::convert`].
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub files: Vec<OutputFile>,
    /// Number of images handed to the exporter (1 after a collage).
    pub total_processed: usize,
    pub output_format: OutputFormat,
    /// Uploads that were skipped.
    pub skipped: Vec<FileError>,
}

/// A standalone collage.
#[derive(Debug, Clone)]
pub struct CollageRequest {
    pub uploads: Vec<Upload>,
    pub config: CollageConfig,
    pub encoding: TargetEncoding,
    pub budget: u64,
    pub rejected: Vec<FileError>,
}

/// Outcome of [`Converter::collage`].
#[derive(Debug, Clone)]
pub struct CollageResult {
    pub file: OutputFile,
    pub images_used: usize,
    pub skipped: Vec<FileError>,
}

/// Runs conversions against a [`Rasterizer`].
#[derive(Clone)]
pub struct Converter {
    rasterizer: Arc<dyn Rasterizer>,
    title: String,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl Converter {
    pub fn new(rasterizer: Arc<dyn Rasterizer>, title: impl Into<String>) -> Self {
        Self {
            rasterizer,
            title: title.into(),
        }
    }

    /// Converter backed by pdfium, bound as the config directs.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(PdfiumRasterizer::from_config(config)),
            config.document_title.clone(),
        )
    }

    /// Decode, optionally collage, and export a batch.
    ///
    /// # Errors
    /// [`ConvertError::NoFilesProvided`] for an empty upload list,
    /// [`ConvertError::NoUsableImages`] when every upload was skipped, and
    /// any encoder/exporter failure.
    pub fn convert(&self, request: ConversionRequest) -> Result<ConversionResult, ConvertError> {
        let start = Instant::now();
        if request.uploads.is_empty() && request.rejected.is_empty() {
            return Err(ConvertError::NoFilesProvided);
        }
        info!(
            files = request.uploads.len() + request.rejected.len(),
            format = %request.output_format,
            budget = request.budget,
            "Starting conversion"
        );

        let batch = decode_all(&request.uploads, self.rasterizer.as_ref(), request.rejected);
        if batch.images.is_empty() {
            return Err(ConvertError::NoUsableImages {
                skipped: batch.failures.len(),
            });
        }

        let images = match request.collage {
            Some(config) if batch.images.len() > 1 => {
                debug!(
                    images = batch.images.len(),
                    layout = ?config.layout,
                    "Merging into collage"
                );
                vec![collage::compose(&batch.images, &config)?]
            }
            _ => batch.images,
        };

        let ctx = ExportContext::new(request.budget, self.title.clone());
        let files = export::export(request.output_format, &images, &ctx)?;

        info!(
            files = files.len(),
            images = images.len(),
            skipped = batch.failures.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Conversion complete"
        );

        Ok(ConversionResult {
            files,
            total_processed: images.len(),
            output_format: request.output_format,
            skipped: batch.failures,
        })
    }

    /// Decode at least two images and merge them into one compressed collage.
    ///
    /// # Errors
    /// [`ConvertError::NoFilesProvided`] for an empty upload list and
    /// [`ConvertError::NotEnoughImages`] when fewer than two images decode.
    pub fn collage(&self, request: CollageRequest) -> Result<CollageResult, ConvertError> {
        let start = Instant::now();
        if request.uploads.is_empty() && request.rejected.is_empty() {
            return Err(ConvertError::NoFilesProvided);
        }

        let batch = decode_all(&request.uploads, self.rasterizer.as_ref(), request.rejected);
        if batch.images.len() < MIN_COLLAGE_IMAGES {
            return Err(ConvertError::NotEnoughImages {
                found: batch.images.len(),
                required: MIN_COLLAGE_IMAGES,
            });
        }

        let canvas = collage::compose(&batch.images, &request.config)?;
        let bytes = compress(&canvas, request.budget, request.encoding)?;
        let extension = match request.encoding {
            TargetEncoding::Png => "png",
            TargetEncoding::Jpeg => "jpg",
        };

        info!(
            images = batch.images.len(),
            width = canvas.width(),
            height = canvas.height(),
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Collage complete"
        );

        Ok(CollageResult {
            file: OutputFile::new(format!("collage.{extension}"), bytes),
            images_used: batch.images.len(),
            skipped: batch.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_png;
    use image::{DynamicImage, Rgb, RgbImage};

    /// Every `%PDF` input has `pages` pages of 30×40.
    struct FakeRasterizer {
        pages: usize,
    }

    impl Rasterizer for FakeRasterizer {
        fn rasterize(
            &self,
            pdf: &[u8],
            on_page: &mut dyn FnMut(usize, DynamicImage),
        ) -> Result<usize, ConvertError> {
            crate::pipeline::render::check_pdf_magic(pdf)?;
            for i in 0..self.pages {
                let page = RgbImage::from_pixel(30, 40, Rgb([i as u8, 0, 0]));
                on_page(i, DynamicImage::ImageRgb8(page));
            }
            Ok(self.pages)
        }
    }

    fn converter(pages: usize) -> Converter {
        Converter::new(Arc::new(FakeRasterizer { pages }), "Converted Images")
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([0, 200, 0])))).unwrap()
    }

    fn request(uploads: Vec<Upload>, format: OutputFormat) -> ConversionRequest {
        ConversionRequest {
            uploads,
            output_format: format,
            budget: 500 * 1024,
            collage: None,
            rejected: Vec::new(),
        }
    }

    #[test]
    fn five_page_pdf_becomes_one_five_page_pdf() {
        let req = request(vec![Upload::new("doc.pdf", b"%PDF-1.7".to_vec())], OutputFormat::Pdf);
        let result = converter(5).convert(req).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "converted_images.pdf");
        assert_eq!(result.total_processed, 5);
        let doc = lopdf::Document::load_mem(&result.files[0].bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn unsupported_uploads_are_skipped() {
        let req = request(
            vec![
                Upload::new("a.png", png(10, 10)),
                Upload::new("notes.txt", b"hi".to_vec()),
            ],
            OutputFormat::Jpg,
        );
        let result = converter(0).convert(req).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].name, "converted_1.jpg");
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].file_name(), "notes.txt");
    }

    #[test]
    fn nothing_usable_is_an_error() {
        let req = request(vec![Upload::new("notes.txt", b"hi".to_vec())], OutputFormat::Jpg);
        assert!(matches!(
            converter(0).convert(req),
            Err(ConvertError::NoUsableImages { skipped: 1 })
        ));
    }

    #[test]
    fn empty_request_is_no_files() {
        assert!(matches!(
            converter(0).convert(request(Vec::new(), OutputFormat::Png)),
            Err(ConvertError::NoFilesProvided)
        ));
    }

    #[test]
    fn collage_option_merges_multiple_images() {
        let mut req = request(
            vec![Upload::new("a.png", png(100, 100)), Upload::new("b.png", png(200, 50))],
            OutputFormat::Png,
        );
        req.collage = Some(CollageConfig::default());
        let result = converter(0).convert(req).unwrap();
        assert_eq!(result.total_processed, 1);
        assert_eq!(result.files.len(), 1);
        let img = image::load_from_memory(&result.files[0].bytes).unwrap();
        // Two images → 2 columns × 1 row of 200×100 cells, 10px gap.
        assert_eq!((img.width(), img.height()), (410, 100));
    }

    #[test]
    fn collage_option_ignored_for_single_image() {
        let mut req = request(vec![Upload::new("a.png", png(12, 8))], OutputFormat::Png);
        req.collage = Some(CollageConfig::default());
        let result = converter(0).convert(req).unwrap();
        let img = image::load_from_memory(&result.files[0].bytes).unwrap();
        assert_eq!((img.width(), img.height()), (12, 8));
    }

    fn collage_request(uploads: Vec<Upload>, encoding: TargetEncoding) -> CollageRequest {
        CollageRequest {
            uploads,
            config: CollageConfig::default(),
            encoding,
            budget: 500 * 1024,
            rejected: Vec::new(),
        }
    }

    #[test]
    fn collage_needs_two_images() {
        let req = collage_request(vec![Upload::new("a.png", png(10, 10))], TargetEncoding::Jpeg);
        let err = converter(0).collage(req).unwrap_err();
        assert!(matches!(err, ConvertError::NotEnoughImages { found: 1, required: 2 }));
        assert!(err.to_string().starts_with("At least 2 images required for collage"));
    }

    #[test]
    fn collage_counts_pdf_pages() {
        let req = collage_request(
            vec![Upload::new("doc.pdf", b"%PDF-1.4".to_vec())],
            TargetEncoding::Png,
        );
        let result = converter(3).collage(req).unwrap();
        assert_eq!(result.images_used, 3);
        assert_eq!(result.file.name, "collage.png");
    }

    #[test]
    fn collage_jpeg_is_named_jpg() {
        let req = collage_request(
            vec![Upload::new("a.png", png(10, 10)), Upload::new("b.png", png(10, 10))],
            TargetEncoding::Jpeg,
        );
        let result = converter(0).collage(req).unwrap();
        assert_eq!(result.file.name, "collage.jpg");
        assert_eq!(result.file.bytes[..2], [0xFF, 0xD8]);
    }
}
