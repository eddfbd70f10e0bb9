//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! Pages are rendered at twice the document's native resolution so text in
//! the resulting JPEG/PNG/collage stays legible. Rendering is strictly
//! sequential: each page's pdfium handle and bitmap go out of scope before
//! the next page is touched, and the finished image is handed to the caller's
//! visitor straight away. Peak pdfium memory is therefore one page, however
//! long the document.
//!
//! The [`Rasterizer`] trait is the seam between the orchestrator and pdfium;
//! tests substitute an in-memory implementation.

use crate::config::ServerConfig;
use crate::error::ConvertError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Fixed zoom applied to every page (2× native resolution).
pub const RENDER_ZOOM: f32 = 2.0;

/// Renders PDF bytes page by page.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `pdf` in order, calling `on_page(index, image)`
    /// as each page completes. Returns the number of pages rendered.
    fn rasterize(
        &self,
        pdf: &[u8],
        on_page: &mut dyn FnMut(usize, DynamicImage),
    ) -> Result<usize, ConvertError>;

    /// Convenience: collect every page into a vector.
    fn rasterize_all(&self, pdf: &[u8]) -> Result<Vec<DynamicImage>, ConvertError> {
        let mut pages = Vec::new();
        self.rasterize(pdf, &mut |_, image| pages.push(image))?;
        Ok(pages)
    }
}

/// Reject anything that does not start with the `%PDF` magic before pdfium
/// sees it.
pub fn check_pdf_magic(pdf: &[u8]) -> Result<(), ConvertError> {
    if pdf.len() < 4 || &pdf[..4] != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            magic: pdf.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// [`Rasterizer`] backed by the pdfium shared library.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    library: Option<PathBuf>,
    zoom: f32,
}

impl PdfiumRasterizer {
    /// Bind to the library at `library`, or the system library when None.
    pub fn new(library: Option<PathBuf>) -> Self {
        Self {
            library,
            zoom: RENDER_ZOOM,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.pdfium_library.clone())
    }

    fn bind(&self) -> Result<Pdfium, ConvertError> {
        let bindings = match &self.library {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConvertError::PdfiumBindingFailed(format!("{:?}", e)))?;
        Ok(Pdfium::new(bindings))
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf: &[u8],
        on_page: &mut dyn FnMut(usize, DynamicImage),
    ) -> Result<usize, ConvertError> {
        check_pdf_magic(pdf)?;

        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| ConvertError::CorruptPdf {
                detail: format!("{:?}", e),
            })?;

        let total_pages = document.pages().len() as usize;
        info!(pages = total_pages, "PDF loaded");

        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.zoom);

        for idx in 0..total_pages {
            // Page handle and bitmap are released at the end of this block.
            let image = {
                let page = document.pages().get(idx as u16).map_err(|e| {
                    ConvertError::RasterisationFailed {
                        page: idx + 1,
                        detail: format!("{:?}", e),
                    }
                })?;

                let bitmap = page.render_with_config(&render_config).map_err(|e| {
                    ConvertError::RasterisationFailed {
                        page: idx + 1,
                        detail: format!("{:?}", e),
                    }
                })?;

                bitmap.as_image()
            };

            debug!(
                page = idx + 1,
                width = image.width(),
                height = image.height(),
                "Rendered page"
            );
            on_page(idx, image);
        }

        Ok(total_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_check_rejects_non_pdf() {
        let err = check_pdf_magic(b"\x89PNG\r\n").unwrap_err();
        assert!(matches!(err, ConvertError::NotAPdf { ref magic } if magic == b"\x89PNG"));
        assert!(check_pdf_magic(b"").is_err());
        assert!(check_pdf_magic(b"%PD").is_err());
    }

    #[test]
    fn magic_check_accepts_pdf_header() {
        assert!(check_pdf_magic(b"%PDF-1.7\n...").is_ok());
    }

    #[test]
    fn pdfium_rasterizer_rejects_non_pdf_without_binding() {
        // The magic check runs before pdfium is bound, so this works on
        // machines without the library installed.
        let r = PdfiumRasterizer::new(Some(PathBuf::from("/nonexistent/libpdfium.so")));
        assert!(matches!(
            r.rasterize(b"GIF89a", &mut |_, _| {}),
            Err(ConvertError::NotAPdf { .. })
        ));
    }

    #[test]
    fn default_zoom_is_two() {
        let r = PdfiumRasterizer::new(None);
        assert_eq!(r.zoom, RENDER_ZOOM);
    }
}
