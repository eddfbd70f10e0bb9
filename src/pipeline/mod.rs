//! Pipeline stages for image and document conversion.
//!
//! Each submodule implements exactly one transformation step and is
//! synchronous; the HTTP layer runs a whole request on a blocking thread.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ decode ──▶ [collage] ──▶ compress / export
//! (base64)   (image,     (grid/row/    (JPEG ladder, PNG,
//!             pdfium)     column)       PDF/DOCX/PPTX)
//! ```
//!
//! 1. [`decode`]   — classify uploads by extension and decode them; PDFs go
//!    through [`render`] and contribute one bitmap per page
//! 2. [`collage`]  — optionally merge all bitmaps into one canvas
//! 3. [`compress`] — fit a bitmap under a byte budget
//! 4. [`encode`]   — raw JPEG/PNG encoders and base64 transport helpers
//! 5. [`color`]    — background color parsing and alpha flattening

pub mod collage;
pub mod color;
pub mod compress;
pub mod decode;
pub mod encode;
pub mod render;
