//! Shared plumbing for the OOXML containers (DOCX, PPTX).
//!
//! Both formats are zip archives of XML parts plus binary media. Parts are
//! assembled as strings; text content goes through [`escape_text`].

use crate::error::ConvertError;
use crate::pipeline::encode::encode_png;
use image::DynamicImage;
use quick_xml::escape::escape;
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub(crate) const XML_DECL: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

pub(crate) const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// English Metric Units per inch.
pub(crate) const EMU_PER_INCH: u64 = 914_400;

/// Escape text for element content or attribute values.
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text)
}

/// A relationship entry in a `.rels` part.
pub(crate) struct Relationship<'a> {
    pub id: String,
    pub kind: &'a str,
    pub target: String,
}

/// Render a `.rels` part.
pub(crate) fn relationships_xml(rels: &[Relationship<'_>]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel.kind,
            escape_text(&rel.target)
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// Render `[Content_Types].xml` with png/xml/rels defaults plus overrides.
pub(crate) fn content_types_xml(overrides: &[(String, &str)]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);
    for (part, content_type) in overrides {
        xml.push_str(&format!(
            r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

/// In-memory zip package.
pub(crate) struct Package {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    format: &'static str,
}

impl Package {
    pub fn new(format: &'static str) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            format,
        }
    }

    pub fn add(&mut self, path: &str, contents: &[u8]) -> Result<(), ConvertError> {
        let format = self.format;
        let fail = |detail: String| ConvertError::Export { format, detail };
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(path, options)
            .map_err(|e| fail(format!("{path}: {e}")))?;
        self.writer
            .write_all(contents)
            .map_err(|e| fail(format!("{path}: {e}")))
    }

    pub fn finish(self) -> Result<Vec<u8>, ConvertError> {
        let format = self.format;
        self.writer
            .finish()
            .map(Cursor::into_inner)
            .map_err(|e| ConvertError::Export {
                format,
                detail: e.to_string(),
            })
    }
}

/// An image prepared for embedding: PNG bytes plus pixel size.
pub(crate) struct Media {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Media {
    pub fn from_image(image: &DynamicImage) -> Result<Self, ConvertError> {
        Ok(Self {
            png: encode_png(image)?,
            width: image.width().max(1),
            height: image.height().max(1),
        })
    }

    /// Aspect ratio (width / height).
    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// The `<pic:pic>` element shared by DOCX inline drawings and PPTX slides.
///
/// `id` must be unique within its part; `rel_id` names the image relationship.
pub(crate) fn picture_xml(
    prefix: &str,
    id: usize,
    rel_id: &str,
    x: u64,
    y: u64,
    cx: u64,
    cy: u64,
) -> String {
    format!(
        concat!(
            r#"<{p}:pic{ns}>"#,
            r#"<{p}:nvPicPr><{p}:cNvPr id="{id}" name="Picture {id}"/><{p}:cNvPicPr><a:picLocks noChangeAspect="1"/></{p}:cNvPicPr>{nvpr}</{p}:nvPicPr>"#,
            r#"<{p}:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></{p}:blipFill>"#,
            r#"<{p}:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></{p}:spPr>"#,
            r#"</{p}:pic>"#
        ),
        p = prefix,
        ns = if prefix == "pic" {
            format!(r#" xmlns:pic="{NS_PIC}""#)
        } else {
            String::new()
        },
        nvpr = if prefix == "p" { "<p:nvPr/>" } else { "" },
        id = id,
        rel = rel_id,
        x = x,
        y = y,
        cx = cx,
        cy = cy,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Read};

    /// Read one part of a zip package as UTF-8.
    pub fn read_part(package: &[u8], path: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
        let mut file = archive.by_name(path).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    /// Every part name in the package.
    pub fn part_names(package: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(package)).unwrap();
        archive.file_names().map(str::to_string).collect()
    }

    /// Parse `xml` fully, failing on malformed markup.
    pub fn assert_well_formed(xml: &str) {
        let mut reader = quick_xml::Reader::from_str(xml);
        loop {
            match reader.read_event() {
                Ok(quick_xml::events::Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("malformed XML at {}: {e}", reader.buffer_position()),
            }
        }
    }
}
