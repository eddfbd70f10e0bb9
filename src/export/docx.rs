//! DOCX export: a title heading, then one section per image.
//!
//! Each image gets a "Image {n}" Heading 1, a 6-inch-wide inline picture
//! (height follows the aspect ratio) and a page break.

use super::ooxml::{
    content_types_xml, escape_text, picture_xml, relationships_xml, Media, Package, Relationship,
    EMU_PER_INCH, NS_A, NS_REL, REL_IMAGE, REL_OFFICE_DOCUMENT, XML_DECL,
};
use crate::error::ConvertError;
use image::DynamicImage;
use tracing::debug;

/// Picture width in the document body.
const PICTURE_WIDTH_EMU: u64 = 6 * EMU_PER_INCH;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Build a DOCX document containing every image.
pub fn images_to_docx(images: &[DynamicImage], title: &str) -> Result<Vec<u8>, ConvertError> {
    let media = images
        .iter()
        .map(Media::from_image)
        .collect::<Result<Vec<_>, _>>()?;

    let mut pkg = Package::new("DOCX");
    pkg.add(
        "[Content_Types].xml",
        content_types_xml(&[
            ("/word/document.xml".to_string(), CT_DOCUMENT),
            ("/word/styles.xml".to_string(), CT_STYLES),
        ])
        .as_bytes(),
    )?;
    pkg.add(
        "_rels/.rels",
        relationships_xml(&[Relationship {
            id: "rId1".into(),
            kind: REL_OFFICE_DOCUMENT,
            target: "word/document.xml".into(),
        }])
        .as_bytes(),
    )?;

    let mut rels = vec![Relationship {
        id: "rId1".into(),
        kind: REL_STYLES,
        target: "styles.xml".into(),
    }];
    for (i, m) in media.iter().enumerate() {
        let n = i + 1;
        rels.push(Relationship {
            id: image_rel_id(n),
            kind: REL_IMAGE,
            target: format!("media/image{n}.png"),
        });
        pkg.add(&format!("word/media/image{n}.png"), &m.png)?;
    }
    pkg.add("word/_rels/document.xml.rels", relationships_xml(&rels).as_bytes())?;
    pkg.add("word/styles.xml", STYLES_XML.as_bytes())?;
    pkg.add("word/document.xml", document_xml(title, &media).as_bytes())?;

    let bytes = pkg.finish()?;
    debug!(images = media.len(), bytes = bytes.len(), "DOCX assembled");
    Ok(bytes)
}

fn image_rel_id(n: usize) -> String {
    format!("rId{}", n + 1)
}

fn document_xml(title: &str, media: &[Media]) -> String {
    let mut body = paragraph("Title", title);
    for (i, m) in media.iter().enumerate() {
        let n = i + 1;
        let cy = (PICTURE_WIDTH_EMU as f64 / m.ratio()).round().max(1.0) as u64;
        body.push_str(&paragraph("Heading1", &format!("Image {n}")));
        body.push_str(&format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "{pic}",
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            cx = PICTURE_WIDTH_EMU,
            cy = cy,
            n = n,
            pic = picture_xml("pic", n, &image_rel_id(n), 0, 0, PICTURE_WIDTH_EMU, cy),
        ));
        body.push_str(r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#);
    }

    format!(
        concat!(
            "{decl}",
            r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}" xmlns:a="{a}">"#,
            "<w:body>{body}",
            r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        decl = XML_DECL,
        w = NS_W,
        r = NS_REL,
        wp = NS_WP,
        a = NS_A,
        body = body,
    )
}

fn paragraph(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_text(text)
    )
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>"#,
    r#"<w:pPr><w:spacing w:after="300"/></w:pPr><w:rPr><w:sz w:val="56"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>"#,
    r#"<w:pPr><w:keepNext/><w:spacing w:before="480"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    "</w:styles>"
);
