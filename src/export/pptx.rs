//! PPTX export: a title slide, then one blank slide per image.
//!
//! The deck is 10 × 7.5 inches. Each picture is scaled to 90 % of the slide
//! along its limiting dimension, keeps its aspect ratio, and is centered.

use super::ooxml::{
    content_types_xml, escape_text, picture_xml, relationships_xml, Media, Package, Relationship,
    EMU_PER_INCH, NS_A, NS_REL, REL_IMAGE, REL_OFFICE_DOCUMENT, XML_DECL,
};
use crate::error::ConvertError;
use chrono::NaiveDateTime;
use image::DynamicImage;
use tracing::debug;

pub(crate) const SLIDE_WIDTH_EMU: u64 = 10 * EMU_PER_INCH;
pub(crate) const SLIDE_HEIGHT_EMU: u64 = 7 * EMU_PER_INCH + EMU_PER_INCH / 2;

/// Share of the slide a picture may occupy along its limiting dimension.
const FILL_RATIO: f64 = 0.9;

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const REL_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
const REL_THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";

/// Where a picture lands on a slide, in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub left: u64,
    pub top: u64,
    pub width: u64,
    pub height: u64,
}

/// Fit a `width × height` image onto the slide.
pub(crate) fn place(width: u32, height: u32) -> Placement {
    let (slide_w, slide_h) = (SLIDE_WIDTH_EMU as f64, SLIDE_HEIGHT_EMU as f64);
    let image_ratio = f64::from(width.max(1)) / f64::from(height.max(1));
    let (w, h) = if image_ratio > slide_w / slide_h {
        let w = slide_w * FILL_RATIO;
        (w, w / image_ratio)
    } else {
        let h = slide_h * FILL_RATIO;
        (h * image_ratio, h)
    };
    Placement {
        left: ((slide_w - w) / 2.0).round() as u64,
        top: ((slide_h - h) / 2.0).round() as u64,
        width: w.round().max(1.0) as u64,
        height: h.round().max(1.0) as u64,
    }
}

/// Build a PPTX deck containing every image.
pub fn images_to_pptx(
    images: &[DynamicImage],
    title: &str,
    generated_at: NaiveDateTime,
) -> Result<Vec<u8>, ConvertError> {
    let media = images
        .iter()
        .map(Media::from_image)
        .collect::<Result<Vec<_>, _>>()?;
    // Slide 1 is the title slide; images start at slide 2.
    let slide_count = media.len() + 1;

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_LAYOUT),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
    ];
    overrides.extend((1..=slide_count).map(|n| (format!("/ppt/slides/slide{n}.xml"), CT_SLIDE)));

    let mut pkg = Package::new("PPTX");
    pkg.add("[Content_Types].xml", content_types_xml(&overrides).as_bytes())?;
    pkg.add(
        "_rels/.rels",
        relationships_xml(&[Relationship {
            id: "rId1".into(),
            kind: REL_OFFICE_DOCUMENT,
            target: "ppt/presentation.xml".into(),
        }])
        .as_bytes(),
    )?;

    let mut presentation_rels = vec![
        Relationship {
            id: "rId1".into(),
            kind: REL_MASTER,
            target: "slideMasters/slideMaster1.xml".into(),
        },
        Relationship {
            id: "rId2".into(),
            kind: REL_THEME,
            target: "theme/theme1.xml".into(),
        },
    ];
    presentation_rels.extend((1..=slide_count).map(|n| Relationship {
        id: slide_rel_id(n),
        kind: REL_SLIDE,
        target: format!("slides/slide{n}.xml"),
    }));
    pkg.add("ppt/presentation.xml", presentation_xml(slide_count).as_bytes())?;
    pkg.add(
        "ppt/_rels/presentation.xml.rels",
        relationships_xml(&presentation_rels).as_bytes(),
    )?;

    pkg.add("ppt/slideMasters/slideMaster1.xml", master_xml().as_bytes())?;
    pkg.add(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        relationships_xml(&[
            Relationship {
                id: "rId1".into(),
                kind: REL_LAYOUT,
                target: "../slideLayouts/slideLayout1.xml".into(),
            },
            Relationship {
                id: "rId2".into(),
                kind: REL_THEME,
                target: "../theme/theme1.xml".into(),
            },
        ])
        .as_bytes(),
    )?;
    pkg.add("ppt/slideLayouts/slideLayout1.xml", layout_xml().as_bytes())?;
    pkg.add(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        relationships_xml(&[Relationship {
            id: "rId1".into(),
            kind: REL_MASTER,
            target: "../slideMasters/slideMaster1.xml".into(),
        }])
        .as_bytes(),
    )?;
    pkg.add("ppt/theme/theme1.xml", THEME_XML.as_bytes())?;

    let subtitle = format!("Generated on {}", generated_at.format("%Y-%m-%d %H:%M"));
    pkg.add("ppt/slides/slide1.xml", title_slide_xml(title, &subtitle).as_bytes())?;
    pkg.add("ppt/slides/_rels/slide1.xml.rels", layout_rels(None).as_bytes())?;

    for (i, m) in media.iter().enumerate() {
        let n = i + 1;
        let slide = n + 1;
        pkg.add(&format!("ppt/media/image{n}.png"), &m.png)?;
        pkg.add(
            &format!("ppt/slides/slide{slide}.xml"),
            picture_slide_xml(place(m.width, m.height)).as_bytes(),
        )?;
        pkg.add(
            &format!("ppt/slides/_rels/slide{slide}.xml.rels"),
            layout_rels(Some(n)).as_bytes(),
        )?;
    }

    let bytes = pkg.finish()?;
    debug!(slides = slide_count, bytes = bytes.len(), "PPTX assembled");
    Ok(bytes)
}

fn slide_rel_id(n: usize) -> String {
    format!("rId{}", n + 2)
}

fn layout_rels(image: Option<usize>) -> String {
    let mut rels = vec![Relationship {
        id: "rId1".into(),
        kind: REL_LAYOUT,
        target: "../slideLayouts/slideLayout1.xml".into(),
    }];
    if let Some(n) = image {
        rels.push(Relationship {
            id: "rId2".into(),
            kind: REL_IMAGE,
            target: format!("../media/image{n}.png"),
        });
    }
    relationships_xml(&rels)
}

fn root_open(element: &str) -> String {
    format!(r#"{XML_DECL}<p:{element} xmlns:a="{NS_A}" xmlns:r="{NS_REL}" xmlns:p="{NS_P}""#)
}

const EMPTY_GROUP: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

fn presentation_xml(slide_count: usize) -> String {
    let slide_ids: String = (1..=slide_count)
        .map(|n| format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + n, slide_rel_id(n)))
        .collect();
    format!(
        concat!(
            "{open}>",
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            "<p:sldIdLst>{ids}</p:sldIdLst>",
            r#"<p:sldSz cx="{cx}" cy="{cy}" type="screen4x3"/><p:notesSz cx="{cy}" cy="{cx}"/>"#,
            "</p:presentation>"
        ),
        open = root_open("presentation"),
        ids = slide_ids,
        cx = SLIDE_WIDTH_EMU,
        cy = SLIDE_HEIGHT_EMU,
    )
}

fn master_xml() -> String {
    format!(
        concat!(
            "{open}>",
            "<p:cSld><p:spTree>{group}</p:spTree></p:cSld>",
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            "</p:sldMaster>"
        ),
        open = root_open("sldMaster"),
        group = EMPTY_GROUP,
    )
}

fn layout_xml() -> String {
    format!(
        concat!(
            r#"{open} type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sldLayout>"
        ),
        open = root_open("sldLayout"),
        group = EMPTY_GROUP,
    )
}

fn slide_xml(shapes: &str) -> String {
    format!(
        concat!(
            "{open}>",
            "<p:cSld><p:spTree>{group}{shapes}</p:spTree></p:cSld>",
            "<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>",
            "</p:sld>"
        ),
        open = root_open("sld"),
        group = EMPTY_GROUP,
        shapes = shapes,
    )
}

fn text_box(id: usize, name: &str, area: Placement, size_hundredths: u32, text: &str) -> String {
    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square" anchor="ctr"/><a:lstStyle/>"#,
            r#"<a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="{sz}" dirty="0"/><a:t>{text}</a:t></a:r></a:p>"#,
            "</p:txBody></p:sp>"
        ),
        id = id,
        name = name,
        x = area.left,
        y = area.top,
        cx = area.width,
        cy = area.height,
        sz = size_hundredths,
        text = escape_text(text),
    )
}

fn title_slide_xml(title: &str, subtitle: &str) -> String {
    let title_area = Placement {
        left: 685_800,
        top: 2_130_425,
        width: 7_772_400,
        height: 1_470_025,
    };
    let subtitle_area = Placement {
        left: 1_371_600,
        top: 3_886_200,
        width: 6_400_800,
        height: 1_752_600,
    };
    let shapes = text_box(2, "Title 1", title_area, 4400, title)
        + &text_box(3, "Subtitle 2", subtitle_area, 2400, subtitle);
    slide_xml(&shapes)
}

fn picture_slide_xml(p: Placement) -> String {
    slide_xml(&picture_xml("p", 2, "rId2", p.left, p.top, p.width, p.height))
}

const THEME_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>"#,
    r#"<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    r#"<a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2>"#,
    r#"<a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3>"#,
    r#"<a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6>"#,
    r#"<a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme>"#,
    r#"<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
    r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
    r#"<a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
    r#"<a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>"#,
    r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
    r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme>"#,
    r#"</a:themeElements></a:theme>"#
);
