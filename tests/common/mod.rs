//! Builders for synthetic OOXML packages and images.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const DOC_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="bin" ContentType="image/png"/></Types>"#;

/// Zip the given `(part name, contents)` pairs.
pub fn package(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(name.as_str(), opts).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn part(name: &str, data: impl Into<Vec<u8>>) -> (String, Vec<u8>) {
    (name.to_string(), data.into())
}

fn rels(entries: &[(String, &str, String)]) -> Vec<u8> {
    let mut xml = format!(r#"<?xml version="1.0"?><Relationships xmlns="{}">"#, REL_NS);
    for (id, kind, target) in entries {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"/>"#,
            id, DOC_REL, kind, target
        ));
    }
    xml.push_str("</Relationships>");
    xml.into_bytes()
}

fn root_rels(main: &str) -> (String, Vec<u8>) {
    part(
        "_rels/.rels",
        rels(&[("rId1".to_string(), "officeDocument", main.to_string())]),
    )
}

/// Encode an image as PNG.
pub fn png(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Single-color opaque image.
pub fn flat_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 90, 200])))
}

/// Deterministic xorshift noise, opaque.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let v = next();
        Rgb([v as u8, (v >> 8) as u8, (v >> 16) as u8])
    }))
}

/// Half transparent, half opaque red.
pub fn alpha_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([255, 0, 0, 255])
        }
    }))
}

/// A `.docx` whose body is `body_xml`, with `images[i]` reachable as
/// relationship `rIdImg{i+1}`.
pub fn docx(body_xml: &str, images: &[Vec<u8>]) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="{}" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}</w:body></w:document>"#,
        DOC_REL, body_xml
    );
    let mut entries = vec![(
        "rIdStyles".to_string(),
        "styles",
        "styles.xml".to_string(),
    )];
    let mut parts = vec![
        part("[Content_Types].xml", CONTENT_TYPES),
        root_rels("word/document.xml"),
        part("word/document.xml", document),
        part(
            "word/styles.xml",
            r#"<?xml version="1.0"?><w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/></w:style></w:styles>"#,
        ),
    ];
    for (i, data) in images.iter().enumerate() {
        let n = i + 1;
        entries.push((format!("rIdImg{}", n), "image", format!("media/image{}.png", n)));
        parts.push(part(&format!("word/media/image{}.png", n), data.clone()));
    }
    parts.push(part("word/_rels/document.xml.rels", rels(&entries)));
    package(&parts)
}

/// Paragraph XML with plain text.
pub fn w_para(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text)
}

/// Paragraph XML with a style id.
pub fn w_styled(style: &str, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"{}\"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>",
        style, text
    )
}

/// Paragraph XML holding one inline picture.
pub fn w_picture(rel_id: &str) -> String {
    format!(
        r#"<w:p><w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#,
        rel_id
    )
}

/// One worksheet: name, rows of inline-string cells, images on its drawing.
pub struct SheetDef<'a> {
    pub name: &'a str,
    pub rows: Vec<Vec<&'a str>>,
    pub images: Vec<Vec<u8>>,
}

fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}

/// A `.xlsx` with the given sheets. Empty strings become absent cells.
pub fn xlsx(sheets: &[SheetDef<'_>]) -> Vec<u8> {
    let mut workbook = String::from(
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut wb_rels = Vec::new();
    let mut parts = vec![
        part("[Content_Types].xml", CONTENT_TYPES),
        root_rels("xl/workbook.xml"),
    ];
    let mut image_no = 0;

    for (i, sheet) in sheets.iter().enumerate() {
        let n = i + 1;
        workbook.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rIdSheet{}"/>"#,
            sheet.name, n, n
        ));
        wb_rels.push((
            format!("rIdSheet{}", n),
            "worksheet",
            format!("worksheets/sheet{}.xml", n),
        ));

        let mut data = String::new();
        for (r, row) in sheet.rows.iter().enumerate() {
            data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                data.push_str(&format!(
                    r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    column_name(c),
                    r + 1,
                    value
                ));
            }
            data.push_str("</row>");
        }
        parts.push(part(
            &format!("xl/worksheets/sheet{}.xml", n),
            format!(
                r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                data
            ),
        ));

        if sheet.images.is_empty() {
            continue;
        }
        parts.push(part(
            &format!("xl/worksheets/_rels/sheet{}.xml.rels", n),
            rels(&[(
                "rIdDr".to_string(),
                "drawing",
                format!("../drawings/drawing{}.xml", n),
            )]),
        ));
        let mut drawing = String::from(
            r#"<?xml version="1.0"?><xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
        );
        let mut drawing_rels = Vec::new();
        for (k, img) in sheet.images.iter().enumerate() {
            image_no += 1;
            drawing.push_str(&format!(
                r#"<xdr:oneCellAnchor><xdr:pic><xdr:blipFill><a:blip r:embed="rIdP{}"/></xdr:blipFill></xdr:pic></xdr:oneCellAnchor>"#,
                k + 1
            ));
            drawing_rels.push((
                format!("rIdP{}", k + 1),
                "image",
                format!("../media/image{}.png", image_no),
            ));
            parts.push(part(&format!("xl/media/image{}.png", image_no), img.clone()));
        }
        drawing.push_str("</xdr:wsDr>");
        parts.push(part(&format!("xl/drawings/drawing{}.xml", n), drawing));
        parts.push(part(
            &format!("xl/drawings/_rels/drawing{}.xml.rels", n),
            rels(&drawing_rels),
        ));
    }

    workbook.push_str("</sheets></workbook>");
    parts.push(part("xl/workbook.xml", workbook));
    parts.push(part("xl/_rels/workbook.xml.rels", rels(&wb_rels)));
    package(&parts)
}

/// Shape-tree content of one slide plus its pictures and notes.
pub struct SlideDef<'a> {
    /// Raw `p:spTree` children
    pub shapes: String,
    /// Images reachable as `rIdImg{i+1}`
    pub images: Vec<Vec<u8>>,
    pub notes: Option<&'a str>,
    pub layout: Option<&'a str>,
}

/// Text shape XML, one paragraph per entry.
pub fn p_text(name: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|t| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", t))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="{}"/></p:nvSpPr><p:txBody>{}</p:txBody></p:sp>"#,
        name, body
    )
}

/// Picture shape XML.
pub fn p_picture(name: &str, rel_id: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="{}"/></p:nvPicPr><p:blipFill><a:blip r:embed="{}"/></p:blipFill></p:pic>"#,
        name, rel_id
    )
}

/// A `.pptx` with the given slides at 10 x 7.5 inches.
pub fn pptx(slides: &[SlideDef<'_>]) -> Vec<u8> {
    let mut presentation = String::from(
        r#"<?xml version="1.0"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst>"#,
    );
    let mut pres_rels = Vec::new();
    let mut parts = vec![
        part("[Content_Types].xml", CONTENT_TYPES),
        root_rels("ppt/presentation.xml"),
    ];
    let mut image_no = 0;

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        presentation.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rIdS{}"/>"#,
            255 + n,
            n
        ));
        pres_rels.push((format!("rIdS{}", n), "slide", format!("slides/slide{}.xml", n)));

        parts.push(part(
            &format!("ppt/slides/slide{}.xml", n),
            format!(
                r#"<?xml version="1.0"?><p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>"#,
                slide.shapes
            ),
        ));

        let mut slide_rels = Vec::new();
        for (k, img) in slide.images.iter().enumerate() {
            image_no += 1;
            slide_rels.push((
                format!("rIdImg{}", k + 1),
                "image",
                format!("../media/image{}.png", image_no),
            ));
            parts.push(part(&format!("ppt/media/image{}.png", image_no), img.clone()));
        }
        if let Some(layout) = slide.layout {
            slide_rels.push((
                "rIdLayout".to_string(),
                "slideLayout",
                format!("../slideLayouts/slideLayout{}.xml", n),
            ));
            parts.push(part(
                &format!("ppt/slideLayouts/slideLayout{}.xml", n),
                format!(
                    r#"<?xml version="1.0"?><p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld name="{}"/></p:sldLayout>"#,
                    layout
                ),
            ));
        }
        if let Some(notes) = slide.notes {
            slide_rels.push((
                "rIdNotes".to_string(),
                "notesSlide",
                format!("../notesSlides/notesSlide{}.xml", n),
            ));
            let body: String = notes
                .lines()
                .map(|l| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", l))
                .collect();
            parts.push(part(
                &format!("ppt/notesSlides/notesSlide{}.xml", n),
                format!(
                    r#"<?xml version="1.0"?><p:notes xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:sp><p:nvSpPr><p:cNvPr id="1" name="Slide Image"/><p:cNvSpPr/><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes"/><p:cNvSpPr/><p:nvPr><p:ph type="body"/></p:nvPr></p:nvSpPr><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:notes>"#,
                    body
                ),
            ));
        }
        parts.push(part(
            &format!("ppt/slides/_rels/slide{}.xml.rels", n),
            rels(&slide_rels),
        ));
    }

    presentation.push_str(r#"</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#);
    parts.push(part("ppt/presentation.xml", presentation));
    parts.push(part("ppt/_rels/presentation.xml.rels", rels(&pres_rels)));
    package(&parts)
}

/// Flip the stored CRC-32 of `name` in both its local and central headers,
/// so reading that entry fails its checksum while the archive still opens.
pub fn corrupt_crc(zip: &mut [u8], name: &str) {
    let name = name.as_bytes();
    let mut hits = 0;
    for i in 0..zip.len().saturating_sub(4) {
        let (crc_at, name_at) = match &zip[i..i + 4] {
            [0x50, 0x4B, 0x03, 0x04] => (i + 14, i + 30),
            [0x50, 0x4B, 0x01, 0x02] => (i + 16, i + 46),
            _ => continue,
        };
        if zip.get(name_at..name_at + name.len()) == Some(name) {
            for byte in &mut zip[crc_at..crc_at + 4] {
                *byte ^= 0xFF;
            }
            hits += 1;
        }
    }
    assert_eq!(hits, 2, "entry {:?} not found", String::from_utf8_lossy(name));
}

/// A one-sheet `.xlsx` with raw `sheetData` content and a `styles.xml`.
pub fn xlsx_styled(name: &str, sheet_data: &str, styles: &str) -> Vec<u8> {
    let workbook = format!(
        r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}"><sheets><sheet name="{}" sheetId="1" r:id="rIdSheet1"/></sheets></workbook>"#,
        DOC_REL, name
    );
    let sheet = format!(
        r#"<?xml version="1.0"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        sheet_data
    );
    let styles = format!(
        r#"<?xml version="1.0"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{}</styleSheet>"#,
        styles
    );
    package(&[
        part("[Content_Types].xml", CONTENT_TYPES),
        root_rels("xl/workbook.xml"),
        part("xl/workbook.xml", workbook),
        part(
            "xl/_rels/workbook.xml.rels",
            rels(&[
                (
                    "rIdSheet1".to_string(),
                    "worksheet",
                    "worksheets/sheet1.xml".to_string(),
                ),
                ("rIdStyles".to_string(), "styles", "styles.xml".to_string()),
            ]),
        ),
        part("xl/worksheets/sheet1.xml", sheet),
        part("xl/styles.xml", styles),
    ])
}
