//! WordprocessingML reader (`.docx`).

use super::package::{CoreProperties, Package, Relationships, REL_IMAGE};
use super::xml::XmlElement;
use super::EmbeddedImage;
use crate::error::Result;
use std::collections::HashMap;

/// A top-level body element.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyElement {
    /// `w:p`
    Paragraph(WordParagraph),
    /// `w:tbl`
    Table(WordTable),
}

/// A paragraph with its resolved style name and list level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordParagraph {
    /// Display name of the paragraph style (`heading 1`)
    pub style_name: Option<String>,
    /// `w:numPr/w:ilvl` when the paragraph is numbered (0 = outermost)
    pub list_level: Option<u8>,
    /// Runs in order
    pub runs: Vec<WordRun>,
}

/// A text run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordRun {
    /// Text with tabs and breaks expanded
    pub text: String,
    /// `w:b`
    pub bold: bool,
    /// `w:i`
    pub italic: bool,
    /// `w:u` other than `none`
    pub underline: bool,
    /// `w:strike` or `w:dstrike`
    pub strike: bool,
    /// Relationship ids of images drawn in this run
    pub image_ids: Vec<String>,
}

/// A table as a grid of cell text. Cells spanning several grid columns are
/// repeated once per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordTable {
    /// Rows of cell text (paragraphs joined with `\n`)
    pub rows: Vec<Vec<String>>,
}

/// Reader over an opened Word package.
pub struct WordReader {
    package: Package,
    main_part: String,
    rels: Relationships,
}

impl WordReader {
    /// Open a `.docx` from its bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut package = Package::from_bytes(bytes)?;
        let main_part = package
            .relationships("")?
            .find_type("/officeDocument")
            .map(|r| r.target.clone())
            .unwrap_or_else(|| "word/document.xml".to_string());
        let rels = package.relationships(&main_part)?;
        Ok(Self {
            package,
            main_part,
            rels,
        })
    }

    /// Core document properties.
    pub fn core_properties(&mut self) -> Result<CoreProperties> {
        self.package.core_properties()
    }

    /// Read the body in document order.
    pub fn body(&mut self) -> Result<Vec<BodyElement>> {
        let styles = self.style_names()?;
        let root = self.package.read_xml(&self.main_part)?;
        let Some(body) = root.child("body") else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for el in body.elements() {
            match el.name.as_str() {
                "p" => out.push(BodyElement::Paragraph(read_paragraph(el, &styles))),
                "tbl" => out.push(BodyElement::Table(read_table(el))),
                // Content controls wrap ordinary block content
                "sdt" => {
                    if let Some(content) = el.child("sdtContent") {
                        for inner in content.elements() {
                            match inner.name.as_str() {
                                "p" => out
                                    .push(BodyElement::Paragraph(read_paragraph(inner, &styles))),
                                "tbl" => out.push(BodyElement::Table(read_table(inner))),
                                _ => {}
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Resolve an image relationship id. `None` when the id is unknown or
    /// does not point at an image part inside the package.
    pub fn image(&mut self, rel_id: &str) -> Result<Option<EmbeddedImage>> {
        let Some(rel) = self.rels.get(rel_id) else {
            return Ok(None);
        };
        if rel.external || !rel.rel_type.ends_with(REL_IMAGE) {
            return Ok(None);
        }
        let target = rel.target.clone();
        let Some(data) = self.package.read_part_opt(&target)? else {
            return Ok(None);
        };
        let content_type = self.package.content_type(&target, &data);
        Ok(Some(EmbeddedImage {
            part_name: target,
            data,
            content_type,
        }))
    }

    /// Map of style id to display name from `styles.xml`.
    fn style_names(&mut self) -> Result<HashMap<String, String>> {
        let styles_part = self
            .rels
            .find_type("/styles")
            .map(|r| r.target.clone())
            .unwrap_or_else(|| "word/styles.xml".to_string());
        let mut names = HashMap::new();
        let Some(root) = self.package.read_xml_opt(&styles_part)? else {
            return Ok(names);
        };
        for style in root.children_named("style") {
            if let (Some(id), Some(name)) = (
                style.attr("styleId"),
                style.child("name").and_then(|n| n.attr("val")),
            ) {
                names.insert(id.to_string(), name.to_string());
            }
        }
        Ok(names)
    }
}

fn read_paragraph(p: &XmlElement, styles: &HashMap<String, String>) -> WordParagraph {
    let mut para = WordParagraph::default();

    if let Some(ppr) = p.child("pPr") {
        para.style_name = ppr
            .child("pStyle")
            .and_then(|s| s.attr("val"))
            .map(|id| styles.get(id).cloned().unwrap_or_else(|| id.to_string()));
        para.list_level = ppr.child("numPr").map(|num| {
            num.child("ilvl")
                .and_then(|l| l.attr("val"))
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(0)
        });
    }

    collect_runs(p, &mut para.runs);
    para
}

/// Collect runs, descending into inline wrappers (hyperlinks, insertions,
/// smart tags, simple fields, inline content controls).
fn collect_runs(parent: &XmlElement, out: &mut Vec<WordRun>) {
    for el in parent.elements() {
        match el.name.as_str() {
            "r" => out.push(read_run(el)),
            "hyperlink" | "ins" | "smartTag" | "fldSimple" | "customXml" => collect_runs(el, out),
            "sdt" => {
                if let Some(content) = el.child("sdtContent") {
                    collect_runs(content, out);
                }
            }
            _ => {}
        }
    }
}

fn read_run(r: &XmlElement) -> WordRun {
    let mut run = WordRun::default();

    if let Some(rpr) = r.child("rPr") {
        run.bold = toggle(rpr.child("b"));
        run.italic = toggle(rpr.child("i"));
        run.underline = rpr
            .child("u")
            .map(|u| u.attr("val") != Some("none"))
            .unwrap_or(false);
        run.strike = toggle(rpr.child("strike")) || toggle(rpr.child("dstrike"));
    }

    for el in r.elements() {
        match el.name.as_str() {
            "t" => run.text.push_str(&el.text()),
            "tab" => run.text.push('\t'),
            "br" | "cr" => run.text.push('\n'),
            "noBreakHyphen" => run.text.push('-'),
            "drawing" => {
                let mut blips = Vec::new();
                el.descendants("blip", &mut blips);
                run.image_ids
                    .extend(blips.iter().filter_map(|b| b.prefixed_attr("embed")).map(str::to_string));
            }
            "pict" | "object" => {
                let mut data = Vec::new();
                el.descendants("imagedata", &mut data);
                run.image_ids
                    .extend(data.iter().filter_map(|d| d.prefixed_attr("id")).map(str::to_string));
            }
            _ => {}
        }
    }
    run
}

/// OOXML on/off property: present means on unless `val` says otherwise.
fn toggle(el: Option<&XmlElement>) -> bool {
    match el {
        Some(el) => !matches!(el.attr("val"), Some("0" | "false" | "off")),
        None => false,
    }
}

fn read_table(tbl: &XmlElement) -> WordTable {
    let mut table = WordTable::default();
    for tr in tbl.children_named("tr") {
        let mut row = Vec::new();
        for tc in tr.children_named("tc") {
            let text = tc
                .children_named("p")
                .map(|p| {
                    let mut runs = Vec::new();
                    collect_runs(p, &mut runs);
                    runs.into_iter().map(|r| r.text).collect::<String>()
                })
                .collect::<Vec<_>>()
                .join("\n");
            let span = tc
                .path(&["tcPr", "gridSpan"])
                .and_then(|g| g.attr("val"))
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            for _ in 0..span {
                row.push(text.clone());
            }
        }
        table.rows.push(row);
    }
    table
}
