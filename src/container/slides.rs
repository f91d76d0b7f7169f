//! PresentationML reader (`.pptx`).

use super::package::{
    CoreProperties, Package, Relationships, REL_IMAGE, REL_NOTES_SLIDE, REL_SLIDE_LAYOUT,
};
use super::xml::XmlElement;
use super::EmbeddedImage;
use crate::error::Result;

/// Group shapes nested deeper than this are reported as unreadable.
pub const MAX_GROUP_DEPTH: usize = 64;

/// EMUs per inch.
const EMU_PER_INCH: f64 = 914_400.0;

/// A run inside a text frame paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideRun {
    /// Text (line breaks as `\n`)
    pub text: String,
    /// `b="1"`
    pub bold: bool,
    /// `i="1"`
    pub italic: bool,
    /// `u` other than `none`
    pub underline: bool,
    /// `strike` other than `noStrike`
    pub strike: bool,
}

/// A text frame paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideParagraph {
    /// Outline level from `a:pPr@lvl` (0 = top)
    pub level: u8,
    /// Runs in order
    pub runs: Vec<SlideRun>,
}

/// A shape on a slide, in z-order.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Shape with a text frame
    Text {
        /// `cNvPr@name`
        name: String,
        /// Paragraphs of the text frame
        paragraphs: Vec<SlideParagraph>,
    },
    /// Group of shapes
    Group {
        /// `cNvPr@name`
        name: String,
        /// Member shapes
        shapes: Vec<Shape>,
    },
    /// Picture with its image part
    Picture {
        /// `cNvPr@name`
        name: String,
        /// Resolved image
        image: EmbeddedImage,
    },
    /// Table graphic frame
    Table {
        /// `cNvPr@name`
        name: String,
        /// Cell text grid
        rows: Vec<Vec<String>>,
    },
    /// A shape that could not be read
    Unreadable {
        /// `cNvPr@name`
        name: String,
        /// Why reading failed
        reason: String,
    },
}

/// One slide.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// 1-based position in the slide list
    pub number: usize,
    /// Name of the slide layout (`Title and Content`)
    pub layout_name: Option<String>,
    /// Top-level shapes in z-order
    pub shapes: Vec<Shape>,
    /// Speaker notes text
    pub notes: Option<String>,
}

/// Slide size in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideSize {
    /// Width in inches
    pub width: f64,
    /// Height in inches
    pub height: f64,
}

/// Reader over an opened presentation package.
pub struct PresentationReader {
    package: Package,
    presentation_part: String,
}

impl PresentationReader {
    /// Open a `.pptx` from its bytes.
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        let mut package = Package::from_bytes(bytes)?;
        let presentation_part = package
            .relationships("")?
            .find_type("/officeDocument")
            .map(|r| r.target.clone())
            .unwrap_or_else(|| "ppt/presentation.xml".to_string());
        Ok(Self {
            package,
            presentation_part,
        })
    }

    /// Core document properties.
    pub fn core_properties(&mut self) -> Result<CoreProperties> {
        self.package.core_properties()
    }

    /// Slide size from `p:sldSz`, if declared.
    pub fn slide_size(&mut self) -> Result<Option<SlideSize>> {
        let root = self.package.read_xml(&self.presentation_part)?;
        Ok(root.child("sldSz").and_then(|sz| {
            let cx = sz.attr("cx")?.parse::<f64>().ok()?;
            let cy = sz.attr("cy")?.parse::<f64>().ok()?;
            Some(SlideSize {
                width: cx / EMU_PER_INCH,
                height: cy / EMU_PER_INCH,
            })
        }))
    }

    /// Read all slides in presentation order. Picture shapes are only
    /// resolved when `with_images` is set; otherwise they are omitted.
    pub fn slides(&mut self, with_images: bool) -> Result<Vec<Slide>> {
        let rels = self.package.relationships(&self.presentation_part)?;
        let root = self.package.read_xml(&self.presentation_part)?;
        let parts: Vec<String> = root
            .child("sldIdLst")
            .map(|list| {
                list.children_named("sldId")
                    .filter_map(|id| id.prefixed_attr("id"))
                    .filter_map(|id| rels.get(id))
                    .map(|r| r.target.clone())
                    .collect()
            })
            .unwrap_or_default();

        let mut slides = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            slides.push(self.read_slide(i + 1, part, with_images)?);
        }
        Ok(slides)
    }

    fn read_slide(&mut self, number: usize, part: &str, with_images: bool) -> Result<Slide> {
        let root = self.package.read_xml(part)?;
        let rels = self.package.relationships(part)?;

        let layout_name = match rels.find_type(REL_SLIDE_LAYOUT) {
            Some(rel) => {
                let target = rel.target.clone();
                self.package
                    .read_xml_opt(&target)?
                    .and_then(|layout| layout.child("cSld")?.attr("name").map(str::to_string))
            }
            None => None,
        };

        let notes = match rels.find_type(REL_NOTES_SLIDE) {
            Some(rel) => {
                let target = rel.target.clone();
                self.package
                    .read_xml_opt(&target)?
                    .and_then(|notes| notes_text(&notes))
            }
            None => None,
        };

        let mut shapes = Vec::new();
        if let Some(tree) = root.path(&["cSld", "spTree"]) {
            let mut ctx = ShapeContext {
                package: &mut self.package,
                rels: &rels,
                with_images,
            };
            for el in tree.elements() {
                if let Some(shape) = ctx.read_shape(el, 0)? {
                    shapes.push(shape);
                }
            }
        }

        Ok(Slide {
            number,
            layout_name,
            shapes,
            notes,
        })
    }
}

struct ShapeContext<'a> {
    package: &'a mut Package,
    rels: &'a Relationships,
    with_images: bool,
}

impl ShapeContext<'_> {
    /// Read one shape element. Non-content elements yield `None`.
    fn read_shape(&mut self, el: &XmlElement, depth: usize) -> Result<Option<Shape>> {
        let name = shape_name(el);
        let shape = match el.name.as_str() {
            "sp" => match el.child("txBody") {
                Some(body) => Shape::Text {
                    name,
                    paragraphs: read_paragraphs(body),
                },
                None => return Ok(None),
            },
            "grpSp" => {
                if depth >= MAX_GROUP_DEPTH {
                    return Ok(Some(Shape::Unreadable {
                        name,
                        reason: format!("group nesting exceeds {} levels", MAX_GROUP_DEPTH),
                    }));
                }
                let mut shapes = Vec::new();
                for child in el.elements() {
                    if let Some(shape) = self.read_shape(child, depth + 1)? {
                        shapes.push(shape);
                    }
                }
                Shape::Group { name, shapes }
            }
            "pic" => {
                if !self.with_images {
                    return Ok(None);
                }
                match self.picture(el) {
                    Ok(image) => Shape::Picture { name, image },
                    Err(reason) => Shape::Unreadable { name, reason },
                }
            }
            "graphicFrame" => match el.descendant("tbl") {
                Some(tbl) => Shape::Table {
                    name,
                    rows: read_table(tbl),
                },
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(shape))
    }

    /// Resolve a picture's image part. The error is a shape-level failure
    /// reason, including a damaged image entry.
    fn picture(&mut self, el: &XmlElement) -> std::result::Result<EmbeddedImage, String> {
        let Some(embed) = el.descendant("blip").and_then(|b| b.prefixed_attr("embed")) else {
            return Err("picture has no embedded image".to_string());
        };
        let Some(rel) = self.rels.get(embed) else {
            return Err(format!("image relationship {} not found", embed));
        };
        if rel.external || !rel.rel_type.ends_with(REL_IMAGE) {
            return Err(format!("relationship {} is not an embedded image", embed));
        }
        let target = rel.target.clone();
        // A damaged image entry only affects this shape
        match self.package.read_part_opt(&target) {
            Ok(Some(data)) => {
                let content_type = self.package.content_type(&target, &data);
                Ok(EmbeddedImage {
                    part_name: target,
                    data,
                    content_type,
                })
            }
            Ok(None) => Err(format!("image part {} is missing", target)),
            Err(e) => Err(format!("image part {} is unreadable: {}", target, e)),
        }
    }
}

fn shape_name(el: &XmlElement) -> String {
    el.elements()
        .find(|c| c.name.starts_with("nv"))
        .and_then(|nv| nv.child("cNvPr"))
        .and_then(|c| c.attr("name"))
        .unwrap_or_default()
        .to_string()
}

fn read_paragraphs(body: &XmlElement) -> Vec<SlideParagraph> {
    body.children_named("p")
        .map(|p| {
            let level = p
                .child("pPr")
                .and_then(|ppr| ppr.attr("lvl"))
                .and_then(|l| l.parse::<u8>().ok())
                .unwrap_or(0);
            let runs = p
                .elements()
                .filter_map(|el| match el.name.as_str() {
                    "r" | "fld" => Some(read_run(el)),
                    "br" => Some(SlideRun {
                        text: "\n".to_string(),
                        ..Default::default()
                    }),
                    _ => None,
                })
                .collect();
            SlideParagraph { level, runs }
        })
        .collect()
}

fn read_run(r: &XmlElement) -> SlideRun {
    let mut run = SlideRun {
        text: r.child("t").map(|t| t.text()).unwrap_or_default(),
        ..Default::default()
    };
    if let Some(rpr) = r.child("rPr") {
        run.bold = matches!(rpr.attr("b"), Some("1" | "true"));
        run.italic = matches!(rpr.attr("i"), Some("1" | "true"));
        run.underline = rpr.attr("u").is_some_and(|u| u != "none");
        run.strike = rpr.attr("strike").is_some_and(|s| s != "noStrike");
    }
    run
}

/// Plain text of a text body: runs concatenated, paragraphs joined by `\n`.
fn body_text(body: &XmlElement) -> String {
    read_paragraphs(body)
        .into_iter()
        .map(|p| p.runs.into_iter().map(|r| r.text).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_table(tbl: &XmlElement) -> Vec<Vec<String>> {
    tbl.children_named("tr")
        .map(|tr| {
            tr.children_named("tc")
                .map(|tc| tc.child("txBody").map(body_text).unwrap_or_default())
                .collect()
        })
        .collect()
}

/// Text of the notes placeholder (`p:ph type="body"`) of a notes slide.
fn notes_text(notes: &XmlElement) -> Option<String> {
    let tree = notes.path(&["cSld", "spTree"])?;
    let mut shapes = Vec::new();
    tree.descendants("sp", &mut shapes);
    shapes
        .into_iter()
        .find(|sp| {
            sp.path(&["nvSpPr", "nvPr", "ph"])
                .and_then(|ph| ph.attr("type"))
                == Some("body")
        })
        .and_then(|sp| sp.child("txBody"))
        .map(body_text)
        .filter(|t| !t.trim().is_empty())
}
