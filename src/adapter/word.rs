//! Word (`.docx`) adapter.

use super::{numbered, AdapterContext, Extraction, ImageCursor, SourceAdapter};
use crate::container::{BodyElement, WordParagraph, WordReader, WordRun};
use crate::error::Result;
use crate::model::{Block, InlineRun};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_STYLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^heading\s*(\d+)$").unwrap());

/// Alt text for Word images.
const IMAGE_ALT: &str = "image";

/// Rich-path adapter over the WordprocessingML object model.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordAdapter;

impl SourceAdapter for WordAdapter {
    fn parse(&self, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction> {
        let mut reader = WordReader::open(bytes)?;
        let mut out = Extraction::default();
        reader.core_properties()?.fill(&mut out.metadata);

        let mut cursor = ImageCursor::new();
        for element in reader.body()? {
            match element {
                BodyElement::Paragraph(para) => {
                    if let Some(block) = paragraph_block(&para) {
                        out.blocks.push(block);
                    }
                    if ctx.extract_images {
                        for id in para.runs.iter().flat_map(|r| r.image_ids.iter()) {
                            match reader.image(id) {
                                Ok(Some(img)) => {
                                    let name = cursor.push(img.data, img.content_type, |i| {
                                        numbered("image_", i)
                                    });
                                    out.blocks.push(Block::image(name, IMAGE_ALT));
                                }
                                Ok(None) => out.warn(format!(
                                    "{}: image relationship {} not found, skipped",
                                    ctx.file_name, id
                                )),
                                // A damaged image entry downgrades only this image
                                Err(e) => {
                                    let reason = format!("image {} is unreadable: {}", id, e);
                                    out.warn(format!("{}: {}", ctx.file_name, reason));
                                    out.blocks.push(Block::image_failure(reason));
                                }
                            }
                        }
                    }
                }
                BodyElement::Table(table) => {
                    if let Some(block) = Block::table(table.rows) {
                        out.blocks.push(block);
                    }
                }
            }
        }

        out.assets = cursor.into_assets();
        Ok(out)
    }
}

/// Heading level encoded in a style name (`Heading 2`, `heading2`).
///
/// `None` when the name does not follow the pattern; `Some(0)` for a number
/// that does not fit a heading level.
pub fn heading_level(style_name: &str) -> Option<u8> {
    let caps = HEADING_STYLE.captures(style_name.trim())?;
    Some(caps[1].parse::<u8>().unwrap_or(0))
}

fn paragraph_block(para: &WordParagraph) -> Option<Block> {
    let inline: Vec<InlineRun> = para
        .runs
        .iter()
        .filter(|r| !r.text.is_empty())
        .map(inline_run)
        .collect();
    if inline.iter().all(|r| r.text.trim().is_empty()) {
        return None;
    }

    if let Some(level) = para.style_name.as_deref().and_then(heading_level) {
        return Some(Block::heading(level, inline));
    }
    Some(match para.list_level {
        Some(level) => Block::list_item(inline, level.saturating_add(1)),
        None => Block::paragraph(inline),
    })
}

fn inline_run(run: &WordRun) -> InlineRun {
    InlineRun::new(run.text.clone())
        .with_bold(run.bold)
        .with_italic(run.italic)
        .with_underline(run.underline)
        .with_strike(run.strike)
}
