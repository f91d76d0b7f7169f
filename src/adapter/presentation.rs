//! Presentation (`.pptx`) adapter.

use super::{AdapterContext, Extraction, ImageCursor, SourceAdapter};
use crate::container::{PresentationReader, Shape, Slide, SlideParagraph};
use crate::error::Result;
use crate::model::{Block, InlineRun};

/// Deck header, then one section per slide closed by a rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationAdapter;

impl SourceAdapter for PresentationAdapter {
    fn parse(&self, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction> {
        let mut reader = PresentationReader::open(bytes)?;
        let mut out = Extraction::default();
        reader.core_properties()?.fill(&mut out.metadata);

        let slides = reader.slides(ctx.extract_images)?;
        out.metadata
            .insert("slide_count".to_string(), slides.len().to_string());
        if let Some(size) = reader.slide_size()? {
            out.metadata
                .insert("slide_width".to_string(), format!("{:.2}", size.width));
            out.metadata
                .insert("slide_height".to_string(), format!("{:.2}", size.height));
        }

        out.blocks
            .push(Block::raw(format!("# PowerPoint: {}\n", ctx.file_name)));
        out.blocks
            .push(Block::raw(format!("**Total slides: {}**\n", slides.len())));
        out.blocks.push(Block::Separator);

        let mut cursor = ImageCursor::new();
        for slide in &slides {
            slide_blocks(slide, &mut cursor, &mut out);
        }
        out.assets = cursor.into_assets();
        Ok(out)
    }
}

fn slide_blocks(slide: &Slide, cursor: &mut ImageCursor, out: &mut Extraction) {
    let mut header = format!("## Slide {}\n", slide.number);
    if let Some(layout) = slide.layout_name.as_deref().filter(|l| !l.is_empty()) {
        header.push_str(&format!("\n*Layout: {}*\n", layout));
    }
    out.blocks.push(Block::raw(header));

    for shape in &slide.shapes {
        push_shape(shape, slide.number, cursor, out);
    }

    if let Some(notes) = slide.notes.as_deref() {
        let quoted: Vec<String> = notes
            .trim()
            .lines()
            .map(|line| format!("> {}", line.trim_end()))
            .collect();
        out.blocks.push(Block::raw(format!(
            "**Speaker Notes:**\n{}",
            quoted.join("\n")
        )));
    }

    out.blocks.push(Block::Separator);
}

/// Emit one shape. Group members are emitted one by one, so a failing
/// member leaves a note and its siblings still follow.
fn push_shape(shape: &Shape, slide: usize, cursor: &mut ImageCursor, out: &mut Extraction) {
    match shape {
        Shape::Text { paragraphs, .. } => {
            out.blocks.extend(paragraphs.iter().filter_map(paragraph_block));
        }
        Shape::Group { shapes, .. } => {
            for member in shapes {
                push_shape(member, slide, cursor, out);
            }
        }
        Shape::Picture { image, .. } => {
            let name = cursor.push(image.data.clone(), image.content_type.clone(), |i| {
                format!("slide{}_image_{:03}", slide, i)
            });
            out.blocks.push(Block::image(name.clone(), name));
        }
        Shape::Table { rows, .. } => {
            if let Some(table) = Block::table(rows.clone()) {
                out.blocks.push(table);
            }
        }
        Shape::Unreadable { name, reason } => {
            let label = if name.is_empty() { "shape" } else { name };
            let reason = format!("{}: {}", label, reason);
            out.warn(format!("slide {}: shape extraction failed: {}", slide, reason));
            out.blocks.push(Block::shape_failure(reason));
        }
    }
}

fn paragraph_block(para: &SlideParagraph) -> Option<Block> {
    let inline: Vec<InlineRun> = para
        .runs
        .iter()
        .filter(|r| !r.text.is_empty())
        .map(|r| {
            InlineRun::new(r.text.clone())
                .with_bold(r.bold)
                .with_italic(r.italic)
                .with_underline(r.underline)
                .with_strike(r.strike)
        })
        .collect();
    if inline.iter().all(|r| r.text.trim().is_empty()) {
        return None;
    }
    Some(if para.level > 0 {
        Block::list_item(inline, para.level.saturating_add(1))
    } else {
        Block::paragraph(inline)
    })
}
