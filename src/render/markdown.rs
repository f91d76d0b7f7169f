//! Markdown rendering of the Block Model.

use crate::error::{Error, Result};
use crate::model::{escape_cell, Block, ImageBlock, InlineRun};

use super::cleanup;
use super::{ImageMode, RenderOptions};

/// Convert blocks to Markdown.
pub fn to_markdown(blocks: &[Block], options: &RenderOptions) -> Result<String> {
    MarkdownRenderer::new(options.clone()).render(blocks)
}

/// Markdown renderer. Pure and deterministic for a given option set.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render blocks to a normalized Markdown document.
    pub fn render(&self, blocks: &[Block]) -> Result<String> {
        let mut output = String::new();
        let mut prev: Option<&Block> = None;

        for block in blocks {
            let fragment = self.render_block(block)?;
            if fragment.is_empty() {
                continue;
            }
            if let Some(prev) = prev {
                output.push_str(separator_between(prev, block));
            }
            output.push_str(&fragment);
            prev = Some(block);
        }

        Ok(cleanup::normalize(&output, self.options.normalize_unicode))
    }

    /// Render a single block without the document post-pass.
    pub fn render_block(&self, block: &Block) -> Result<String> {
        match block {
            Block::Heading { level, inline } => {
                let text = self.render_inline(inline);
                if *level == 0 || text.is_empty() {
                    return Ok(text);
                }
                Ok(format!("{} {}", "#".repeat(*level as usize), text))
            }
            Block::Paragraph {
                inline,
                list_indent,
            } => {
                let text = self.render_inline(inline);
                if text.is_empty() || *list_indent == 0 {
                    return Ok(text);
                }
                let indent = "  ".repeat(*list_indent as usize - 1);
                Ok(format!("{}- {}", indent, text))
            }
            Block::Table { rows } => render_table(rows),
            Block::Image(image) => self.render_image(image),
            Block::Raw { text } => Ok(text.clone()),
            Block::Separator => Ok("\n---\n".to_string()),
        }
    }

    /// Render inline runs, trimmed.
    pub fn render_inline(&self, runs: &[InlineRun]) -> String {
        let mut output = String::new();
        for run in runs {
            self.render_run(&mut output, run);
        }
        output.trim().to_string()
    }

    /// Markers wrap strike, then underline, then italic, then bold (outermost).
    /// Surrounding whitespace stays outside the markers.
    fn render_run(&self, output: &mut String, run: &InlineRun) {
        if run.text.is_empty() {
            return;
        }
        let styled = run.bold || run.italic || run.underline || run.strike;
        let core = run.text.trim();
        if !styled || core.is_empty() {
            output.push_str(&self.escape(&run.text));
            return;
        }

        let lead = &run.text[..run.text.len() - run.text.trim_start().len()];
        let trail = &run.text[run.text.trim_end().len()..];

        let mut text = self.escape(core);
        if run.strike {
            text = format!("~~{}~~", text);
        }
        if run.underline {
            text = format!("<u>{}</u>", text);
        }
        if run.italic {
            text = format!("_{}_", text);
        }
        if run.bold {
            text = format!("**{}**", text);
        }

        output.push_str(lead);
        output.push_str(&text);
        output.push_str(trail);
    }

    fn escape(&self, text: &str) -> String {
        if self.options.escape_special_chars {
            escape_markdown(text)
        } else {
            text.to_string()
        }
    }

    fn render_image(&self, image: &ImageBlock) -> Result<String> {
        let file = image.relative_path.as_deref();
        let data = image.data_uri.as_deref();
        let target = match self.options.image_mode {
            ImageMode::Base64 => data.or(file),
            ImageMode::File | ImageMode::Both => file.or(data),
        };
        match target {
            Some(target) => Ok(format!("![{}]({})", image.alt, target)),
            None => Err(Error::RenderInvariant(format!(
                "image '{}' reached the renderer without a path or data URI",
                image.placement_hint
            ))),
        }
    }
}

/// Text placed between two rendered neighbours.
fn separator_between(prev: &Block, next: &Block) -> &'static str {
    let tight = |b: &Block| matches!(b, Block::Raw { .. } | Block::Separator);
    if tight(prev) || tight(next) {
        "\n"
    } else {
        "\n\n"
    }
}

/// GFM pipe table. Row 0 is the header.
fn render_table(rows: &[Vec<String>]) -> Result<String> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return Err(Error::RenderInvariant(
            "table block with no rows or columns".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = (0..width)
            .map(|c| row.get(c).map(|cell| escape_cell(cell)).unwrap_or_default())
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
        if i == 0 {
            lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
        }
    }
    Ok(lines.join("\n"))
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' | '<' | '~' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
