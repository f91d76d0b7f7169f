//! Legacy Word (`.doc`) adapter over an external HTML rendering.
//!
//! This path sees only what the fallback converter emits: headings and list
//! nesting survive when the HTML carries them, run styles come from inline
//! tags alone. It is intentionally kept separate from [`WordAdapter`]
//! (`super::WordAdapter`) rather than mapped onto the same object model.

use super::{numbered, AdapterContext, Extraction, ImageCursor, SourceAdapter};
use crate::container::xml::{XmlElement, XmlNode};
use crate::container::HtmlConversion;
use crate::error::{Error, Result};
use crate::model::{Block, InlineRun};

/// Adapter for documents without a readable object model.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyWordAdapter;

impl SourceAdapter for LegacyWordAdapter {
    fn parse(&self, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction> {
        let fallback = ctx.fallback.ok_or_else(|| {
            Error::ContainerRead(format!(
                "{} is not an OOXML package and no HTML fallback converter is configured",
                ctx.file_name
            ))
        })?;
        let conversion = fallback.convert(&bytes)?;
        let mut out = Extraction::default();
        for message in &conversion.messages {
            out.warn(format!("{}: {}", ctx.file_name, message));
        }

        let root = conversion.parse()?;
        let body = find_body(&root);
        let mut walker = HtmlWalker {
            conversion: &conversion,
            ctx,
            cursor: ImageCursor::new(),
            out: &mut out,
            pending: Vec::new(),
            pending_images: Vec::new(),
        };
        walker.blocks(body, 0);
        walker.flush();
        let assets = walker.cursor.into_assets();
        out.assets = assets;
        Ok(out)
    }
}

fn find_body(root: &XmlElement) -> &XmlElement {
    if root.name == "body" {
        return root;
    }
    root.descendant("body").unwrap_or(root)
}

/// Inline style inherited from enclosing tags.
#[derive(Debug, Clone, Copy, Default)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
}

impl Style {
    fn apply(mut self, tag: &str) -> Self {
        match tag {
            "b" | "strong" => self.bold = true,
            "i" | "em" => self.italic = true,
            "u" | "ins" => self.underline = true,
            "s" | "strike" | "del" => self.strike = true,
            _ => {}
        }
        self
    }

    fn run(self, text: String) -> InlineRun {
        InlineRun::new(text)
            .with_bold(self.bold)
            .with_italic(self.italic)
            .with_underline(self.underline)
            .with_strike(self.strike)
    }
}

struct HtmlWalker<'a, 'c> {
    conversion: &'a HtmlConversion,
    ctx: &'a AdapterContext<'c>,
    cursor: ImageCursor,
    out: &'a mut Extraction,
    /// Loose inline content between block elements
    pending: Vec<InlineRun>,
    /// Images met inside the current block, emitted after it
    pending_images: Vec<Block>,
}

impl HtmlWalker<'_, '_> {
    /// Walk block-level content. `list_depth` counts enclosing lists.
    fn blocks(&mut self, el: &XmlElement, list_depth: u8) {
        for child in &el.children {
            match child {
                XmlNode::Text(text) => self.pending.push(Style::default().run(collapse(text))),
                XmlNode::Element(e) => self.block(e, list_depth),
            }
        }
    }

    fn block(&mut self, el: &XmlElement, list_depth: u8) {
        match el.name.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = el.name[1..].parse::<u8>().unwrap_or(0);
                let inline = self.inline_of(el);
                self.emit(Block::heading(level, inline));
            }
            "p" | "pre" | "address" | "dt" | "dd" | "caption" => {
                self.flush();
                let inline = self.inline_of(el);
                self.emit(paragraph(inline, list_depth));
            }
            "ul" | "ol" => {
                self.flush();
                for item in el.elements() {
                    if item.name == "li" {
                        self.list_item(item, list_depth.saturating_add(1));
                    } else {
                        self.block(item, list_depth.saturating_add(1));
                    }
                }
            }
            "li" => {
                self.flush();
                self.list_item(el, list_depth.max(1));
            }
            "table" => {
                self.flush();
                let mut rows = Vec::new();
                collect_rows(el, &mut rows);
                if let Some(table) = Block::table(rows) {
                    self.out.blocks.push(table);
                }
            }
            "img" => {
                self.flush();
                if let Some(block) = self.image(el) {
                    self.out.blocks.push(block);
                }
            }
            "hr" => {
                self.flush();
                self.out.blocks.push(Block::Separator);
            }
            "div" | "body" | "section" | "article" | "blockquote" | "main" | "header"
            | "footer" | "dl" | "html" | "center" => self.blocks(el, list_depth),
            "head" | "script" | "style" | "title" | "meta" | "link" => {}
            _ => self.inline(el, Style::default()),
        }
    }

    fn list_item(&mut self, li: &XmlElement, depth: u8) {
        let mut inline = Vec::new();
        let mut nested = Vec::new();
        for child in &li.children {
            match child {
                XmlNode::Element(e) if e.name == "ul" || e.name == "ol" => nested.push(e),
                XmlNode::Element(e) if e.name == "p" => {
                    self.collect_inline(e, Style::default(), &mut inline);
                }
                XmlNode::Element(e) => self.collect_inline_node(e, Style::default(), &mut inline),
                XmlNode::Text(t) => inline.push(Style::default().run(collapse(t))),
            }
        }
        self.emit(Block::list_item(inline, depth));
        for list in nested {
            self.block(list, depth);
        }
    }

    fn inline_of(&mut self, el: &XmlElement) -> Vec<InlineRun> {
        let mut runs = Vec::new();
        self.collect_inline(el, Style::default(), &mut runs);
        runs
    }

    fn inline(&mut self, el: &XmlElement, style: Style) {
        let mut runs = std::mem::take(&mut self.pending);
        self.collect_inline_node(el, style, &mut runs);
        self.pending = runs;
    }

    fn collect_inline(&mut self, el: &XmlElement, style: Style, runs: &mut Vec<InlineRun>) {
        for child in &el.children {
            match child {
                XmlNode::Text(t) => runs.push(style.run(collapse(t))),
                XmlNode::Element(e) => self.collect_inline_node(e, style, runs),
            }
        }
    }

    fn collect_inline_node(&mut self, el: &XmlElement, style: Style, runs: &mut Vec<InlineRun>) {
        match el.name.as_str() {
            "br" => runs.push(InlineRun::new("\n")),
            "img" => {
                if let Some(block) = self.image(el) {
                    self.pending_images.push(block);
                }
            }
            "script" | "style" => {}
            tag => self.collect_inline(el, style.apply(tag), runs),
        }
    }

    fn image(&mut self, el: &XmlElement) -> Option<Block> {
        if !self.ctx.extract_images {
            return None;
        }
        let src = el.attr("src").unwrap_or_default();
        match self.conversion.resolve_image(src) {
            Some((data, content_type)) => {
                let name = self
                    .cursor
                    .push(data, content_type, |i| numbered("image_", i));
                Some(Block::image(name, "image"))
            }
            None => {
                let shown: String = src.chars().take(60).collect();
                self.out.warn(format!(
                    "{}: image source '{}' could not be resolved, skipped",
                    self.ctx.file_name, shown
                ));
                None
            }
        }
    }

    fn emit(&mut self, block: Block) {
        if !block_is_blank(&block) {
            self.out.blocks.push(block);
        }
        let images = std::mem::take(&mut self.pending_images);
        self.out.blocks.extend(images);
    }

    /// Turn loose inline content into a paragraph.
    fn flush(&mut self) {
        let runs = std::mem::take(&mut self.pending);
        self.emit(Block::paragraph(runs));
    }
}

fn paragraph(inline: Vec<InlineRun>, list_depth: u8) -> Block {
    if list_depth > 0 {
        Block::list_item(inline, list_depth)
    } else {
        Block::paragraph(inline)
    }
}

fn block_is_blank(block: &Block) -> bool {
    match block {
        Block::Heading { inline, .. } | Block::Paragraph { inline, .. } => {
            inline.iter().all(|r| r.text.trim().is_empty())
        }
        _ => false,
    }
}

fn collect_rows(el: &XmlElement, rows: &mut Vec<Vec<String>>) {
    for child in el.elements() {
        match child.name.as_str() {
            "tr" => rows.push(
                child
                    .elements()
                    .filter(|c| c.name == "td" || c.name == "th")
                    .map(|c| collapse(&c.text()).trim().to_string())
                    .collect(),
            ),
            "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
            _ => {}
        }
    }
}

/// HTML whitespace folding: any run of whitespace becomes one space.
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
