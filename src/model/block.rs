//! Block-level intermediate representation.

use serde::{Deserialize, Serialize};

/// A run of text with independent formatting flags.
///
/// Runs are never merged: two adjacent bold runs render as two separately
/// wrapped fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineRun {
    /// The text content
    pub text: String,
    /// Bold text
    pub bold: bool,
    /// Italic text
    pub italic: bool,
    /// Underlined text
    pub underline: bool,
    /// Strikethrough text
    pub strike: bool,
}

impl InlineRun {
    /// Create an unstyled run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::new(text).with_bold(true)
    }

    /// Create an italic run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self::new(text).with_italic(true)
    }

    /// Set the bold flag.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set the italic flag.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Set the underline flag.
    pub fn with_underline(mut self, underline: bool) -> Self {
        self.underline = underline;
        self
    }

    /// Set the strikethrough flag.
    pub fn with_strike(mut self, strike: bool) -> Self {
        self.strike = strike;
        self
    }

    /// Check if this run has no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Concatenated text of a run sequence, without formatting.
pub fn plain_text(runs: &[InlineRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// An image placeholder emitted by an adapter and resolved by the converter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Name stem shared with the matching [`ImageAsset`](super::ImageAsset)
    pub placement_hint: String,
    /// Alternative text
    pub alt: String,
    /// Path relative to the Markdown file (`images/<name><ext>`)
    pub relative_path: Option<String>,
    /// `data:<mime>;base64,<data>` URI
    pub data_uri: Option<String>,
}

/// A node of the document tree rendered to Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// A heading. Level 0 means "not a heading" and renders as a paragraph.
    Heading {
        /// Heading level (1-6, or 0)
        level: u8,
        /// Inline content
        inline: Vec<InlineRun>,
    },

    /// A paragraph, or a list item when `list_indent > 0`.
    Paragraph {
        /// Inline content
        inline: Vec<InlineRun>,
        /// 0 = body text, n = list item nested n-1 levels deep
        list_indent: u8,
    },

    /// A rectangular table whose first row is the header.
    Table {
        /// Rows of escaped cell text, all the same length
        rows: Vec<Vec<String>>,
    },

    /// An image reference
    Image(ImageBlock),

    /// A pre-rendered Markdown fragment
    Raw {
        /// Fragment text
        text: String,
    },

    /// A horizontal rule
    Separator,
}

impl Block {
    /// Create a heading. Levels outside 1..=6 become level 0.
    pub fn heading(level: u8, inline: Vec<InlineRun>) -> Self {
        let level = if (1..=6).contains(&level) { level } else { 0 };
        Block::Heading { level, inline }
    }

    /// Create a body paragraph.
    pub fn paragraph(inline: Vec<InlineRun>) -> Self {
        Block::Paragraph {
            inline,
            list_indent: 0,
        }
    }

    /// Create a list item (`list_indent` is clamped to at least 1).
    pub fn list_item(inline: Vec<InlineRun>, list_indent: u8) -> Self {
        Block::Paragraph {
            inline,
            list_indent: list_indent.max(1),
        }
    }

    /// Build a table from a possibly jagged grid.
    ///
    /// Rows are padded to the widest row and every cell is escaped. Returns
    /// `None` when the grid has no rows or no columns, so empty source tables
    /// never produce a block.
    pub fn table(rows: Vec<Vec<String>>) -> Option<Self> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 {
            return None;
        }
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row.iter().map(|cell| escape_cell(cell)).collect()
            })
            .collect();
        Some(Block::Table { rows })
    }

    /// Create an unresolved image placeholder.
    pub fn image(placement_hint: impl Into<String>, alt: impl Into<String>) -> Self {
        Block::Image(ImageBlock {
            placement_hint: placement_hint.into(),
            alt: alt.into(),
            relative_path: None,
            data_uri: None,
        })
    }

    /// Create a raw Markdown fragment.
    pub fn raw(text: impl Into<String>) -> Self {
        Block::Raw { text: text.into() }
    }

    /// Visible note left in place of an image that could not be produced.
    pub fn image_failure(reason: impl std::fmt::Display) -> Self {
        Block::raw(format!("*[Image extraction failed: {}]*", reason))
    }

    /// Visible note left in place of a shape that could not be extracted.
    pub fn shape_failure(reason: impl std::fmt::Display) -> Self {
        Block::raw(format!("*[Shape extraction failed: {}]*", reason))
    }

    /// Check if this block is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, Block::Image(_))
    }

    /// Check if this block is a table.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table { .. })
    }

    /// Plain text of the block, without Markdown syntax.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { inline, .. } | Block::Paragraph { inline, .. } => plain_text(inline),
            Block::Table { rows } => rows
                .iter()
                .map(|r| r.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Image(img) => img.alt.clone(),
            Block::Raw { text } => text.clone(),
            Block::Separator => String::new(),
        }
    }
}

/// Prepare text for a table cell: newlines become spaces, pipes are escaped.
///
/// Already escaped pipes are left alone, so applying this twice is a no-op.
pub fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = '\0';
    for c in text.trim().chars() {
        match c {
            '\r' => {}
            '\n' => out.push(' '),
            '|' if prev != '\\' => out.push_str("\\|"),
            _ => out.push(c),
        }
        prev = c;
    }
    out
}
