//! Rendering module for converting blocks to Markdown.

mod cleanup;
mod markdown;
mod options;

pub use cleanup::normalize;
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{ImageMode, RenderOptions};
