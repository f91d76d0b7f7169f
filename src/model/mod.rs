//! Document model types shared by adapters, renderer and converter.
//!
//! This module defines the intermediate representation (IR) that bridges
//! format-specific object models and Markdown rendering. The model is
//! format-agnostic: word, spreadsheet and presentation sources all produce
//! the same [`Block`] sequence.

mod asset;
mod block;

pub use asset::{
    detect_mime_type, extension_for_content_type, mime_for_extension, ImageAsset, OptimizedImage,
};
pub use block::{escape_cell, plain_text, Block, ImageBlock, InlineRun};

use std::collections::BTreeMap;

/// Ordered string metadata attached to a conversion result.
pub type Metadata = BTreeMap<String, String>;
