//! # officemd
//!
//! Office document to Markdown conversion for Rust.
//!
//! This library reads Word (`.docx`, `.doc` through a fallback), Excel
//! (`.xlsx`) and PowerPoint (`.pptx`) files, normalizes their content into a
//! single block model, renders it as Markdown, and extracts embedded images
//! through an adaptive optimizer that picks resolution, codec and quality.
//!
//! ## Quick Start
//!
//! ```no_run
//! use officemd::{convert_file, to_markdown};
//!
//! fn main() -> officemd::Result<()> {
//!     // Markdown with images embedded as data URIs, nothing written
//!     let markdown = to_markdown("report.docx")?;
//!     println!("{}", markdown);
//!
//!     // Markdown and optimized images written under ./cache/<identifier>/
//!     let result = convert_file("deck.pptx", "./cache")?;
//!     println!("{} images", result.images.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **One block model**: headings, paragraphs, lists, tables, images
//! - **Adaptive images**: photographic/graphic classification, WebP/JPEG/PNG
//! - **Graceful degradation**: a bad image or shape becomes a visible note
//! - **Idempotent output**: directories named by a content fingerprint

pub mod adapter;
pub mod config;
pub mod container;
pub mod convert;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod model;
pub mod optimize;
pub mod render;

// Re-export commonly used types
pub use config::Config;
pub use convert::{ConversionResult, ConvertOptions, Converter, FsSink, OutputSink};
pub use detect::{ContainerKind, SourceFormat};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use model::{Block, ImageAsset, ImageBlock, InlineRun, Metadata, OptimizedImage};
pub use optimize::{Codec, ImageOptimizer, OptimizerOptions};
pub use render::{ImageMode, RenderOptions};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Convert a document and write Markdown plus images under `output_root`.
///
/// Uses default optimizer and conversion options.
///
/// # Example
///
/// ```no_run
/// use officemd::convert_file;
///
/// let result = convert_file("budget.xlsx", "./out").unwrap();
/// println!("{}", result.markdown_path.unwrap().display());
/// ```
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    output_root: impl Into<PathBuf>,
) -> Result<ConversionResult> {
    convert_file_with_options(path, output_root, &ConvertOptions::default())
}

/// Convert a document with custom options.
///
/// # Example
///
/// ```no_run
/// use officemd::{convert_file_with_options, ConvertOptions, ImageMode};
///
/// let options = ConvertOptions::new()
///     .with_image_mode(ImageMode::Both)
///     .with_output_name("quarterly");
/// let result = convert_file_with_options("report.docx", "./out", &options).unwrap();
/// ```
pub fn convert_file_with_options<P: AsRef<Path>>(
    path: P,
    output_root: impl Into<PathBuf>,
    options: &ConvertOptions,
) -> Result<ConversionResult> {
    let optimizer = Arc::new(ImageOptimizer::default());
    Converter::new(output_root, optimizer).convert_file(path, options)
}

/// Convert a document to Markdown without writing anything.
///
/// Images are embedded as data URIs.
///
/// # Example
///
/// ```no_run
/// use officemd::to_markdown;
///
/// let markdown = to_markdown("notes.docx").unwrap();
/// std::fs::write("notes.md", markdown).unwrap();
/// ```
pub fn to_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    to_markdown_with_options(path, &ConvertOptions::default())
}

/// Convert a document to Markdown with custom options, writing nothing.
pub fn to_markdown_with_options<P: AsRef<Path>>(
    path: P,
    options: &ConvertOptions,
) -> Result<String> {
    let path = path.as_ref();
    SourceFormat::from_path(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;

    let converter = Converter::new(PathBuf::new(), Arc::new(ImageOptimizer::default()));
    Ok(converter.to_markdown(bytes, file_name, options)?.markdown)
}
