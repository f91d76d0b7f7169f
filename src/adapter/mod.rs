//! Format adapters: container object model -> Block Model + raw images.
//!
//! Adapters are pure with respect to output: they never write files and never
//! call the image optimizer. They return every embedded image as an
//! [`ImageAsset`] whose `name` matches the `placement_hint` of exactly one
//! [`Block::Image`].

mod legacy_word;
mod presentation;
mod spreadsheet;
mod word;

pub use legacy_word::LegacyWordAdapter;
pub use presentation::PresentationAdapter;
pub use spreadsheet::SpreadsheetAdapter;
pub use word::WordAdapter;

use crate::container::HtmlFallback;
use crate::detect::{detect_container, ContainerKind, SourceFormat};
use crate::error::{Error, Result};
use crate::model::{Block, ImageAsset, Metadata};

/// Inputs shared by every adapter for one conversion.
#[derive(Clone, Copy)]
pub struct AdapterContext<'a> {
    /// Source file name including extension (`deck.pptx`)
    pub file_name: &'a str,
    /// Emit image blocks and assets
    pub extract_images: bool,
    /// Collaborator for legacy Word documents
    pub fallback: Option<&'a dyn HtmlFallback>,
}

impl<'a> AdapterContext<'a> {
    /// Create a context with images enabled and no fallback.
    pub fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            extract_images: true,
            fallback: None,
        }
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract_images: bool) -> Self {
        self.extract_images = extract_images;
        self
    }

    /// Attach a legacy-format fallback.
    pub fn with_fallback(mut self, fallback: Option<&'a dyn HtmlFallback>) -> Self {
        self.fallback = fallback;
        self
    }
}

impl std::fmt::Debug for AdapterContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("file_name", &self.file_name)
            .field("extract_images", &self.extract_images)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// What an adapter hands back to the converter.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Document blocks in reading order
    pub blocks: Vec<Block>,
    /// Raw images referenced by `Block::Image` placement hints
    pub assets: Vec<ImageAsset>,
    /// Format-specific metadata (core properties, counts)
    pub metadata: Metadata,
    /// Non-fatal problems met while walking the source
    pub warnings: Vec<String>,
}

impl Extraction {
    /// Record a warning and log it.
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Capability implemented once per source format.
pub trait SourceAdapter {
    /// Parse source bytes into blocks and raw images.
    fn parse(&self, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction>;
}

/// Running image counter for one traversal.
///
/// Owned by a single `parse` call; the index runs across the whole document.
#[derive(Debug, Default)]
pub struct ImageCursor {
    assets: Vec<ImageAsset>,
}

impl ImageCursor {
    /// Create an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image and return its name. `naming` receives the 1-based
    /// sequence index.
    pub fn push(
        &mut self,
        data: Vec<u8>,
        content_type: impl Into<String>,
        naming: impl FnOnce(usize) -> String,
    ) -> String {
        let index = self.assets.len() + 1;
        let name = naming(index);
        self.assets
            .push(ImageAsset::new(data, content_type, index, name.clone()));
        name
    }

    /// Number of images registered so far.
    pub fn count(&self) -> usize {
        self.assets.len()
    }

    /// Consume the cursor.
    pub fn into_assets(self) -> Vec<ImageAsset> {
        self.assets
    }
}

/// Parse a source with the adapter matching its format and container.
pub fn extract(format: SourceFormat, bytes: Vec<u8>, ctx: &AdapterContext<'_>) -> Result<Extraction> {
    let container = detect_container(&bytes);
    log::debug!("{}: {} source in {:?} container", ctx.file_name, format, container);
    match (format, container) {
        (SourceFormat::Word, ContainerKind::Zip) => WordAdapter.parse(bytes, ctx),
        (SourceFormat::Word, _) => LegacyWordAdapter.parse(bytes, ctx),
        (SourceFormat::Spreadsheet, ContainerKind::Ole) => Err(legacy_binary("workbook", "xlsx")),
        (SourceFormat::Spreadsheet, _) => SpreadsheetAdapter.parse(bytes, ctx),
        (SourceFormat::Presentation, ContainerKind::Ole) => {
            Err(legacy_binary("presentation", "pptx"))
        }
        (SourceFormat::Presentation, _) => PresentationAdapter.parse(bytes, ctx),
    }
}

fn legacy_binary(kind: &str, modern: &str) -> Error {
    Error::ContainerRead(format!(
        "legacy binary {} files cannot be read; save the file as .{} first",
        kind, modern
    ))
}

/// Zero-padded name: `prefix` + 3-digit index.
pub(crate) fn numbered(prefix: &str, index: usize) -> String {
    format!("{}{:03}", prefix, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_runs_across_calls() {
        let mut cursor = ImageCursor::new();
        let a = cursor.push(vec![1], "image/png", |i| numbered("image_", i));
        let b = cursor.push(vec![2], "image/png", |i| format!("slide3_image_{:03}", i));
        assert_eq!(a, "image_001");
        assert_eq!(b, "slide3_image_002");
        let assets = cursor.into_assets();
        assert_eq!(assets[1].sequence_index, 2);
        assert_eq!(assets[1].name, "slide3_image_002");
    }

    #[test]
    fn test_legacy_binary_rejected() {
        let ole = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0];
        let ctx = AdapterContext::new("old.xls");
        let err = extract(SourceFormat::Spreadsheet, ole.clone(), &ctx).unwrap_err();
        assert!(matches!(err, Error::ContainerRead(_)));
        let err = extract(SourceFormat::Presentation, ole, &ctx).unwrap_err();
        assert!(err.to_string().contains(".pptx"));
    }

    #[test]
    fn test_corrupt_package_is_container_error() {
        let ctx = AdapterContext::new("broken.docx");
        let err = extract(SourceFormat::Word, b"PK\x03\x04garbage".to_vec(), &ctx).unwrap_err();
        assert!(matches!(err, Error::ContainerRead(_)));
    }
}
