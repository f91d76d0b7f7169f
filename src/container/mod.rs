//! Thin readers exposing each container format's object model.
//!
//! Readers parse the zip package and XML parts into plain structs; they make
//! no Markdown decisions. Format adapters consume these structs.

pub mod html;
pub mod package;
pub mod slides;
pub mod word;
pub mod workbook;
pub mod xml;

pub use html::{HtmlConversion, HtmlFallback, HtmlImage};
pub use package::{CoreProperties, Package, Relationship, Relationships};
pub use slides::{PresentationReader, Shape, Slide, SlideParagraph, SlideRun, SlideSize};
pub use word::{BodyElement, WordParagraph, WordReader, WordRun, WordTable};
pub use workbook::{CellValue, SheetImage, WorkbookReader, Worksheet};

/// An image part read from a package.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    /// Package part name (`word/media/image1.png`)
    pub part_name: String,
    /// Raw bytes
    pub data: Vec<u8>,
    /// Declared or sniffed MIME type
    pub content_type: String,
}
