//! Error types for officemd library.

use std::io;
use thiserror::Error;

/// Result type alias for officemd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document conversion.
///
/// Only [`Error::UnsupportedFormat`], [`Error::ContainerRead`] and
/// [`Error::RenderInvariant`] abort a conversion. Image and shape failures are
/// downgraded to visible notes in the Markdown output by the converter.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file extension is not one of the supported formats.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The source container is corrupt or unreadable.
    #[error("Failed to read document container: {0}")]
    ContainerRead(String),

    /// An embedded image is not a decodable raster.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// A single presentation shape could not be extracted.
    #[error("Shape extraction error: {0}")]
    ShapeExtraction(String),

    /// A block reached the renderer in a state adapters must never produce.
    #[error("Render invariant violated: {0}")]
    RenderInvariant(String),

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only affects a single block of the output.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::ImageDecode(_) | Error::ShapeExtraction(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::ContainerRead(e.to_string()),
            _ => Error::ContainerRead(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::ContainerRead(format!("malformed XML: {}", err))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
