//! Source format detection from file extensions and container magic bytes.

use crate::error::{Error, Result};
use std::path::Path;

/// The document families this crate converts.
///
/// The set is closed: every variant is resolved once from the file extension
/// and dispatched to exactly one format adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// Word-processing documents (`.docx`, `.doc`)
    Word,
    /// Spreadsheets (`.xlsx`, `.xls`)
    Spreadsheet,
    /// Presentations (`.pptx`, `.ppt`)
    Presentation,
}

const WORD_EXTENSIONS: &[&str] = &["docx", "doc"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls"];
const PRESENTATION_EXTENSIONS: &[&str] = &["pptx", "ppt"];

impl SourceFormat {
    /// All supported variants.
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::Word,
        SourceFormat::Spreadsheet,
        SourceFormat::Presentation,
    ];

    /// Resolve a format from a file extension (with or without leading dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    ".{}. Supported formats: {}",
                    ext,
                    Self::supported_extensions().join(", ")
                ))
            })
    }

    /// Resolve a format from a file path's extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("{} has no file extension", path.display()))
            })?;
        Self::from_extension(ext)
    }

    /// Extensions handled by this format, lowercase without the dot.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            SourceFormat::Word => WORD_EXTENSIONS,
            SourceFormat::Spreadsheet => SPREADSHEET_EXTENSIONS,
            SourceFormat::Presentation => PRESENTATION_EXTENSIONS,
        }
    }

    /// Every supported extension with its leading dot.
    pub fn supported_extensions() -> Vec<String> {
        Self::ALL
            .iter()
            .flat_map(|f| f.extensions().iter().map(|e| format!(".{}", e)))
            .collect()
    }

    /// Short name used in metadata (`word`, `excel`, `powerpoint`).
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Word => "word",
            SourceFormat::Spreadsheet => "excel",
            SourceFormat::Presentation => "powerpoint",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical container kind sniffed from the first bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// ZIP package (OOXML: `.docx`, `.xlsx`, `.pptx`)
    Zip,
    /// OLE2 compound file (legacy `.doc`, `.xls`, `.ppt`)
    Ole,
    /// Anything else
    Unknown,
}

/// ZIP local file header: PK\x03\x04
const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];
/// OLE2 compound document header
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Detect the container kind from leading bytes.
pub fn detect_container(data: &[u8]) -> ContainerKind {
    if data.starts_with(ZIP_MAGIC) {
        ContainerKind::Zip
    } else if data.starts_with(OLE_MAGIC) {
        ContainerKind::Ole
    } else {
        ContainerKind::Unknown
    }
}
