//! Rendering options and configuration.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How image references appear in the Markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Write image files and link them by relative path
    #[default]
    File,
    /// Embed images as data URIs, write nothing
    Base64,
    /// Write files and attach data URIs; the Markdown links the file
    Both,
}

impl ImageMode {
    /// Whether image files are written to the output directory.
    pub fn writes_files(&self) -> bool {
        matches!(self, ImageMode::File | ImageMode::Both)
    }

    /// Whether blocks carry a data URI.
    pub fn embeds_data(&self) -> bool {
        matches!(self, ImageMode::Base64 | ImageMode::Both)
    }

    /// Name as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMode::File => "file",
            ImageMode::Base64 => "base64",
            ImageMode::Both => "both",
        }
    }
}

impl FromStr for ImageMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(ImageMode::File),
            "base64" => Ok(ImageMode::Base64),
            "both" => Ok(ImageMode::Both),
            other => Err(Error::Config(format!(
                "unknown image mode '{}' (expected file, base64 or both)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for rendering blocks to Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Which image reference form to emit
    pub image_mode: ImageMode,

    /// Escape special Markdown characters in run text
    pub escape_special_chars: bool,

    /// Apply Unicode NFC normalization to the output
    pub normalize_unicode: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_mode: ImageMode::File,
            escape_special_chars: false,
            normalize_unicode: true,
        }
    }
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image mode.
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    /// Enable or disable Markdown escaping of run text.
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Enable or disable NFC normalization.
    pub fn with_unicode_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}
