//! Image optimizer configuration.

use crate::error::Error;
use std::str::FromStr;

/// Output codecs the optimizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Lossless PNG
    Png,
    /// Baseline JPEG (no alpha)
    Jpeg,
    /// Lossy WebP with optional alpha
    WebP,
}

impl Codec {
    /// File extension with leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Codec::Png => ".png",
            Codec::Jpeg => ".jpg",
            Codec::WebP => ".webp",
        }
    }

    /// MIME type of the encoded output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Codec::Png => "image/png",
            Codec::Jpeg => "image/jpeg",
            Codec::WebP => "image/webp",
        }
    }

    /// Whether the codec keeps an alpha channel.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, Codec::Jpeg)
    }
}

impl FromStr for Codec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "png" => Ok(Codec::Png),
            "jpg" | "jpeg" => Ok(Codec::Jpeg),
            "webp" => Ok(Codec::WebP),
            other => Err(Error::Config(format!(
                "unknown image format '{}' (expected png, jpeg or webp)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension().trim_start_matches('.'))
    }
}

/// Immutable optimizer settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Run the optimizer at all (disabled = passthrough)
    pub enabled: bool,

    /// Maximum output width in pixels
    pub max_width: u32,

    /// Maximum output height in pixels
    pub max_height: u32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,

    /// WebP quality (1-100)
    pub webp_quality: u8,

    /// Prefer WebP over JPEG/PNG
    pub prefer_webp: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_width: 1920,
            max_height: 1080,
            jpeg_quality: 85,
            webp_quality: 80,
            prefer_webp: true,
        }
    }
}

impl OptimizerOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable optimization.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the resize bounds. Zero values are raised to 1.
    pub fn with_max_size(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width.max(1);
        self.max_height = max_height.max(1);
        self
    }

    /// Set JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Set WebP quality.
    pub fn with_webp_quality(mut self, quality: u8) -> Self {
        self.webp_quality = quality.clamp(1, 100);
        self
    }

    /// Prefer WebP output.
    pub fn with_prefer_webp(mut self, prefer: bool) -> Self {
        self.prefer_webp = prefer;
        self
    }
}
