//! Raw and optimized image payloads.

/// An embedded image as extracted by a format adapter.
///
/// Consumed exactly once by the image optimizer.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    /// Raw binary data as stored in the container
    pub raw_bytes: Vec<u8>,

    /// MIME type declared by the container (e.g., "image/png")
    pub declared_content_type: String,

    /// 1-based position across the whole document
    pub sequence_index: usize,

    /// Output name stem, also the `placement_hint` of the matching image block
    pub name: String,
}

impl ImageAsset {
    /// Create a new asset.
    pub fn new(
        raw_bytes: Vec<u8>,
        declared_content_type: impl Into<String>,
        sequence_index: usize,
        name: impl Into<String>,
    ) -> Self {
        Self {
            raw_bytes,
            declared_content_type: declared_content_type.into(),
            sequence_index,
            name: name.into(),
        }
    }

    /// Get the size of the raw data in bytes.
    pub fn size(&self) -> usize {
        self.raw_bytes.len()
    }

    /// Declared content type, or one sniffed from magic bytes when the
    /// container did not declare a usable image type.
    pub fn content_type(&self) -> &str {
        if self.declared_content_type.starts_with("image/") {
            &self.declared_content_type
        } else {
            detect_mime_type(&self.raw_bytes).unwrap_or("application/octet-stream")
        }
    }
}

/// The optimizer's output, owned by the converter until written.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    /// Encoded bytes
    pub bytes: Vec<u8>,

    /// File extension with leading dot (e.g., ".webp")
    pub extension: &'static str,

    /// MIME type matching `extension`
    pub mime_type: &'static str,

    /// Output width in pixels (0 when passed through undecoded)
    pub width: u32,

    /// Output height in pixels (0 when passed through undecoded)
    pub height: u32,
}

impl OptimizedImage {
    /// File name for this image given a name stem.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.extension)
    }
}

/// File extension (with dot) for a declared image content type.
///
/// Unknown types fall back to `.png`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/webp" => ".webp",
        "image/tiff" => ".tiff",
        _ => ".png",
    }
}

/// MIME type for an extension produced by [`extension_for_content_type`].
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.') {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Detect image MIME type from data magic bytes.
pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // GIF: GIF87a or GIF89a
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // TIFF: 49 49 2A 00 (little-endian) or 4D 4D 00 2A (big-endian)
    if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
    {
        return Some("image/tiff");
    }

    // BMP: BM
    if data.starts_with(b"BM") {
        return Some("image/bmp");
    }

    // WEBP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}
