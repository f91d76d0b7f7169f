//! Adaptive image optimization.
//!
//! Every extracted image passes through [`ImageOptimizer`], which decides
//! resolution, codec and quality:
//!
//! 1. Downscale uniformly to fit `max_width x max_height` (Lanczos3).
//! 2. Pick a codec: images with alpha or a palette keep transparency
//!    (WebP, else PNG); opaque images are classified as photographic or
//!    graphic by [`classify`] and sent to WebP, JPEG or PNG accordingly.
//! 3. Encode with a fixed balanced effort setting.
//!
//! The optimizer holds only immutable configuration and can be shared across
//! conversions by reference.

mod classify;
mod encode;
mod options;

pub use classify::{classify, ImageClass};
pub use options::{Codec, OptimizerOptions};

use crate::error::{Error, Result};
use crate::model::{
    detect_mime_type, extension_for_content_type, mime_for_extension, ImageAsset, OptimizedImage,
};
use image::imageops::FilterType;
use image::DynamicImage;

/// Image optimizer with fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ImageOptimizer {
    options: OptimizerOptions,
}

impl ImageOptimizer {
    /// Create an optimizer.
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// The optimizer's configuration.
    pub fn options(&self) -> &OptimizerOptions {
        &self.options
    }

    /// Optimize an extracted asset, consuming it.
    pub fn optimize_asset(&self, asset: ImageAsset, hint: Option<Codec>) -> Result<OptimizedImage> {
        if asset.raw_bytes.is_empty() {
            return Err(Error::ImageDecode(format!("{} is empty", asset.name)));
        }
        if !self.options.enabled {
            let content_type = asset.content_type().to_string();
            return Ok(passthrough(asset.raw_bytes, &content_type));
        }
        self.optimize_bytes(&asset.raw_bytes, hint)
    }

    /// Decode raw bytes and optimize them.
    pub fn optimize_bytes(&self, bytes: &[u8], hint: Option<Codec>) -> Result<OptimizedImage> {
        if bytes.is_empty() {
            return Err(Error::ImageDecode("empty image data".to_string()));
        }
        if !self.options.enabled {
            let content_type = detect_mime_type(bytes).unwrap_or("image/png");
            return Ok(passthrough(bytes.to_vec(), content_type));
        }

        let img = image::load_from_memory(bytes)?;
        self.optimize(&img, has_palette(bytes), hint)
    }

    /// Optimize a decoded image.
    ///
    /// `palette` marks indexed-color sources, which the decoder expands to
    /// RGB(A) and would otherwise be indistinguishable.
    pub fn optimize(
        &self,
        img: &DynamicImage,
        palette: bool,
        hint: Option<Codec>,
    ) -> Result<OptimizedImage> {
        let resized = self.resize(img);
        let img = resized.as_ref().unwrap_or(img);

        let codec = match hint {
            Some(codec) => codec,
            None => self.select_codec(img, palette),
        };

        // Indexed sources decode without alpha; alpha-capable codecs get RGBA
        let expanded;
        let img = if palette && codec.supports_alpha() && !img.color().has_alpha() {
            expanded = DynamicImage::ImageRgba8(img.to_rgba8());
            &expanded
        } else {
            img
        };

        let bytes = match codec {
            Codec::WebP => encode::encode_webp(img, self.options.webp_quality)?,
            Codec::Jpeg => encode::encode_jpeg(img, self.options.jpeg_quality)?,
            Codec::Png => encode::encode_png(img)?,
        };

        log::debug!(
            "encoded {}x{} image as {} ({} bytes)",
            img.width(),
            img.height(),
            codec,
            bytes.len()
        );

        Ok(OptimizedImage {
            bytes,
            extension: codec.extension(),
            mime_type: codec.mime_type(),
            width: img.width(),
            height: img.height(),
        })
    }

    /// Choose the output codec for an image that is already resized.
    pub fn select_codec(&self, img: &DynamicImage, palette: bool) -> Codec {
        if img.color().has_alpha() || palette {
            return if self.options.prefer_webp {
                Codec::WebP
            } else {
                Codec::Png
            };
        }

        match classify(img) {
            ImageClass::Photographic if self.options.prefer_webp => Codec::WebP,
            ImageClass::Photographic => Codec::Jpeg,
            ImageClass::Graphic if self.options.prefer_webp => Codec::WebP,
            ImageClass::Graphic => Codec::Png,
        }
    }

    /// Target dimensions after fitting into the configured bounds.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let (max_w, max_h) = (self.options.max_width.max(1), self.options.max_height.max(1));
        if width <= max_w && height <= max_h {
            return (width, height);
        }
        let ratio = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
        let new_w = ((width as f64 * ratio).floor() as u32).clamp(1, max_w);
        let new_h = ((height as f64 * ratio).floor() as u32).clamp(1, max_h);
        (new_w, new_h)
    }

    fn resize(&self, img: &DynamicImage) -> Option<DynamicImage> {
        let (width, height) = (img.width(), img.height());
        let (new_w, new_h) = self.target_size(width, height);
        if (new_w, new_h) == (width, height) {
            return None;
        }
        log::debug!(
            "resizing image {}x{} -> {}x{}",
            width,
            height,
            new_w,
            new_h
        );
        Some(img.resize_exact(new_w, new_h, FilterType::Lanczos3))
    }
}

/// Size ratio of optimized to original output (1.0 for an empty original).
pub fn compression_ratio(original: usize, optimized: usize) -> f64 {
    if original == 0 {
        return 1.0;
    }
    optimized as f64 / original as f64
}

/// Whether the source bytes are an indexed-color raster.
fn has_palette(bytes: &[u8]) -> bool {
    match detect_mime_type(bytes) {
        // IHDR colour type lives at byte 25 of the file
        Some("image/png") => bytes.get(25) == Some(&3),
        Some("image/gif") => true,
        _ => false,
    }
}

fn passthrough(bytes: Vec<u8>, content_type: &str) -> OptimizedImage {
    let extension = extension_for_content_type(content_type);
    OptimizedImage {
        bytes,
        extension,
        mime_type: mime_for_extension(extension),
        width: 0,
        height: 0,
    }
}
