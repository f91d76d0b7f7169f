//! Photographic vs. graphic classification by sampled color cardinality.

use image::DynamicImage;
use std::collections::HashSet;

/// Side length cap for the sampling grid.
const SAMPLE_SIDE: u32 = 100;

/// Distinct colors beyond which an image is continuous-tone.
const UNIQUE_COLOR_CAP: usize = 1000;

/// Distinct-color ratio above which an image is photographic.
const PHOTO_RATIO: f64 = 0.3;

/// Heuristic image bucket driving codec choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageClass {
    /// Continuous-tone content (photos, gradients, noise)
    Photographic,
    /// Flat-color content (diagrams, screenshots, logos)
    Graphic,
}

/// Classify an image.
///
/// Samples a strided grid of `min(100, w) x min(100, h)` pixels. A budget of
/// one pixel or less is always graphic.
pub fn classify(img: &DynamicImage) -> ImageClass {
    let (width, height) = (img.width(), img.height());
    let cols = width.min(SAMPLE_SIDE);
    let rows = height.min(SAMPLE_SIDE);
    let budget = cols as usize * rows as usize;
    if budget <= 1 {
        return ImageClass::Graphic;
    }

    let rgb = img.to_rgb8();
    let mut colors: HashSet<[u8; 3]> = HashSet::with_capacity(UNIQUE_COLOR_CAP + 1);

    for row in 0..rows {
        let y = (row as u64 * height as u64 / rows as u64) as u32;
        for col in 0..cols {
            let x = (col as u64 * width as u64 / cols as u64) as u32;
            colors.insert(rgb.get_pixel(x, y).0);
            if colors.len() > UNIQUE_COLOR_CAP {
                return ImageClass::Photographic;
            }
        }
    }

    let ratio = colors.len() as f64 / budget as f64;
    if ratio > PHOTO_RATIO {
        ImageClass::Photographic
    } else {
        ImageClass::Graphic
    }
}
