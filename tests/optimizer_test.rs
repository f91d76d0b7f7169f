//! Image optimizer behavior over synthetic rasters.

mod common;

use common::*;
use image::DynamicImage;
use officemd::optimize::{classify, compression_ratio, ImageClass};
use officemd::{Codec, Error, ImageAsset, ImageOptimizer, OptimizerOptions};

fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() > 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

#[test]
fn test_single_color_is_graphic_at_any_size() {
    for (w, h) in [(1, 1), (2, 1), (10, 10), (100, 100), (640, 480)] {
        assert_eq!(classify(&flat_image(w, h)), ImageClass::Graphic, "{}x{}", w, h);
    }
}

#[test]
fn test_noise_is_photographic() {
    assert_eq!(classify(&noise_image(100, 100)), ImageClass::Photographic);
    assert_eq!(classify(&noise_image(300, 200)), ImageClass::Photographic);
}

#[test]
fn test_resize_fits_bounds_and_keeps_aspect() {
    let optimizer = ImageOptimizer::default();
    for (w, h) in [(4000, 1000), (1000, 3000), (2500, 1500), (1921, 1081)] {
        let out = optimizer.optimize(&flat_image(w, h), false, None).unwrap();
        assert!(out.width <= 1920 && out.height <= 1080, "{}x{}", out.width, out.height);

        // Aspect ratio within one pixel of rounding
        let expected_h = out.width as f64 * h as f64 / w as f64;
        assert!((expected_h - out.height as f64).abs() <= 1.0, "{}x{}", w, h);
    }
}

#[test]
fn test_small_images_keep_size() {
    let out = ImageOptimizer::default()
        .optimize(&flat_image(300, 200), false, None)
        .unwrap();
    assert_eq!((out.width, out.height), (300, 200));
}

#[test]
fn test_codec_selection_matrix() {
    let webp = ImageOptimizer::default();
    let classic = ImageOptimizer::new(OptimizerOptions::new().with_prefer_webp(false));

    let photo = noise_image(120, 120);
    let graphic = flat_image(120, 120);
    let alpha = alpha_image(64, 64);

    assert_eq!(webp.select_codec(&photo, false), Codec::WebP);
    assert_eq!(webp.select_codec(&graphic, false), Codec::WebP);
    assert_eq!(webp.select_codec(&alpha, false), Codec::WebP);

    assert_eq!(classic.select_codec(&photo, false), Codec::Jpeg);
    assert_eq!(classic.select_codec(&graphic, false), Codec::Png);
    assert_eq!(classic.select_codec(&alpha, false), Codec::Png);
    // Indexed sources take the transparency branch even when opaque
    assert_eq!(classic.select_codec(&photo, true), Codec::Png);
}

#[test]
fn test_encoded_outputs() {
    let webp = ImageOptimizer::default()
        .optimize(&alpha_image(32, 32), false, None)
        .unwrap();
    assert_eq!(webp.extension, ".webp");
    assert_eq!(webp.mime_type, "image/webp");
    assert!(is_webp(&webp.bytes));

    let classic = ImageOptimizer::new(OptimizerOptions::new().with_prefer_webp(false));
    let jpeg = classic.optimize(&noise_image(120, 120), false, None).unwrap();
    assert_eq!(jpeg.extension, ".jpg");
    assert!(jpeg.bytes.starts_with(&[0xFF, 0xD8]));

    let png_out = classic.optimize(&flat_image(50, 50), false, None).unwrap();
    assert_eq!(png_out.extension, ".png");
    let decoded = image::load_from_memory(&png_out.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (50, 50));
}

#[test]
fn test_alpha_flattened_for_jpeg_hint() {
    let out = ImageOptimizer::default()
        .optimize(&alpha_image(16, 16), false, Some(Codec::Jpeg))
        .unwrap();
    let decoded = image::load_from_memory(&out.bytes).unwrap();
    assert!(!decoded.color().has_alpha());

    // Transparent half is matted against white
    let px = decoded.to_rgb8().get_pixel(1, 8).0;
    assert!(px.iter().all(|&c| c > 230), "{:?}", px);
}

#[test]
fn test_degenerate_transparent_pixel() {
    let img = DynamicImage::ImageRgba8(image::RgbaImage::new(1, 1));
    let bytes = png(img);
    for prefer_webp in [true, false] {
        let optimizer = ImageOptimizer::new(OptimizerOptions::new().with_prefer_webp(prefer_webp));
        let out = optimizer.optimize_bytes(&bytes, None).unwrap();
        assert_eq!((out.width, out.height), (1, 1));
    }
}

#[test]
fn test_decode_failures() {
    let optimizer = ImageOptimizer::default();
    assert!(matches!(optimizer.optimize_bytes(&[], None), Err(Error::ImageDecode(_))));
    assert!(matches!(
        optimizer.optimize_bytes(b"not an image", None),
        Err(Error::ImageDecode(_))
    ));

    let empty = ImageAsset::new(Vec::new(), "image/png", 1, "image_001");
    let err = optimizer.optimize_asset(empty, None).unwrap_err();
    assert!(err.is_local());
}

#[test]
fn test_disabled_passthrough() {
    let optimizer = ImageOptimizer::new(OptimizerOptions::new().with_enabled(false));
    let data = b"GIF89a-not-really".to_vec();
    let asset = ImageAsset::new(data.clone(), "image/gif", 1, "image_001");
    let out = optimizer.optimize_asset(asset, None).unwrap();
    assert_eq!(out.bytes, data);
    assert_eq!(out.extension, ".gif");

    let unknown = ImageAsset::new(vec![1, 2, 3], "application/x-emf", 2, "image_002");
    assert_eq!(optimizer.optimize_asset(unknown, None).unwrap().extension, ".png");

    // Empty input fails even without optimization
    let empty = ImageAsset::new(Vec::new(), "image/png", 3, "image_003");
    assert!(optimizer.optimize_asset(empty, None).is_err());
}

#[test]
fn test_codec_hint_parsing() {
    assert_eq!("jpg".parse::<Codec>().unwrap(), Codec::Jpeg);
    assert_eq!("JPEG".parse::<Codec>().unwrap(), Codec::Jpeg);
    assert_eq!("webp".parse::<Codec>().unwrap(), Codec::WebP);
    assert!("tiff".parse::<Codec>().is_err());
}

#[test]
fn test_compression_ratio() {
    assert_eq!(compression_ratio(0, 10), 1.0);
    assert!((compression_ratio(200, 50) - 0.25).abs() < f64::EPSILON);
}
