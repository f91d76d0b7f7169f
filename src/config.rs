//! JSON configuration.
//!
//! ```json
//! {
//!   "cache_dir": "./cache",
//!   "image_optimization": { "enabled": true, "max_dimension": 1600, "webp_quality": 75 },
//!   "default_settings": { "extract_images": true, "image_format": "both" }
//! }
//! ```
//!
//! Every field is optional. Relative directories resolve against the
//! directory containing the config file.

use crate::convert::ConvertOptions;
use crate::error::{Error, Result};
use crate::optimize::OptimizerOptions;
use crate::render::ImageMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of `cache_dir` used when no `output_dir` is configured.
pub const DEFAULT_OUTPUT_SUBDIR: &str = "output";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root for cached conversions
    pub cache_dir: Option<PathBuf>,

    /// Explicit output root, taking precedence over `cache_dir`
    pub output_dir: Option<PathBuf>,

    /// Image optimizer settings
    pub image_optimization: ImageOptimizationConfig,

    /// Per-conversion defaults
    pub default_settings: DefaultSettings,
}

/// `image_optimization` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageOptimizationConfig {
    pub enabled: bool,
    pub max_width: u32,
    pub max_height: u32,
    /// Bounds both dimensions when set
    pub max_dimension: Option<u32>,
    pub jpeg_quality: u8,
    pub webp_quality: u8,
    pub prefer_webp: bool,
}

impl Default for ImageOptimizationConfig {
    fn default() -> Self {
        let opts = OptimizerOptions::default();
        Self {
            enabled: opts.enabled,
            max_width: opts.max_width,
            max_height: opts.max_height,
            max_dimension: None,
            jpeg_quality: opts.jpeg_quality,
            webp_quality: opts.webp_quality,
            prefer_webp: opts.prefer_webp,
        }
    }
}

/// `default_settings` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    pub extract_images: bool,
    pub image_format: ImageMode,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            extract_images: true,
            image_format: ImageMode::File,
        }
    }
}

impl Config {
    /// Load a config file. Relative directories are resolved against the
    /// file's parent directory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_json_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.cache_dir = config.cache_dir.map(|p| resolve(base, p));
        config.output_dir = config.output_dir.map(|p| resolve(base, p));
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse config JSON. Directories are kept as written.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Output root: `output_dir`, else `<cache_dir>/output`.
    pub fn output_root(&self) -> Option<PathBuf> {
        self.output_dir.clone().or_else(|| {
            self.cache_dir
                .as_ref()
                .map(|dir| dir.join(DEFAULT_OUTPUT_SUBDIR))
        })
    }

    /// Optimizer options described by the `image_optimization` section.
    pub fn optimizer_options(&self) -> OptimizerOptions {
        let section = &self.image_optimization;
        let (width, height) = match section.max_dimension {
            Some(max) => (max, max),
            None => (section.max_width, section.max_height),
        };
        OptimizerOptions::new()
            .with_enabled(section.enabled)
            .with_max_size(width, height)
            .with_jpeg_quality(section.jpeg_quality)
            .with_webp_quality(section.webp_quality)
            .with_prefer_webp(section.prefer_webp)
    }

    /// Conversion options described by the `default_settings` section.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions::new()
            .with_images(self.default_settings.extract_images)
            .with_image_mode(self.default_settings.image_format)
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert!(config.cache_dir.is_none());
        assert!(config.output_root().is_none());

        let opts = config.optimizer_options();
        assert_eq!((opts.max_width, opts.max_height), (1920, 1080));
        assert!(opts.prefer_webp);

        let convert = config.convert_options();
        assert!(convert.extract_images);
        assert_eq!(convert.image_mode, ImageMode::File);
    }

    #[test]
    fn test_sections() {
        let config = Config::from_json_str(
            r#"{
                "cache_dir": "/tmp/cache",
                "image_optimization": {"max_dimension": 800, "prefer_webp": false, "jpeg_quality": 70},
                "default_settings": {"image_format": "base64", "extract_images": false}
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.output_root().unwrap(),
            PathBuf::from("/tmp/cache").join("output")
        );
        let opts = config.optimizer_options();
        assert_eq!((opts.max_width, opts.max_height), (800, 800));
        assert_eq!(opts.jpeg_quality, 70);
        assert!(!opts.prefer_webp);

        let convert = config.convert_options();
        assert!(!convert.extract_images);
        assert_eq!(convert.image_mode, ImageMode::Base64);
    }

    #[test]
    fn test_invalid_image_format() {
        let err = Config::from_json_str(r#"{"default_settings": {"image_format": "inline"}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_relative_dirs_resolve_against_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"cache_dir": "cache", "output_dir": "/abs/out"}"#).unwrap();

        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.cache_dir.unwrap(), dir.path().join("cache"));
        assert_eq!(config.output_dir.as_deref(), Some(Path::new("/abs/out")));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_path("/nonexistent/officemd.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
