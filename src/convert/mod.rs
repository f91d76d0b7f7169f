//! Conversion orchestrator.
//!
//! A [`Converter`] wires one conversion request through the pipeline:
//! format detection, fingerprinting, the format adapter, the image optimizer,
//! the Markdown renderer, and finally the output sink.
//!
//! # Example
//!
//! ```no_run
//! use officemd::convert::{ConvertOptions, Converter};
//! use officemd::optimize::{ImageOptimizer, OptimizerOptions};
//! use std::sync::Arc;
//!
//! fn main() -> officemd::Result<()> {
//!     let optimizer = Arc::new(ImageOptimizer::new(OptimizerOptions::default()));
//!     let converter = Converter::new("./cache", optimizer);
//!
//!     let result = converter.convert_file("report.docx", &ConvertOptions::default())?;
//!     println!("{}", result.markdown);
//!     Ok(())
//! }
//! ```

mod sink;

pub use sink::{FsSink, MemorySink, OutputSink};

use crate::adapter::{self, AdapterContext};
use crate::container::HtmlFallback;
use crate::detect::SourceFormat;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::model::{Block, ImageAsset, Metadata, OptimizedImage};
use crate::optimize::ImageOptimizer;
use crate::render::{ImageMode, MarkdownRenderer, RenderOptions};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Directory under the output directory that holds extracted images.
pub const IMAGES_DIR: &str = "images";

/// Options for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Emit image blocks and route embedded images through the optimizer
    pub extract_images: bool,

    /// How images are stored and referenced
    pub image_mode: ImageMode,

    /// Output identifier to use instead of the fingerprint-derived one
    pub output_name: Option<String>,

    /// Rendering options (`image_mode` is taken from this struct's field)
    pub render: RenderOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            image_mode: ImageMode::File,
            output_name: None,
            render: RenderOptions::default(),
        }
    }
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable image extraction.
    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    /// Set the image mode.
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self.render.image_mode = mode;
        self
    }

    /// Override the output identifier.
    pub fn with_output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    fn effective_render(&self) -> RenderOptions {
        self.render.clone().with_image_mode(self.image_mode)
    }
}

/// Result of a conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Rendered Markdown
    pub markdown: String,

    /// Paths of image files written, in document order (empty for base64)
    pub images: Vec<PathBuf>,

    /// Conversion and document metadata
    pub metadata: Metadata,

    /// Non-fatal problems, in the order they occurred
    pub warnings: Vec<String>,

    /// Output identifier (`stem_xxxxxxxx` or the caller's override)
    pub identifier: String,

    /// Source format
    pub format: SourceFormat,

    /// Directory holding the Markdown and images, when written
    pub output_dir: Option<PathBuf>,

    /// Path of the written Markdown file
    pub markdown_path: Option<PathBuf>,
}

impl ConversionResult {
    /// Whether the conversion produced any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Conversion orchestrator.
///
/// Holds only shared, immutable collaborators; one converter can serve
/// concurrent conversions.
pub struct Converter {
    output_root: PathBuf,
    optimizer: Arc<ImageOptimizer>,
    sink: Arc<dyn OutputSink>,
    fallback: Option<Arc<dyn HtmlFallback>>,
}

impl Converter {
    /// Create a converter writing under `output_root` through [`FsSink`].
    pub fn new(output_root: impl Into<PathBuf>, optimizer: Arc<ImageOptimizer>) -> Self {
        Self {
            output_root: output_root.into(),
            optimizer,
            sink: Arc::new(FsSink),
            fallback: None,
        }
    }

    /// Replace the output sink.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Attach a converter for legacy `.doc` files.
    pub fn with_fallback(mut self, fallback: Arc<dyn HtmlFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Root under which per-document output directories are created.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// The shared image optimizer.
    pub fn optimizer(&self) -> &ImageOptimizer {
        &self.optimizer
    }

    /// Convert a file and write the result to
    /// `<output_root>/<identifier>/<identifier>.md`.
    pub fn convert_file<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ConvertOptions,
    ) -> Result<ConversionResult> {
        let path = path.as_ref();
        // Reject unknown extensions before touching the file.
        SourceFormat::from_path(path)?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        let bytes = fs::read(path)?;

        let mut result = self.run(bytes, file_name, options, true)?;
        result
            .metadata
            .insert("source".to_string(), path.display().to_string());
        Ok(result)
    }

    /// Convert in-memory bytes and write the result. `file_name` selects the
    /// format and the identifier stem.
    pub fn convert_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionResult> {
        self.run(bytes, file_name, options, true)
    }

    /// Convert without writing anything. Images are embedded as data URIs.
    pub fn to_markdown(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        options: &ConvertOptions,
    ) -> Result<ConversionResult> {
        let options = options.clone().with_image_mode(ImageMode::Base64);
        self.run(bytes, file_name, &options, false)
    }

    fn run(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        options: &ConvertOptions,
        persist: bool,
    ) -> Result<ConversionResult> {
        let format = SourceFormat::from_path(file_name)?;
        let identifier = match &options.output_name {
            Some(name) => validate_name(name)?,
            None => Fingerprint::of_bytes(&bytes).identifier(&file_stem(file_name)),
        };
        log::debug!("{}: converting as {} ({})", file_name, format, identifier);

        let ctx = AdapterContext::new(file_name)
            .with_images(options.extract_images)
            .with_fallback(self.fallback.as_deref());
        let extraction = adapter::extract(format, bytes, &ctx)?;

        let output_dir = self.output_root.join(&identifier);
        let images_dir = output_dir.join(IMAGES_DIR);
        let mut warnings = extraction.warnings;
        let mut blocks = extraction.blocks;
        let write_files = persist && options.image_mode.writes_files();

        if persist {
            self.sink.create_dir_all(&output_dir)?;
        }
        if write_files && blocks.iter().any(Block::is_image) {
            self.sink.create_dir_all(&images_dir)?;
        }

        let mut assets: HashMap<String, ImageAsset> = extraction
            .assets
            .into_iter()
            .map(|asset| (asset.name.clone(), asset))
            .collect();
        let mut images = Vec::new();

        for block in blocks.iter_mut() {
            let Block::Image(image) = block else {
                continue;
            };
            let name = image.placement_hint.clone();
            let optimized = match assets.remove(&name) {
                Some(asset) => self.optimizer.optimize_asset(asset, None),
                None => Err(Error::ImageDecode(format!("no image data for {}", name))),
            };
            let optimized = match optimized {
                Ok(optimized) => optimized,
                Err(e) if e.is_local() => {
                    let reason = detail(&e);
                    log::warn!("{}: {}: {}", file_name, name, reason);
                    warnings.push(format!("{}: {}", name, reason));
                    *block = Block::image_failure(reason);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if write_files {
                let image_file = optimized.file_name(&name);
                let path = images_dir.join(&image_file);
                self.sink.write(&path, &optimized.bytes)?;
                image.relative_path = Some(format!("{}/{}", IMAGES_DIR, image_file));
                images.push(path);
            }
            if options.image_mode.embeds_data() {
                image.data_uri = Some(data_uri(&optimized));
            }
        }

        let markdown = MarkdownRenderer::new(options.effective_render()).render(&blocks)?;

        let mut metadata = extraction.metadata;
        metadata.insert("source".to_string(), file_name.to_string());
        metadata.insert("file_type".to_string(), format.name().to_string());
        metadata.insert("identifier".to_string(), identifier.clone());
        metadata.insert("converted_at".to_string(), chrono::Utc::now().to_rfc3339());

        let markdown_path = if persist {
            let path = output_dir.join(format!("{}.md", identifier));
            self.sink.write(&path, markdown.as_bytes())?;
            Some(path)
        } else {
            None
        };

        log::info!(
            "{}: {} chars of Markdown, {} images, {} warnings",
            file_name,
            markdown.chars().count(),
            images.len(),
            warnings.len()
        );

        Ok(ConversionResult {
            markdown,
            images,
            metadata,
            warnings,
            identifier,
            format,
            output_dir: persist.then_some(output_dir),
            markdown_path,
        })
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("output_root", &self.output_root)
            .field("optimizer", &self.optimizer)
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// `data:<mime>;base64,<payload>`
fn data_uri(image: &OptimizedImage) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type,
        STANDARD.encode(&image.bytes)
    )
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

/// Output names become a single path component.
fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::Config(format!("invalid output name '{}'", name)));
    }
    Ok(name.to_string())
}

/// Message of a local error without the variant prefix.
fn detail(err: &Error) -> String {
    match err {
        Error::ImageDecode(msg) | Error::ShapeExtraction(msg) => msg.clone(),
        other => other.to_string(),
    }
}
