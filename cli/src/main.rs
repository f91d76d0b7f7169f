//! officemd CLI - Office document to Markdown conversion tool

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use officemd::optimize::compression_ratio;
use officemd::{
    Codec, Config, ConversionResult, ConvertOptions, Converter, ImageMode, ImageOptimizer,
    SourceFormat,
};

#[derive(Parser)]
#[command(name = "officemd")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert Word, Excel and PowerPoint files to Markdown", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "PATH", env = "OFFICEMD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document and write Markdown plus images
    Convert {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output root directory
        #[arg(short, long, value_name = "DIR", env = "OFFICEMD_CACHE_DIR")]
        output: Option<PathBuf>,

        /// How images are stored and referenced
        #[arg(long, value_enum)]
        image_mode: Option<ImageModeArg>,

        /// Skip image extraction
        #[arg(long)]
        no_images: bool,

        /// Output identifier instead of the content fingerprint
        #[arg(long, value_name = "NAME")]
        name: Option<String>,

        /// Print the result summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a document to Markdown on stdout (images embedded)
    #[command(alias = "md")]
    Markdown {
        /// Input document
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip image extraction
        #[arg(long)]
        no_images: bool,
    },

    /// Optimize a single image
    Optimize {
        /// Input image
        #[arg(value_name = "IMAGE")]
        input: PathBuf,

        /// Output file (defaults next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Force a codec instead of automatic selection
        #[arg(long, value_enum)]
        format: Option<CodecArg>,
    },

    /// List supported document formats
    Formats,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ImageModeArg {
    /// Write image files and link them
    File,
    /// Embed images as data URIs
    Base64,
    /// Write files and attach data URIs
    Both,
}

impl From<ImageModeArg> for ImageMode {
    fn from(mode: ImageModeArg) -> Self {
        match mode {
            ImageModeArg::File => ImageMode::File,
            ImageModeArg::Base64 => ImageMode::Base64,
            ImageModeArg::Both => ImageMode::Both,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CodecArg {
    Png,
    Jpeg,
    Webp,
}

impl From<CodecArg> for Codec {
    fn from(codec: CodecArg) -> Self {
        match codec {
            CodecArg::Png => Codec::Png,
            CodecArg::Jpeg => Codec::Jpeg,
            CodecArg::Webp => Codec::WebP,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Convert {
            input,
            output,
            image_mode,
            no_images,
            name,
            json,
        } => cmd_convert(
            &config,
            &input,
            output,
            image_mode,
            no_images,
            name,
            json,
        ),
        Commands::Markdown {
            input,
            output,
            no_images,
        } => cmd_markdown(&config, &input, output.as_deref(), no_images),
        Commands::Optimize {
            input,
            output,
            format,
        } => cmd_optimize(&config, &input, output.as_deref(), format),
        Commands::Formats => {
            cmd_formats();
            Ok(())
        }
    });

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_config(path: Option<&Path>) -> CliResult<Config> {
    match path {
        Some(path) => {
            log::debug!("Using config file {}", path.display());
            Ok(Config::from_path(path)?)
        }
        None => {
            log::debug!("No config file given, using defaults");
            Ok(Config::default())
        }
    }
}

fn default_output_root() -> PathBuf {
    std::env::temp_dir().join("officemd_cache").join("output")
}

fn cmd_convert(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    image_mode: Option<ImageModeArg>,
    no_images: bool,
    name: Option<String>,
    json: bool,
) -> CliResult<()> {
    let output_root = output
        .or_else(|| config.output_root())
        .unwrap_or_else(default_output_root);
    log::debug!("Output root: {}", output_root.display());

    let mut options = config.convert_options();
    if let Some(mode) = image_mode {
        options = options.with_image_mode(mode.into());
    }
    if no_images {
        options = options.with_images(false);
    }
    if let Some(name) = name {
        options = options.with_output_name(name);
    }

    let optimizer = Arc::new(ImageOptimizer::new(config.optimizer_options()));
    let converter = Converter::new(&output_root, optimizer);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Converting {}...", input.display()));

    let result = converter.convert_file(input, &options);
    pb.finish_and_clear();
    let result = result?;
    log::info!(
        "{} -> {} ({} images, {} warnings)",
        input.display(),
        result.identifier,
        result.images.len(),
        result.warnings.len()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&result))?);
        return Ok(());
    }

    println!("{} {}", "Converted".green().bold(), input.display());
    if let Some(path) = &result.markdown_path {
        println!("  {} {}", "├─".dimmed(), path.display());
    }
    if let Some(dir) = &result.output_dir {
        println!(
            "  {} {} ({} images)",
            "└─".dimmed(),
            dir.join(officemd::convert::IMAGES_DIR).display(),
            result.images.len()
        );
    }
    for warning in &result.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }

    Ok(())
}

fn summary_json(result: &ConversionResult) -> serde_json::Value {
    serde_json::json!({
        "identifier": result.identifier,
        "format": result.format.name(),
        "markdown_path": result.markdown_path,
        "output_dir": result.output_dir,
        "images": result.images,
        "metadata": result.metadata,
        "warnings": result.warnings,
    })
}

fn cmd_markdown(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    no_images: bool,
) -> CliResult<()> {
    SourceFormat::from_path(input)?;
    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("input has no file name")?;
    let bytes = fs::read(input)?;

    let mut options = config.convert_options();
    if no_images {
        options = options.with_images(false);
    }

    let optimizer = Arc::new(ImageOptimizer::new(config.optimizer_options()));
    let converter = Converter::new(PathBuf::new(), optimizer);
    let result = converter.to_markdown(bytes, file_name, &options)?;

    for warning in &result.warnings {
        eprintln!("{} {}", "Warning:".yellow(), warning);
    }

    if let Some(path) = output {
        fs::write(path, &result.markdown)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", result.markdown);
    }

    Ok(())
}

fn cmd_optimize(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    format: Option<CodecArg>,
) -> CliResult<()> {
    let bytes = fs::read(input)?;
    let optimizer = ImageOptimizer::new(config.optimizer_options());
    let optimized = optimizer.optimize_bytes(&bytes, format.map(Codec::from))?;
    log::debug!(
        "{}: {} bytes -> {} bytes as {}",
        input.display(),
        bytes.len(),
        optimized.bytes.len(),
        optimized.mime_type
    );

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            input.with_file_name(format!("{}_optimized{}", stem, optimized.extension))
        }
    };
    fs::write(&output, &optimized.bytes)?;

    let ratio = compression_ratio(bytes.len(), optimized.bytes.len());
    println!(
        "{} {} ({}x{}, {} -> {} bytes, {:.1}%)",
        "Saved to".green(),
        output.display(),
        optimized.width,
        optimized.height,
        bytes.len(),
        optimized.bytes.len(),
        ratio * 100.0
    );

    Ok(())
}

fn cmd_formats() {
    println!("{}", "Supported formats".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for format in SourceFormat::ALL {
        let extensions: Vec<String> = format
            .extensions()
            .iter()
            .map(|e| format!(".{}", e))
            .collect();
        println!("{:<12} {}", format.name().bold(), extensions.join(", "));
    }
}
