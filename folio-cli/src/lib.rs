//! # Folio CLI
//!
//! Command-line front end for Folio design documents.
//!
//! ## Commands
//!
//! - `folio new <doc.json>` - write an empty single-page document
//! - `folio info <doc.json>` - summarize pages and objects
//! - `folio export <doc.json> --out <path>` - export to PDF or per-page PNG
//!
//! Export settings can also come from `FOLIO_SCALE`, `FOLIO_DPI` and
//! `FOLIO_IMAGE_TIMEOUT_SECS`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_core::{CanvasSize, Document};
use folio_renderer::{DocumentExporter, ExportConfig, ImageFit};

/// Command-line arguments for `folio`.
#[derive(Debug, Clone, Parser)]
#[command(name = "folio")]
#[command(about = "Inspect and export Folio design documents")]
#[command(version)]
pub struct CliArgs {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Write an empty single-page document
    New(NewArgs),
    /// Print a summary of a document
    Info {
        /// Document JSON file
        document: PathBuf,
    },
    /// Export a document to PDF or PNG
    Export(ExportArgs),
}

/// Arguments for `folio new`.
#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Output document JSON file
    pub output: PathBuf,

    /// Canvas preset (e.g. "A4 Portrait", "Story")
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub preset: Option<String>,

    /// Canvas width in pixels
    #[arg(long, requires = "height")]
    pub width: Option<f64>,

    /// Canvas height in pixels
    #[arg(long, requires = "width")]
    pub height: Option<f64>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Output container for `folio export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One multi-page PDF
    Pdf,
    /// One PNG per page
    Png,
}

/// Image fit for image objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitArg {
    /// Fill the box, cropping overflow
    Cover,
    /// Fit inside the box
    Contain,
    /// Stretch to the box
    Fill,
}

impl From<FitArg> for ImageFit {
    fn from(fit: FitArg) -> Self {
        match fit {
            FitArg::Cover => ImageFit::Cover,
            FitArg::Contain => ImageFit::Contain,
            FitArg::Fill => ImageFit::Fill,
        }
    }
}

/// Arguments for `folio export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Document JSON file
    pub document: PathBuf,

    /// Output path. For PNG, pages are written as `<stem>-<n>.png` next to it.
    #[arg(long, short)]
    pub out: PathBuf,

    /// Output format (inferred from the `--out` extension when omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Supersampling factor (values below 2 are raised to 2)
    #[arg(long, env = "FOLIO_SCALE", default_value_t = 2.0)]
    pub scale: f64,

    /// PDF resolution in dots per inch
    #[arg(long, env = "FOLIO_DPI", default_value_t = 96.0)]
    pub dpi: f64,

    /// Per-image load timeout in seconds (0 waits forever)
    #[arg(long, env = "FOLIO_IMAGE_TIMEOUT_SECS", default_value_t = 30)]
    pub image_timeout_secs: u64,

    /// How image objects fill their box
    #[arg(long, value_enum, default_value_t = FitArg::Cover)]
    pub fit: FitArg,

    /// PDF document title
    #[arg(long)]
    pub title: Option<String>,

    /// Skip loading system fonts (text renders only with embedded fonts)
    #[arg(long)]
    pub no_system_fonts: bool,
}

impl ExportArgs {
    /// Format to write, falling back to the output extension.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| {
            let is_png = self
                .out
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if is_png {
                OutputFormat::Png
            } else {
                OutputFormat::Pdf
            }
        })
    }

    /// Exporter configuration for these arguments.
    #[must_use]
    pub fn export_config(&self) -> ExportConfig {
        let defaults = ExportConfig::default();
        ExportConfig {
            supersample: self.scale,
            dpi: self.dpi,
            image_timeout: (self.image_timeout_secs > 0)
                .then(|| Duration::from_secs(self.image_timeout_secs)),
            image_fit: self.fit.into(),
            load_system_fonts: !self.no_system_fonts,
            title: self.title.clone().unwrap_or(defaults.title),
            ..defaults
        }
    }
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns an error if the document cannot be read or written, or the export
/// fails. A failed export writes no output files.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::New(new) => {
            new_document(&new)?;
            println!("{}", new.output.display());
        }
        Command::Info { document } => {
            let document = load_document(&document)?;
            print!("{}", describe(&document));
        }
        Command::Export(export_args) => {
            for path in export(&export_args).await? {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

/// Read and validate a document from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = Document::from_json(&json)
        .with_context(|| format!("{} is not a valid document", path.display()))?;
    tracing::debug!(path = %path.display(), pages = document.page_count(), "document loaded");
    Ok(document)
}

/// Write an empty document.
///
/// # Errors
///
/// Returns an error for an unknown preset, an invalid size, an existing
/// output without `--force`, or a failed write.
pub fn new_document(args: &NewArgs) -> anyhow::Result<Document> {
    let canvas = match (&args.preset, args.width, args.height) {
        (Some(name), _, _) => match CanvasSize::preset(name) {
            Some(size) => size,
            None => {
                let known: Vec<&str> = CanvasSize::PRESETS.iter().map(|(n, _)| *n).collect();
                bail!("unknown preset {name:?} (known: {})", known.join(", "));
            }
        },
        (None, Some(width), Some(height)) => CanvasSize::new(width, height)?,
        _ => CanvasSize::default(),
    };
    if args.output.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", args.output.display());
    }

    let document = Document::new(canvas);
    std::fs::write(&args.output, document.to_json_pretty()?)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(document)
}

/// Human-readable summary of a document.
#[must_use]
pub fn describe(document: &Document) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Pages: {}", document.page_count());
    for (index, page) in document.pages().iter().enumerate() {
        let active = if page.id == *document.active_page_id() {
            " (active)"
        } else {
            ""
        };
        let orientation = match page.canvas_size.orientation() {
            folio_core::Orientation::Portrait => "portrait",
            folio_core::Orientation::Landscape => "landscape",
        };
        let _ = writeln!(
            out,
            "  {}. {}{active}: {}x{} {orientation}, {} objects, {} image refs",
            index + 1,
            page.name,
            page.canvas_size.width,
            page.canvas_size.height,
            page.objects.len(),
            page.image_ref_count(),
        );
    }
    out
}

/// Export a document and write the result. Returns the files written.
///
/// Every page is rendered before anything touches the filesystem.
///
/// # Errors
///
/// Returns an error if loading, exporting, or writing fails. Files written
/// before a write failure are removed.
pub async fn export(args: &ExportArgs) -> anyhow::Result<Vec<PathBuf>> {
    let document = load_document(&args.document)?;
    let exporter = DocumentExporter::new(args.export_config())?;

    let outputs: Vec<(PathBuf, Vec<u8>)> = match args.output_format() {
        OutputFormat::Pdf => {
            let pdf = exporter.export_pdf(&document).await.context("export failed")?;
            vec![(args.out.clone(), pdf)]
        }
        OutputFormat::Png => {
            let artifact = exporter.export(&document).await.context("export failed")?;
            artifact
                .into_pages()
                .into_iter()
                .enumerate()
                .map(|(index, page)| (png_path(&args.out, index + 1), page.png))
                .collect()
        }
    };

    let mut written = Vec::with_capacity(outputs.len());
    for (path, bytes) in outputs {
        if let Err(e) = std::fs::write(&path, bytes) {
            for done in &written {
                let _ = std::fs::remove_file(done);
            }
            return Err(e).with_context(|| format!("failed to write {}", path.display()));
        }
        written.push(path);
    }
    tracing::info!(files = written.len(), "export written");
    Ok(written)
}

/// Path of the `page`-th PNG (1-based) for an `--out` path.
#[must_use]
pub fn png_path(out: &Path, page: usize) -> PathBuf {
    let stem = out
        .file_stem()
        .map_or_else(|| "page".to_string(), |s| s.to_string_lossy().into_owned());
    out.with_file_name(format!("{stem}-{page}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{DesignObject, ShapeKind};

    fn export_args(extra: &[&str]) -> ExportArgs {
        let mut argv = vec!["folio", "export", "doc.json", "--out", "out/design.pdf"];
        argv.extend_from_slice(extra);
        match CliArgs::try_parse_from(argv).expect("parse").command {
            Command::Export(args) => args,
            other => panic!("expected export, got {other:?}"),
        }
    }

    #[test]
    fn test_export_defaults() {
        let args = export_args(&[]);
        assert_eq!(args.output_format(), OutputFormat::Pdf);

        let config = args.export_config();
        assert!((config.supersample - 2.0).abs() < f64::EPSILON);
        assert!((config.dpi - 96.0).abs() < f64::EPSILON);
        assert_eq!(config.image_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.image_fit, ImageFit::Cover);
        assert!(config.load_system_fonts);
        assert_eq!(config.title, "Design Export");
    }

    #[test]
    fn test_export_flags() {
        let args = export_args(&[
            "--format",
            "png",
            "--scale",
            "3",
            "--dpi",
            "300",
            "--image-timeout-secs",
            "0",
            "--fit",
            "contain",
            "--title",
            "Brochure",
            "--no-system-fonts",
        ]);
        assert_eq!(args.output_format(), OutputFormat::Png);

        let config = args.export_config();
        assert!((config.supersample - 3.0).abs() < f64::EPSILON);
        assert!((config.dpi - 300.0).abs() < f64::EPSILON);
        assert_eq!(config.image_timeout, None);
        assert_eq!(config.image_fit, ImageFit::Contain);
        assert!(!config.load_system_fonts);
        assert_eq!(config.title, "Brochure");
    }

    #[test]
    fn test_format_inferred_from_extension() {
        let mut args = export_args(&[]);
        args.out = PathBuf::from("pages.PNG");
        assert_eq!(args.output_format(), OutputFormat::Png);
        args.format = Some(OutputFormat::Pdf);
        assert_eq!(args.output_format(), OutputFormat::Pdf);
    }

    #[test]
    fn test_new_rejects_preset_with_size() {
        let result = CliArgs::try_parse_from([
            "folio", "new", "doc.json", "--preset", "Story", "--width", "10", "--height", "10",
        ]);
        assert!(result.is_err());
        assert!(CliArgs::try_parse_from(["folio", "new", "doc.json", "--width", "10"]).is_err());
    }

    #[test]
    fn test_png_path() {
        assert_eq!(
            png_path(Path::new("out/design.png"), 2),
            PathBuf::from("out/design-2.png")
        );
        assert_eq!(png_path(Path::new("cover"), 1), PathBuf::from("cover-1.png"));
    }

    #[test]
    fn test_describe() {
        let mut document = Document::new(CanvasSize::new(794.0, 1123.0).expect("size"));
        document.add_object(DesignObject::shape(ShapeKind::Circle));
        document.add_object(DesignObject::image("data:image/png;base64,AA==", 10.0, 10.0));
        document.add_page(CanvasSize::new(1123.0, 794.0).expect("size"));

        let summary = describe(&document);
        assert!(summary.starts_with("Pages: 2\n"));
        assert!(summary.contains("1. Page 1: 794x1123 portrait, 2 objects, 1 image refs"));
        assert!(summary.contains("2. Page 2 (active): 1123x794 landscape, 0 objects, 0 image refs"));
    }
}
