//! Document export to page rasters and a multi-page PDF.
//!
//! Each page is reconstructed as an SVG scene, its images are awaited
//! through a readiness barrier, and the scene is rasterized with
//! resvg/tiny-skia at a supersampled resolution. Pages are processed one at
//! a time in document order. The resulting [`ExportArtifact`] holds one PNG
//! per page and assembles the PDF, one PDF page per document page at that
//! page's own size.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{CanvasSize, Document, Orientation, Page, PageId};
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::loader::{resolve_images, DefaultImageLoader, ImageLoader};
use crate::scene::{page_svg, ImageFit, SceneOptions};

/// Lowest supersampling factor used for output.
pub const MIN_SUPERSAMPLE: f64 = 2.0;

/// Millimetres per inch.
const MM_PER_INCH: f64 = 25.4;

/// Configuration for document export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output pixels per canvas pixel. Values below [`MIN_SUPERSAMPLE`] are
    /// raised to it.
    pub supersample: f64,
    /// Canvas pixels per inch, used to size PDF pages.
    pub dpi: f64,
    /// Page background as RGBA bytes.
    pub background: [u8; 4],
    /// Per-image load limit. `None` waits indefinitely.
    pub image_timeout: Option<Duration>,
    /// How image objects fill their box.
    pub image_fit: ImageFit,
    /// Load installed system fonts for text rendering.
    pub load_system_fonts: bool,
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            supersample: MIN_SUPERSAMPLE,
            dpi: 96.0,
            background: [255, 255, 255, 255],
            image_timeout: Some(Duration::from_secs(30)),
            image_fit: ImageFit::Cover,
            load_system_fonts: true,
            title: "Design Export".to_string(),
        }
    }
}

impl ExportConfig {
    /// Supersampling factor actually applied.
    #[must_use]
    pub fn effective_supersample(&self) -> f64 {
        self.supersample.max(MIN_SUPERSAMPLE)
    }

    /// Check that the configuration can produce output.
    ///
    /// # Errors
    ///
    /// Returns an error if the supersample factor or DPI is not a positive
    /// finite number.
    pub fn validate(&self) -> RenderResult<()> {
        if !self.supersample.is_finite() {
            return Err(RenderError::InvalidConfig(format!(
                "supersample must be finite, got {}",
                self.supersample
            )));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(RenderError::InvalidConfig(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        Ok(())
    }
}

/// Physical page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSizeMm {
    /// Width in millimetres.
    pub width: f64,
    /// Height in millimetres.
    pub height: f64,
}

/// One rasterized page.
#[derive(Debug, Clone)]
pub struct PageRaster {
    /// Source page.
    pub page_id: PageId,
    /// Source page name.
    pub page_name: String,
    /// Canvas size of the source page.
    pub canvas_size: CanvasSize,
    /// Supersampling factor the raster was produced at.
    pub supersample: f64,
    /// Raster width in pixels.
    pub width_px: u32,
    /// Raster height in pixels.
    pub height_px: u32,
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
}

impl PageRaster {
    /// Orientation of the source page.
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.canvas_size.orientation()
    }

    /// Physical size at `dpi` canvas pixels per inch.
    #[must_use]
    pub fn size_mm(&self, dpi: f64) -> PageSizeMm {
        PageSizeMm {
            width: self.canvas_size.width / dpi * MM_PER_INCH,
            height: self.canvas_size.height / dpi * MM_PER_INCH,
        }
    }
}

/// Finished export: one raster per page, in document order.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pages: Vec<PageRaster>,
    dpi: f64,
    title: String,
}

impl ExportArtifact {
    /// Page rasters in document order.
    #[must_use]
    pub fn pages(&self) -> &[PageRaster] {
        &self.pages
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// An export always has at least one page.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Consume the artifact, returning its rasters.
    #[must_use]
    pub fn into_pages(self) -> Vec<PageRaster> {
        self.pages
    }

    /// PDF page sizes, in page order.
    #[must_use]
    pub fn page_sizes_mm(&self) -> Vec<PageSizeMm> {
        self.pages.iter().map(|p| p.size_mm(self.dpi)).collect()
    }

    /// Assemble a PDF with one page per raster.
    ///
    /// The first raster defines the initial page; each later raster is
    /// appended at its own size and orientation.
    ///
    /// # Errors
    ///
    /// Returns an error if a raster cannot be decoded or the PDF cannot be
    /// written.
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_pdf(&self) -> RenderResult<Vec<u8>> {
        let mut rasters = self.pages.iter();
        let first = rasters
            .next()
            .ok_or_else(|| RenderError::Pdf("no pages to export".to_string()))?;

        let size = first.size_mm(self.dpi);
        let (doc, page1, layer1) = printpdf::PdfDocument::new(
            self.title.as_str(),
            printpdf::Mm(size.width as f32),
            printpdf::Mm(size.height as f32),
            "Layer 1",
        );
        add_raster(doc.get_page(page1).get_layer(layer1), first, self.dpi)?;

        for raster in rasters {
            let size = raster.size_mm(self.dpi);
            let (page, layer) = doc.add_page(
                printpdf::Mm(size.width as f32),
                printpdf::Mm(size.height as f32),
                "Layer 1",
            );
            add_raster(doc.get_page(page).get_layer(layer), raster, self.dpi)?;
        }

        doc.save_to_bytes()
            .map_err(|e| RenderError::Pdf(format!("PDF save failed: {e}")))
    }
}

/// Place a raster so it exactly covers its PDF page.
#[allow(clippy::cast_possible_truncation)]
fn add_raster(
    layer: printpdf::PdfLayerReference,
    raster: &PageRaster,
    dpi: f64,
) -> RenderResult<()> {
    // Decode with printpdf's bundled image crate for compatibility
    let decoded = printpdf::image_crate::load_from_memory(&raster.png)
        .map_err(|e| RenderError::Pdf(format!("Failed to decode page raster: {e}")))?;
    let opaque = printpdf::image_crate::DynamicImage::ImageRgb8(decoded.to_rgb8());
    let image = printpdf::Image::from_dynamic_image(&opaque);

    // At dpi * supersample the raster's natural size is the page size.
    let transform = printpdf::ImageTransform {
        translate_x: Some(printpdf::Mm(0.0)),
        translate_y: Some(printpdf::Mm(0.0)),
        dpi: Some((dpi * raster.supersample) as f32),
        ..Default::default()
    };
    image.add_to_layer(layer, transform);
    Ok(())
}

/// Exports a [`Document`] page by page.
pub struct DocumentExporter {
    config: ExportConfig,
    loader: Arc<dyn ImageLoader>,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for DocumentExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExporter")
            .field("config", &self.config)
            .field("fonts", &self.fontdb.len())
            .finish_non_exhaustive()
    }
}

impl DocumentExporter {
    /// Create an exporter that loads images with [`DefaultImageLoader`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: ExportConfig) -> RenderResult<Self> {
        Self::with_loader(config, DefaultImageLoader::new())
    }

    /// Create an exporter with a custom image loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_loader(config: ExportConfig, loader: impl ImageLoader + 'static) -> RenderResult<Self> {
        config.validate()?;
        let mut fontdb = usvg::fontdb::Database::new();
        if config.load_system_fonts {
            fontdb.load_system_fonts();
        }
        tracing::debug!(fonts = fontdb.len(), "font database ready");
        Ok(Self {
            config,
            loader: Arc::new(loader),
            fontdb: Arc::new(fontdb),
        })
    }

    /// Export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Rasterize every page in document order.
    ///
    /// Image load failures are tolerated and render blank. Any other
    /// failure aborts the export and nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to rasterize or encode.
    pub async fn export(&self, document: &Document) -> RenderResult<ExportArtifact> {
        tracing::info!(pages = document.page_count(), "export started");
        let mut pages = Vec::with_capacity(document.page_count());
        for (index, page) in document.pages().iter().enumerate() {
            let raster = self.render_page(page).await.inspect_err(|e| {
                tracing::warn!(page = index + 1, error = %e, "export aborted");
            })?;
            pages.push(raster);
        }
        tracing::info!(pages = pages.len(), "export finished");
        Ok(ExportArtifact {
            pages,
            dpi: self.config.dpi,
            title: self.config.title.clone(),
        })
    }

    /// Export straight to PDF bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the export or PDF assembly fails.
    pub async fn export_pdf(&self, document: &Document) -> RenderResult<Vec<u8>> {
        self.export(document).await?.to_pdf()
    }

    /// Wait for a page's images, then rasterize it.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be rasterized or encoded.
    pub async fn render_page(&self, page: &Page) -> RenderResult<PageRaster> {
        let sources: Vec<&str> = page.objects.iter().flat_map(|o| o.image_refs()).collect();
        let images = resolve_images(
            self.loader.as_ref(),
            sources.iter().copied(),
            self.config.image_timeout,
        )
        .await;
        tracing::debug!(
            page = %page.id,
            objects = page.objects.len(),
            images_loaded = images.loaded(),
            images_failed = images.failed(),
            "page images settled"
        );

        let supersample = self.config.effective_supersample();
        let (width_px, height_px) = raster_size(page.canvas_size, supersample)?;
        let svg = page_svg(
            page,
            &images,
            &SceneOptions {
                scale: supersample,
                background: self.config.background,
                image_fit: self.config.image_fit,
            },
        );

        let fontdb = Arc::clone(&self.fontdb);
        let png = tokio::task::spawn_blocking(move || rasterize(&svg, fontdb, width_px, height_px))
            .await??;

        tracing::debug!(page = %page.id, width_px, height_px, bytes = png.len(), "page rasterized");
        Ok(PageRaster {
            page_id: page.id.clone(),
            page_name: page.name.clone(),
            canvas_size: page.canvas_size,
            supersample,
            width_px,
            height_px,
            png,
        })
    }
}

/// Output pixel dimensions for a canvas at `scale`.
///
/// # Errors
///
/// Returns an error if the result does not fit a raster.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn raster_size(canvas: CanvasSize, scale: f64) -> RenderResult<(u32, u32)> {
    let width = (canvas.width * scale).round();
    let height = (canvas.height * scale).round();
    if !(width.is_finite() && height.is_finite()) || width > f64::from(u32::MAX) || height > f64::from(u32::MAX) {
        return Err(RenderError::Raster(format!(
            "raster size {width}x{height} out of range"
        )));
    }
    Ok(((width as u32).max(1), (height as u32).max(1)))
}

/// Rasterize an SVG string to PNG bytes.
fn rasterize(
    svg: &str,
    fontdb: Arc<usvg::fontdb::Database>,
    width: u32,
    height: u32,
) -> RenderResult<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.fontdb = fontdb;
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| RenderError::Svg(format!("SVG parsing failed: {e}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Raster(format!("cannot allocate {width}x{height} pixmap")))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(format!("PNG encoding failed: {e}")))
}
