//! # Folio Renderer
//!
//! Off-screen export of Folio documents to page rasters and PDF.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │          DocumentExporter (per page)        │
//! ├──────────────┬──────────────┬───────────────┤
//! │ ImageLoader  │ SVG scene    │ resvg /       │
//! │ + readiness  │ (objects in  │ tiny-skia     │
//! │   barrier    │  z-order)    │ (supersample) │
//! ├──────────────┴──────────────┴───────────────┤
//! │   ExportArtifact: PNG per page ─► PDF       │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;
pub mod loader;
pub mod scene;

pub use error::{RenderError, RenderResult};
pub use export::{
    DocumentExporter, ExportArtifact, ExportConfig, PageRaster, PageSizeMm, MIN_SUPERSAMPLE,
};
pub use loader::{DefaultImageLoader, ImageLoader, ReadinessBarrier, ResolvedImages};
pub use scene::ImageFit;

/// Folio renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
