//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Building the page scene failed.
    #[error("SVG scene error: {0}")]
    Svg(String),

    /// Rasterizing a page failed.
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Encoding a raster failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Assembling the PDF failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// Export configuration is unusable.
    #[error("Invalid export configuration: {0}")]
    InvalidConfig(String),

    /// A background rasterization task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
