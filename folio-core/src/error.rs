//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur at the document load and asset boundaries.
///
/// Editing operations never return these; a rejected edit is a no-op.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Page not found in document.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Object not found on the page.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// A loaded document violates a structural invariant.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Canvas dimensions must both be positive and finite.
    #[error("Invalid canvas size: {width}x{height}")]
    InvalidCanvasSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
