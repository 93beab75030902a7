//! Image assets handed to the editor by the host: raw bytes or a URL.

use base64::Engine;

use crate::{CoreError, CoreResult, DesignObject};

/// An image ready to be placed, with its intrinsic size.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    /// Source reference stored on the object (URL or data URI).
    pub src: String,
    /// Intrinsic width in pixels.
    pub width: f64,
    /// Intrinsic height in pixels.
    pub height: f64,
}

impl ImageAsset {
    /// Decode the header of `bytes` for its size and embed the bytes as a
    /// base64 data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is not recognised or the dimensions
    /// cannot be read.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| CoreError::ImageDecode(format!("unknown image format: {e}")))?;
        let reader = image::ImageReader::with_format(std::io::Cursor::new(bytes), format);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CoreError::ImageDecode(e.to_string()))?;
        if width == 0 || height == 0 {
            return Err(CoreError::ImageDecode("image has zero size".to_string()));
        }

        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            src: format!("data:{};base64,{encoded}", format.to_mime_type()),
            width: f64::from(width),
            height: f64::from(height),
        })
    }

    /// Wrap an external reference whose size is already known.
    #[must_use]
    pub fn from_url(url: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            src: url.into(),
            width,
            height,
        }
    }

    /// Image object at the default insert position, sized to this asset.
    #[must_use]
    pub fn to_object(&self) -> DesignObject {
        DesignObject::image(self.src.clone(), self.width, self.height)
    }
}
