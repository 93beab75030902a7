//! Image decoding utilities.
//!
//! Every image reaching the rasterizer is decoded here and re-embedded as a
//! PNG data URI, so the SVG scene never points at anything external.

use std::io::Cursor;

use base64::Engine;

use crate::error::{RenderError, RenderResult};

/// An image decoded and ready to embed in a page scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `data:image/png;base64,...` URI of the re-encoded pixels.
    pub data_uri: String,
    /// Format the source bytes were in, when recognised.
    pub source_format: Option<image::ImageFormat>,
}

/// Decode image bytes and re-encode them as a PNG data URI.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn decode_image(data: &[u8]) -> RenderResult<DecodedImage> {
    let source_format = image::guess_format(data).ok();

    let img = image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(RenderError::Resource("Image has zero size".to_string()));
    }

    let mut png = Cursor::new(Vec::new());
    rgba.write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| RenderError::Encode(format!("PNG re-encoding failed: {e}")))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(png.into_inner());

    Ok(DecodedImage {
        width,
        height,
        data_uri: format!("data:image/png;base64,{encoded}"),
        source_format,
    })
}

/// Extract the payload of a data URI.
///
/// Supports base64 (`data:image/png;base64,iVBOR...`) and percent-encoded
/// payloads.
///
/// # Errors
///
/// Returns an error if the URI is malformed.
pub fn data_uri_bytes(uri: &str) -> RenderResult<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URI".to_string()))?;

    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URI: missing comma".to_string()))?;

    if metadata.contains(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))
    } else {
        percent_decode(payload)
    }
}

fn percent_decode(input: &str) -> RenderResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| RenderError::Resource("Invalid URL encoding".to_string()))?;
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_data_uri_round_trips_to_png() {
        let bytes = data_uri_bytes(&format!("data:image/png;base64,{RED_PIXEL_PNG}"))
            .expect("valid data uri");
        let decoded = decode_image(&bytes).expect("decodes");
        assert_eq!((decoded.width, decoded.height), (1, 1));
        assert_eq!(decoded.source_format, Some(image::ImageFormat::Png));
        assert!(decoded.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_jpeg_is_reencoded_as_png() {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 200, 30]));
        let mut jpeg = Cursor::new(Vec::new());
        img.write_to(&mut jpeg, image::ImageFormat::Jpeg)
            .expect("encode jpeg");

        let decoded = decode_image(&jpeg.into_inner()).expect("decodes");
        assert_eq!(decoded.source_format, Some(image::ImageFormat::Jpeg));
        assert_eq!((decoded.width, decoded.height), (4, 3));
        assert!(decoded.data_uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_invalid_data_uri() {
        assert!(data_uri_bytes("not a data uri").is_err());
        assert!(data_uri_bytes("data:image/png").is_err());
        assert!(data_uri_bytes("data:text/plain,%zz").is_err());
    }

    #[test]
    fn test_percent_encoded_payload() {
        let bytes = data_uri_bytes("data:text/plain,a%20b").expect("decodes");
        assert_eq!(bytes, b"a b");
    }

    #[test]
    fn test_garbage_is_resource_error() {
        assert!(matches!(
            decode_image(b"not an image at all"),
            Err(RenderError::Resource(_))
        ));
    }
}
