//! Image handling for Vegapunk
//!
//! This module turns uploaded raster images into the transport form the
//! multimodal API expects: base64 data tagged with a MIME type derived from
//! the image's native format. Recognized formats keep their original bytes
//! (a lossless round trip); anything the sniffer cannot place is transcoded
//! to PNG.

use crate::error::{Result, VegapunkError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// Format used when the native format of an image cannot be determined
pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Png;

/// Upload extensions accepted by the file control
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// An image in transport form: base64 data plus its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME type derived from the native format (e.g. `image/png`)
    pub mime_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

/// MIME type for a detected image format, for the formats this app accepts
///
/// Returns None for formats outside the supported set; callers treat those
/// the same as an unrecognized container.
fn mime_type_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

/// Encode raw image bytes into transport form
///
/// The native format is sniffed from the bytes. Recognized formats are
/// validated by a full decode and then carried verbatim, so decoding the
/// base64 yields the original file. Unrecognized data is decoded and
/// re-encoded as PNG.
///
/// # Arguments
///
/// * `bytes` - Raw bytes of the uploaded file
///
/// # Errors
///
/// Returns error if the bytes cannot be decoded as an image at all
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage> {
    let recognized = image::guess_format(bytes)
        .ok()
        .and_then(|format| mime_type_for(format).map(|mime| (format, mime)));

    if let Some((format, mime)) = recognized {
        image::load_from_memory_with_format(bytes, format)
            .map_err(|e| VegapunkError::Image(format!("Failed to decode {} data: {}", mime, e)))?;

        tracing::debug!(mime_type = mime, size = bytes.len(), "Encoded uploaded image");
        return Ok(EncodedImage {
            mime_type: mime.to_string(),
            data: STANDARD.encode(bytes),
        });
    }

    // Unknown container: decode if possible, then fall back to PNG.
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| VegapunkError::Image(format!("Unrecognized image data: {}", e)))?;

    let mut buffer = Cursor::new(Vec::new());
    decoded
        .write_to(&mut buffer, FALLBACK_FORMAT)
        .map_err(|e| VegapunkError::Image(format!("Failed to re-encode image: {}", e)))?;

    tracing::debug!(size = buffer.get_ref().len(), "Transcoded unknown image format to PNG");
    Ok(EncodedImage {
        mime_type: "image/png".to_string(),
        data: STANDARD.encode(buffer.get_ref()),
    })
}

/// Decode transport-form data back into an image
///
/// Used by tests and anywhere the original pixels are needed again.
///
/// # Errors
///
/// Returns error if the base64 is invalid or the bytes are not an image
pub fn decode_image(data: &str) -> Result<DynamicImage> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| VegapunkError::Image(format!("Invalid base64 image data: {}", e)))?;
    image::load_from_memory(&bytes)
        .map_err(|e| VegapunkError::Image(format!("Failed to decode image: {}", e)).into())
}

/// Check whether an uploaded filename has an accepted image extension
///
/// # Examples
///
/// ```
/// use vegapunk::imaging::extension_allowed;
///
/// assert!(extension_allowed("photo.JPG"));
/// assert!(!extension_allowed("notes.txt"));
/// assert!(!extension_allowed("archive"));
/// ```
pub fn extension_allowed(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
