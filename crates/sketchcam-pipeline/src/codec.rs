//! Frame codec: data-URI text to [`Frame`] and back.
//!
//! Inbound payloads look like `<header>,<base64 body>`. The header is
//! ignored; the image format is sniffed from the decoded bytes, so any
//! format the `image` crate was built with (PNG, JPEG, BMP, WebP) is
//! accepted. Outbound frames are always JPEG.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageEncoder as _;
use image::codecs::jpeg::JpegEncoder;

use crate::types::Frame;

/// Prefix of every encoded outbound frame.
pub const JPEG_DATA_URI_HEADER: &str = "data:image/jpeg;base64,";

/// JPEG quality used for every outbound frame.
pub const JPEG_QUALITY: u8 = 95;

/// Errors that can occur while turning a data URI into a frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload has no `,` between header and body.
    #[error("data URI has no ',' separator")]
    MissingSeparator,

    /// The body is not valid standard base64.
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not an image the `image` crate understands.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors that can occur while compressing a frame.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The JPEG encoder rejected the frame.
    #[error("JPEG encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
}

/// Decode a data-URI payload into a three-channel color frame.
///
/// # Errors
///
/// Returns [`DecodeError::MissingSeparator`] if `payload` contains no
/// comma, [`DecodeError::Base64`] if the body is not valid base64, and
/// [`DecodeError::Image`] if the bytes are empty, corrupt, or in an
/// unrecognized format.
pub fn decode(payload: &str) -> Result<Frame, DecodeError> {
    let (_header, body) = payload
        .split_once(',')
        .ok_or(DecodeError::MissingSeparator)?;
    let bytes = STANDARD.decode(body)?;
    let image = image::load_from_memory(&bytes)?;
    Ok(Frame::Color(image.to_rgb8()))
}

/// Compress a frame to JPEG and wrap it in a data URI.
///
/// Single-channel frames are written as grayscale JPEGs.
///
/// # Errors
///
/// Returns [`EncodeError::Jpeg`] if the encoder rejects the frame (for
/// example, zero or oversized dimensions).
pub fn encode(frame: &Frame) -> Result<String, EncodeError> {
    let jpeg = encode_jpeg(frame)?;
    let mut uri = String::with_capacity(JPEG_DATA_URI_HEADER.len() + jpeg.len().div_ceil(3) * 4);
    uri.push_str(JPEG_DATA_URI_HEADER);
    STANDARD.encode_string(&jpeg, &mut uri);
    Ok(uri)
}

/// Compress a frame to raw JPEG bytes.
///
/// # Errors
///
/// Returns [`EncodeError::Jpeg`] if the encoder rejects the frame.
pub fn encode_jpeg(frame: &Frame) -> Result<Vec<u8>, EncodeError> {
    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    match frame {
        Frame::Gray(img) => encoder.write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::L8,
        )?,
        Frame::Color(img) => encoder.write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )?,
    }
    Ok(jpeg)
}
