//! Turns a (possibly data-URL prefixed) base64 payload into pixels.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageError, ImageReader, Limits};
use thiserror::Error;

use crate::shared::constants::MAX_IMAGE_DIMENSION;
use crate::shared::decoded_image::DecodedImage;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid encoding")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("unrecognized image")]
    UnrecognizedImage(#[source] ImageError),
}

/// Strip a `data:<mime>;base64,` header if present.
///
/// Everything up to and including the first comma is dropped; text
/// without a comma is returned unchanged.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, body)) => body,
        None => payload,
    }
}

/// Decode an encoded image payload into a 3-channel pixel matrix.
///
/// ASCII whitespace inside the base64 text (line wrapping) is ignored.
/// Images wider or taller than `MAX_IMAGE_DIMENSION` are refused before
/// their pixels are allocated.
pub fn decode(payload: &str) -> Result<DecodedImage, DecodeError> {
    let body = strip_data_url_prefix(payload);
    let compact: String = body
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(DecodeError::InvalidEncoding)?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::UnrecognizedImage(ImageError::IoError(e)))?;
    reader.limits(limits);
    let image = reader.decode().map_err(DecodeError::UnrecognizedImage)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(DecodeError::UnrecognizedImage(ImageError::Limits(
            image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
        )));
    }

    Ok(DecodedImage::new(image.to_rgb8()))
}
