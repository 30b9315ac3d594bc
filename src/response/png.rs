//! PNG encoding and decoding helpers
//!
//! Results always leave the service as PNG regardless of the upload format.

use crate::error::{AppError, Result};
use image::{GrayImage, ImageFormat, RgbImage};
use std::io::Cursor;

/// Encode an RGB image buffer as PNG bytes
pub fn encode_rgb(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::Processing(format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Encode a single-channel mask as PNG bytes
pub fn encode_gray(mask: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    mask.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AppError::Processing(format!("Failed to encode mask PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

/// Decode image bytes into an RGB buffer
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AppError::Processing(format!("Failed to decode image: {}", e)))?;
    Ok(image.to_rgb8())
}
