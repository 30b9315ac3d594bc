//! Clothing mask derivation from segmentation labels

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

use crate::error::Result;
use crate::oracle::SegmentationMap;

/// Garment class indices treated as clothing: upper-garment, skirt, pants,
/// dress, belt.
pub const CLOTHING_CLASSES: [u8; 5] = [4, 5, 6, 7, 8];

const FOREGROUND: u8 = 255;

/// Build the binary clothing mask for a segmentation map and grow it slightly.
///
/// Foreground pixels are the clothing classes; the mask is dilated with a 5x5
/// square structuring element (one iteration) to over-include boundary pixels
/// and reduce seam artifacts.
pub fn clothing_mask(map: &SegmentationMap) -> Result<GrayImage> {
    map.validate()?;

    let mut mask = GrayImage::new(map.width, map.height);
    for (index, &label) in map.labels.iter().enumerate() {
        if CLOTHING_CLASSES.contains(&label) {
            let x = (index as u32) % map.width;
            let y = (index as u32) / map.width;
            mask.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }

    // Chebyshev radius 2 is the 5x5 square element
    Ok(morphology::dilate(&mask, Norm::LInf, 2))
}
