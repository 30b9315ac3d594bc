//! Image normalizer - deterministic resizing plus clothing-mask derivation
//!
//! Every submission passes through here exactly once before inpainting. The
//! resized image and its mask are owned by the request and discarded after the
//! inpainting call consumes them.

pub mod mask;
pub mod policy;

use image::{imageops, imageops::FilterType, DynamicImage, GrayImage, RgbImage};
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::oracle::SegmentationOracle;

/// Resized image and its derived clothing mask, dimensions aligned
pub struct NormalizedImage {
    pub image: RgbImage,
    pub mask: GrayImage,
}

impl NormalizedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Resizes submissions to model-friendly dimensions and derives their masks
pub struct ImageNormalizer {
    segmentation: Arc<dyn SegmentationOracle>,
}

impl ImageNormalizer {
    pub fn new(segmentation: Arc<dyn SegmentationOracle>) -> Self {
        Self { segmentation }
    }

    /// Resize the source image per the dimension policy and derive its clothing
    /// mask from the segmentation oracle's labels.
    ///
    /// Oracle failures surface as processing failures; nothing is retried.
    pub async fn normalize(&self, source: &DynamicImage) -> Result<NormalizedImage> {
        let rgb = source.to_rgb8();
        let (width, height) = rgb.dimensions();
        let (new_width, new_height) = policy::target_dimensions(width, height);

        debug!(width, height, new_width, new_height, "Resizing submission");
        let resized = imageops::resize(&rgb, new_width, new_height, FilterType::Lanczos3);

        let map = self
            .segmentation
            .segment(&resized)
            .await
            .map_err(|e| e.into_processing())?;
        let mask = mask::clothing_mask(&map)?;

        Ok(NormalizedImage {
            image: resized,
            mask,
        })
    }
}
