//! Common traits and types for the external model oracles

use async_trait::async_trait;
use image::{GrayImage, RgbImage};

use crate::error::{AppError, Result};

/// Dense per-pixel class labels produced by the segmentation oracle
#[derive(Debug, Clone)]
pub struct SegmentationMap {
    /// One class index per pixel, row-major
    pub labels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SegmentationMap {
    /// Validate that the label buffer covers every pixel exactly once
    pub fn validate(&self) -> Result<()> {
        let expected = self.width as usize * self.height as usize;
        if self.labels.len() != expected {
            return Err(AppError::Processing(format!(
                "Segmentation map has {} labels for {}x{} pixels",
                self.labels.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// Trait for the external segmentation model
#[async_trait]
pub trait SegmentationOracle: Send + Sync {
    /// Get the oracle name
    fn name(&self) -> &str;

    /// Label every pixel of the image with a garment class index
    async fn segment(&self, image: &RgbImage) -> Result<SegmentationMap>;

    /// Check if the oracle is reachable and its model is loaded
    async fn health_check(&self) -> bool;
}

/// Fully-resolved request to the inpainting oracle
///
/// Prompt augmentation and sampling defaults have already been applied by the
/// gateway; oracles transmit this verbatim.
#[derive(Debug, Clone)]
pub struct InpaintRequest {
    pub image: RgbImage,
    pub mask: GrayImage,
    pub prompt: String,
    pub negative_prompt: String,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
}

/// Trait for the external inpainting model
#[async_trait]
pub trait InpaintingOracle: Send + Sync {
    /// Get the oracle name
    fn name(&self) -> &str;

    /// Regenerate the masked region conditioned on the prompt
    async fn inpaint(&self, request: &InpaintRequest) -> Result<RgbImage>;

    /// Check if the oracle is reachable and its model is loaded
    async fn health_check(&self) -> bool;
}
