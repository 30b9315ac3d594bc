//! Inference gateway wrapping the segmentation and inpainting oracles
//!
//! Built once at startup and shared by every request; oracle handles are never
//! re-created per request.

use image::{GrayImage, RgbImage};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::config::InpaintingConfig;
use crate::error::{AppError, Result};
use crate::oracle::{InpaintRequest, InpaintingOracle, SegmentationOracle};

/// Suffix appended to every prompt to hold the subject's face steady
pub const FACE_PRESERVATION_SUFFIX: &str =
    "identical face and expression, preserve original facial features and details:1.3";

/// Attributes appended to every negative prompt
const UNDESIRED_ATTRIBUTES: &str = "deformed face, changed face, distorted features, \
     different person, blurry face, skin alterations";

/// Sampling defaults applied when the caller leaves options unset
#[derive(Debug, Clone)]
pub struct InferenceDefaults {
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
    pub negative_prompt: String,
}

impl From<&InpaintingConfig> for InferenceDefaults {
    fn from(config: &InpaintingConfig) -> Self {
        Self {
            guidance_scale: config.guidance_scale,
            num_inference_steps: config.num_inference_steps,
            negative_prompt: config.negative_prompt.clone(),
        }
    }
}

/// Per-call overrides for the sampling parameters
#[derive(Debug, Clone, Default)]
pub struct InpaintOptions {
    pub guidance_scale: Option<f32>,
    pub num_inference_steps: Option<u32>,
}

/// Stable request/response wrapper over the external oracles
pub struct InferenceGateway {
    segmentation: Arc<dyn SegmentationOracle>,
    inpainting: Arc<dyn InpaintingOracle>,
    defaults: InferenceDefaults,
    // The loaded inpainting model is not assumed reentrant; calls queue here.
    permits: Semaphore,
}

impl InferenceGateway {
    pub fn new(
        segmentation: Arc<dyn SegmentationOracle>,
        inpainting: Arc<dyn InpaintingOracle>,
        defaults: InferenceDefaults,
        max_concurrent: usize,
    ) -> Self {
        Self {
            segmentation,
            inpainting,
            defaults,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    /// Probe both oracles; the service must not accept traffic until this
    /// reports true.
    pub async fn ready(&self) -> bool {
        self.segmentation.health_check().await && self.inpainting.health_check().await
    }

    /// Regenerate the masked region of `image` conditioned on the era prompt.
    ///
    /// The caller's prompt is augmented with the face-preservation suffix and
    /// the negative prompt with the fixed undesired-attribute list. Returns an
    /// image sized identically to the input; any oracle failure propagates as a
    /// processing failure.
    pub async fn inpaint(
        &self,
        image: RgbImage,
        mask: GrayImage,
        era_prompt: &str,
        options: InpaintOptions,
    ) -> Result<RgbImage> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| AppError::Internal("inference gate closed".to_string()))?;

        let (width, height) = image.dimensions();
        let request = InpaintRequest {
            prompt: format!("{}, {}", era_prompt, FACE_PRESERVATION_SUFFIX),
            negative_prompt: format!("{}, {}", self.defaults.negative_prompt, UNDESIRED_ATTRIBUTES),
            guidance_scale: options
                .guidance_scale
                .unwrap_or(self.defaults.guidance_scale),
            num_inference_steps: options
                .num_inference_steps
                .unwrap_or(self.defaults.num_inference_steps),
            image,
            mask,
        };

        debug!(
            width,
            height,
            guidance_scale = request.guidance_scale,
            steps = request.num_inference_steps,
            "Dispatching inpainting request"
        );

        let result = self
            .inpainting
            .inpaint(&request)
            .await
            .map_err(|e| e.into_processing())?;

        if result.dimensions() != (width, height) {
            return Err(AppError::Processing(format!(
                "Inpainting oracle returned {}x{} for a {}x{} input",
                result.dimensions().0,
                result.dimensions().1,
                width,
                height
            )));
        }

        Ok(result)
    }
}
