//! HTTP client for the inpainting oracle

use async_trait::async_trait;
use image::RgbImage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::InpaintingConfig;
use crate::error::{AppError, Result};
use crate::oracle::traits::{InpaintRequest, InpaintingOracle};
use crate::response::{base64, png};

/// Inpainting model reached over the fixed HTTP contract
pub struct HttpInpaintingOracle {
    client: Client,
    endpoint: String,
}

/// Wire request for the inpainting endpoint
#[derive(Debug, Serialize)]
struct ApiInpaintRequest {
    image: String,
    mask: String,
    prompt: String,
    negative_prompt: String,
    guidance_scale: f32,
    num_inference_steps: u32,
    width: u32,
    height: u32,
}

/// Wire response from the inpainting endpoint
#[derive(Debug, Deserialize)]
struct ApiInpaintResponse {
    image: String,
}

impl HttpInpaintingOracle {
    /// Create a new client from configuration
    pub fn new(config: &InpaintingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl InpaintingOracle for HttpInpaintingOracle {
    fn name(&self) -> &str {
        "inpainting"
    }

    async fn inpaint(&self, request: &InpaintRequest) -> Result<RgbImage> {
        let (width, height) = request.image.dimensions();
        let api_request = ApiInpaintRequest {
            image: base64::encode(&png::encode_rgb(&request.image)?),
            mask: base64::encode(&png::encode_gray(&request.mask)?),
            prompt: request.prompt.clone(),
            negative_prompt: request.negative_prompt.clone(),
            guidance_scale: request.guidance_scale,
            num_inference_steps: request.num_inference_steps,
            width,
            height,
        };

        let url = format!("{}/inpaint", self.endpoint);
        debug!(
            url = %url,
            width,
            height,
            steps = request.num_inference_steps,
            "Sending inpainting request"
        );

        let response = self.client.post(&url).json(&api_request).send().await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AppError::ModelsNotReady(
                "inpainting model is still loading".to_string(),
            ));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Processing(format!(
                "Inpainting oracle returned {}: {}",
                status, body
            )));
        }

        let api_response: ApiInpaintResponse = response
            .json()
            .await
            .map_err(|e| AppError::Processing(format!("Failed to parse inpainting response: {}", e)))?;

        let bytes =
            base64::decode(&api_response.image).map_err(|e| AppError::Processing(e.to_string()))?;
        png::decode_rgb(&bytes)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Inpainting health check failed");
                false
            }
        }
    }
}
