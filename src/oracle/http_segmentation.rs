//! HTTP client for the segmentation oracle

use async_trait::async_trait;
use image::RgbImage;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::OracleConfig;
use crate::error::{AppError, Result};
use crate::oracle::traits::{SegmentationMap, SegmentationOracle};
use crate::response::{base64, png};

/// Segmentation model reached over the fixed HTTP contract
pub struct HttpSegmentationOracle {
    client: Client,
    endpoint: String,
}

/// Wire request for the segmentation endpoint
#[derive(Debug, Serialize)]
struct ApiSegmentRequest {
    image: String,
    width: u32,
    height: u32,
}

/// Wire response from the segmentation endpoint
#[derive(Debug, Deserialize)]
struct ApiSegmentResponse {
    labels: String,
    width: u32,
    height: u32,
}

impl HttpSegmentationOracle {
    /// Create a new client from configuration
    pub fn new(config: &OracleConfig) -> Result<Self> {
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
impl SegmentationOracle for HttpSegmentationOracle {
    fn name(&self) -> &str {
        "segmentation"
    }

    async fn segment(&self, image: &RgbImage) -> Result<SegmentationMap> {
        let (width, height) = image.dimensions();
        let api_request = ApiSegmentRequest {
            image: base64::encode(&png::encode_rgb(image)?),
            width,
            height,
        };

        let url = format!("{}/segment", self.endpoint);
        debug!(url = %url, width, height, "Sending segmentation request");

        let response = self.client.post(&url).json(&api_request).send().await?;

        if response.status() == StatusCode::SERVICE_UNAVAILABLE {
            return Err(AppError::ModelsNotReady(
                "segmentation model is still loading".to_string(),
            ));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Processing(format!(
                "Segmentation oracle returned {}: {}",
                status, body
            )));
        }

        let api_response: ApiSegmentResponse = response
            .json()
            .await
            .map_err(|e| AppError::Processing(format!("Failed to parse segmentation response: {}", e)))?;

        let map = SegmentationMap {
            labels: base64::decode(&api_response.labels)
                .map_err(|e| AppError::Processing(e.to_string()))?,
            width: api_response.width,
            height: api_response.height,
        };
        map.validate()?;
        Ok(map)
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.endpoint);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %url, error = %e, "Segmentation health check failed");
                false
            }
        }
    }
}
