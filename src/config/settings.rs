//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub segmentation: OracleConfig,
    pub inpainting: InpaintingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for multipart upload bodies, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Connection settings for the segmentation oracle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleConfig {
    #[serde(default = "default_segmentation_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_segmentation_endpoint() -> String {
    "http://127.0.0.1:9901".to_string()
}

fn default_timeout() -> u64 {
    60000
}

/// Connection and sampling settings for the inpainting oracle
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InpaintingConfig {
    #[serde(default = "default_inpainting_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_inpaint_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,
    #[serde(default = "default_num_inference_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    /// How many inpainting calls may be in flight at once. The loaded model is
    /// not assumed reentrant, so this defaults to fully serialized access.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_inpainting_endpoint() -> String {
    "http://127.0.0.1:9902".to_string()
}

fn default_inpaint_timeout() -> u64 {
    300000
}

fn default_guidance_scale() -> f32 {
    9.0
}

fn default_num_inference_steps() -> u32 {
    75
}

fn default_negative_prompt() -> String {
    "modern clothing, contemporary fashion, distorted, blurry, low quality, \
     bad quality, bad anatomy, deformed, glitch, disfigured, extra limbs, \
     extra fingers, naked"
        .to_string()
}

fn default_max_concurrent() -> usize {
    1
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.max_upload_bytes", default_max_upload_bytes() as u64)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("segmentation.endpoint", default_segmentation_endpoint())?
            .set_default("segmentation.timeout_ms", default_timeout())?
            .set_default("inpainting.endpoint", default_inpainting_endpoint())?
            .set_default("inpainting.timeout_ms", default_inpaint_timeout())?
            .set_default("inpainting.guidance_scale", default_guidance_scale() as f64)?
            .set_default(
                "inpainting.num_inference_steps",
                default_num_inference_steps() as u64,
            )?
            .set_default("inpainting.negative_prompt", default_negative_prompt())?
            .set_default("inpainting.max_concurrent", default_max_concurrent() as u64)?
            // Load from configuration file
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with TIME_WARDROBE__)
            .add_source(
                Environment::with_prefix("TIME_WARDROBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        for (name, endpoint) in [
            ("segmentation", &self.segmentation.endpoint),
            ("inpainting", &self.inpainting.endpoint),
        ] {
            if endpoint.is_empty() {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "{} oracle endpoint cannot be empty",
                    name
                ))));
            }
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(AppError::Config(config::ConfigError::Message(format!(
                    "{} oracle endpoint '{}' must be an http(s) URL",
                    name, endpoint
                ))));
            }
        }

        if !self.inpainting.guidance_scale.is_finite() || self.inpainting.guidance_scale <= 0.0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "inpainting.guidance_scale must be a positive number".to_string(),
            )));
        }
        if self.inpainting.num_inference_steps == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "inpainting.num_inference_steps must be at least 1".to_string(),
            )));
        }
        if self.inpainting.max_concurrent == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "inpainting.max_concurrent must be at least 1".to_string(),
            )));
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                max_upload_bytes: default_max_upload_bytes(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            segmentation: OracleConfig {
                endpoint: default_segmentation_endpoint(),
                timeout_ms: default_timeout(),
            },
            inpainting: InpaintingConfig {
                endpoint: default_inpainting_endpoint(),
                timeout_ms: default_inpaint_timeout(),
                guidance_scale: default_guidance_scale(),
                num_inference_steps: default_num_inference_steps(),
                negative_prompt: default_negative_prompt(),
                max_concurrent: default_max_concurrent(),
            },
        }
    }
}
