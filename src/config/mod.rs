//! Configuration module - settings loading and validation

pub mod settings;

pub use settings::{InpaintingConfig, LoggingConfig, OracleConfig, ServerConfig, Settings};
