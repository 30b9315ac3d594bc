//! Time Wardrobe Gateway
//!
//! An HTTP/WebSocket gateway that re-dresses photos into a chosen era.
//! Uploaded images are resized to model-friendly dimensions, their clothing
//! region is masked via an external segmentation model, and the region is
//! regenerated by an external inpainting model. Results are returned inline,
//! pushed to a registered display over WebSocket, or cached in a single
//! poll-able snapshot slot.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod normalizer;
pub mod oracle;
pub mod registry;
pub mod response;
pub mod stall;

pub use error::{AppError, Result};

use std::sync::Arc;
use tokio::sync::RwLock;

use gateway::InferenceGateway;
use normalizer::ImageNormalizer;
use registry::ConnectionRegistry;
use stall::SnapshotCache;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<RwLock<config::Settings>>,
    pub normalizer: Arc<ImageNormalizer>,
    pub gateway: Arc<InferenceGateway>,
    pub registry: Arc<ConnectionRegistry>,
    pub stall: Arc<SnapshotCache>,
}
