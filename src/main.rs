//! Main entry point for the Time Wardrobe Gateway

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use time_wardrobe_gateway::{
    api,
    config::Settings,
    gateway::{InferenceDefaults, InferenceGateway},
    normalizer::ImageNormalizer,
    oracle::{HttpInpaintingOracle, HttpSegmentationOracle, InpaintingOracle, SegmentationOracle},
    registry::ConnectionRegistry,
    stall::SnapshotCache,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Deployment variants (default vs. stall) are separate config files
    let config_path =
        std::env::var("TIME_WARDROBE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let settings = Settings::load_from_path(&config_path)?;
    settings.validate()?;

    init_logging(&settings);
    info!(config = %config_path, "Starting Time Wardrobe Gateway");

    // Oracle handles are built exactly once and shared by every request
    let segmentation: Arc<dyn SegmentationOracle> =
        Arc::new(HttpSegmentationOracle::new(&settings.segmentation)?);
    let inpainting: Arc<dyn InpaintingOracle> =
        Arc::new(HttpInpaintingOracle::new(&settings.inpainting)?);

    let gateway = Arc::new(InferenceGateway::new(
        segmentation.clone(),
        inpainting,
        InferenceDefaults::from(&settings.inpainting),
        settings.inpainting.max_concurrent,
    ));

    // The service must not accept traffic until both oracles answer; an
    // unreachable model aborts startup instead of degrading to per-request
    // failures.
    if !gateway.ready().await {
        anyhow::bail!(
            "model oracles are not ready (segmentation: {}, inpainting: {})",
            settings.segmentation.endpoint,
            settings.inpainting.endpoint
        );
    }
    info!("Model oracles are ready");

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState {
        settings: Arc::new(RwLock::new(settings)),
        normalizer: Arc::new(ImageNormalizer::new(segmentation)),
        gateway,
        registry: Arc::new(ConnectionRegistry::new()),
        stall: Arc::new(SnapshotCache::new()),
    });

    let app = api::routes::create_router(app_state).await;

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.clone()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
