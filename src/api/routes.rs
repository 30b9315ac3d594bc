//! Router assembly

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{handlers, ws};
use crate::AppState;

/// Build the application router with CORS, tracing, and upload limits applied
pub async fn create_router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.settings.read().await.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::health_check))
        .route("/time_wardrobe/", post(handlers::time_wardrobe))
        .route("/stall/status", get(handlers::stall_status))
        .route("/stall/latest", get(handlers::stall_latest))
        .route("/ws/:display_id", get(ws::display_socket))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        // Display frontends are served from arbitrary origins
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
