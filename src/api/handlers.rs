//! Request handlers for the wardrobe endpoints

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::gateway::InpaintOptions;
use crate::registry::{Delivery, DisplayMessage};
use crate::response::{base64, png};
use crate::AppState;

/// Liveness probe payload
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Acknowledgment returned to the HTTP caller in routed mode
#[derive(Serialize)]
pub struct SubmissionAck {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct StallStatus {
    pub timestamp: i64,
}

/// One parsed multipart submission
struct Submission {
    image_bytes: Vec<u8>,
    image: DynamicImage,
    era_prompt: String,
    display_id: Option<String>,
    is_stall: bool,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Time Wardrobe API is running!",
    })
}

pub async fn stall_status(State(state): State<Arc<AppState>>) -> Json<StallStatus> {
    Json(StallStatus {
        timestamp: state.stall.timestamp(),
    })
}

pub async fn stall_latest(State(state): State<Arc<AppState>>) -> Result<Response> {
    let snapshot = state
        .stall
        .latest()
        .ok_or_else(|| AppError::NotFound("No stall result available yet.".to_string()))?;
    Ok(png_response(snapshot.bytes.clone()))
}

/// Transform the clothing in an uploaded image to the requested era.
///
/// Delivery mode is derived from the form fields: a `display_id` routes the
/// result to that display over its socket, otherwise the PNG is returned
/// inline, additionally refreshing the stall snapshot when `is_stall` is set.
pub async fn time_wardrobe(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response> {
    let submission = parse_submission(multipart).await?;
    info!(
        era_prompt = %submission.era_prompt,
        display_id = submission.display_id.as_deref().unwrap_or("-"),
        is_stall = submission.is_stall,
        "Received wardrobe submission"
    );

    match submission.display_id.clone() {
        Some(display_id) => routed_submission(&state, &display_id, submission).await,
        None => inline_submission(&state, submission).await,
    }
}

/// Inline and stalled modes: the caller gets the PNG directly
async fn inline_submission(state: &AppState, submission: Submission) -> Result<Response> {
    let result = process_submission(state, &submission).await?;

    if submission.is_stall {
        let timestamp = state.stall.store(result.clone());
        debug!(timestamp, "Stall snapshot refreshed");
    }

    Ok(png_response(result))
}

/// Routed mode: processing status first, then result or error, all pushed to
/// the display; the HTTP caller only gets an acknowledgment.
async fn routed_submission(
    state: &AppState,
    display_id: &str,
    submission: Submission,
) -> Result<Response> {
    let processing = DisplayMessage::processing(
        &submission.era_prompt,
        base64::encode(&submission.image_bytes),
    );
    report_delivery(state, display_id, processing);

    match process_submission(state, &submission).await {
        Ok(result) => {
            let message =
                DisplayMessage::result(base64::encode(&result), &submission.era_prompt);
            report_delivery(state, display_id, message);
            Ok((
                StatusCode::OK,
                Json(SubmissionAck {
                    message: "Image submitted and result sent to display.",
                }),
            )
                .into_response())
        }
        Err(error) => {
            report_delivery(state, display_id, DisplayMessage::error(error.to_string()));
            Err(error)
        }
    }
}

/// Normalize, inpaint, and encode one submission
async fn process_submission(state: &AppState, submission: &Submission) -> Result<Vec<u8>> {
    let normalized = state.normalizer.normalize(&submission.image).await?;
    let result = state
        .gateway
        .inpaint(
            normalized.image,
            normalized.mask,
            &submission.era_prompt,
            InpaintOptions::default(),
        )
        .await?;
    png::encode_rgb(&result)
}

/// Delivery failures never escalate to the HTTP caller
fn report_delivery(state: &AppState, display_id: &str, message: DisplayMessage) {
    match state.registry.send_to(display_id, message) {
        Delivery::Delivered => {}
        Delivery::NotFound => debug!(display = %display_id, "Display not connected, push skipped"),
        Delivery::Failed => warn!(display = %display_id, "Display went away during push"),
    }
}

async fn parse_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut file: Option<(Vec<u8>, String)> = None;
    let mut era_prompt: Option<String> = None;
    let mut display_id: Option<String> = None;
    let mut is_stall = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(format!("Could not read upload: {}", e)))?;
                file = Some((bytes.to_vec(), content_type));
            }
            Some("era_prompt") => {
                era_prompt = Some(field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Could not read era_prompt: {}", e))
                })?);
            }
            Some("display_id") => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Could not read display_id: {}", e))
                })?;
                if !value.trim().is_empty() {
                    display_id = Some(value.trim().to_string());
                }
            }
            Some("is_stall") => {
                let value = field.text().await.map_err(|e| {
                    AppError::InvalidRequest(format!("Could not read is_stall: {}", e))
                })?;
                is_stall = matches!(
                    value.trim().to_ascii_lowercase().as_str(),
                    "true" | "1" | "yes"
                );
            }
            _ => {}
        }
    }

    let (image_bytes, content_type) =
        file.ok_or_else(|| AppError::InvalidRequest("Missing image file.".to_string()))?;
    if !content_type.starts_with("image/") {
        return Err(AppError::InvalidRequest(
            "Uploaded file is not an image.".to_string(),
        ));
    }
    let era_prompt = era_prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest("Missing era_prompt.".to_string()))?;

    let image = image::load_from_memory(&image_bytes)
        .map_err(|e| AppError::InvalidRequest(format!("Could not read image file: {}", e)))?;

    Ok(Submission {
        image_bytes,
        image,
        era_prompt,
        display_id,
        is_stall,
    })
}

fn png_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        bytes,
    )
        .into_response()
}
