//! Functional tests for the wardrobe HTTP surface
//!
//! The router is driven directly with `tower::ServiceExt::oneshot`; the model
//! oracles are in-process fakes that count their invocations.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use time_wardrobe_gateway::{
    api,
    config::Settings,
    error::{AppError, Result},
    gateway::{InferenceDefaults, InferenceGateway},
    normalizer::ImageNormalizer,
    oracle::{InpaintRequest, InpaintingOracle, SegmentationMap, SegmentationOracle},
    registry::ConnectionRegistry,
    response::png,
    stall::SnapshotCache,
    AppState,
};

/// Labels the middle band of the image as a dress, counts calls
struct FakeSegmentation {
    calls: AtomicUsize,
    not_ready: bool,
}

impl FakeSegmentation {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            not_ready: false,
        }
    }
}

#[async_trait]
impl SegmentationOracle for FakeSegmentation {
    fn name(&self) -> &str {
        "fake-segmentation"
    }

    async fn segment(&self, image: &RgbImage) -> Result<SegmentationMap> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.not_ready {
            return Err(AppError::ModelsNotReady(
                "segmentation model is still loading".to_string(),
            ));
        }
        let (width, height) = image.dimensions();
        let mut labels = vec![0u8; (width * height) as usize];
        for y in height / 3..2 * height / 3 {
            for x in 0..width {
                labels[(y * width + x) as usize] = 7;
            }
        }
        Ok(SegmentationMap {
            labels,
            width,
            height,
        })
    }

    async fn health_check(&self) -> bool {
        !self.not_ready
    }
}

/// Echoes the input image back, counts calls, optionally fails
struct FakeInpainting {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeInpainting {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }
}

#[async_trait]
impl InpaintingOracle for FakeInpainting {
    fn name(&self) -> &str {
        "fake-inpainting"
    }

    async fn inpaint(&self, request: &InpaintRequest) -> Result<RgbImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Processing("diffusion went sideways".to_string()));
        }
        Ok(request.image.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

struct TestApp {
    router: Router,
    segmentation: Arc<FakeSegmentation>,
    inpainting: Arc<FakeInpainting>,
    state: Arc<AppState>,
}

async fn spawn_app(segmentation: FakeSegmentation, inpainting: FakeInpainting) -> TestApp {
    let segmentation = Arc::new(segmentation);
    let inpainting = Arc::new(inpainting);
    let settings = Settings::default();

    let state = Arc::new(AppState {
        normalizer: Arc::new(ImageNormalizer::new(segmentation.clone())),
        gateway: Arc::new(InferenceGateway::new(
            segmentation.clone(),
            inpainting.clone(),
            InferenceDefaults::from(&settings.inpainting),
            settings.inpainting.max_concurrent,
        )),
        registry: Arc::new(ConnectionRegistry::new()),
        stall: Arc::new(SnapshotCache::new()),
        settings: Arc::new(RwLock::new(settings)),
    });

    TestApp {
        router: api::routes::create_router(state.clone()).await,
        segmentation,
        inpainting,
        state,
    }
}

const BOUNDARY: &str = "wardrobe-test-boundary";

/// Assemble a multipart/form-data body from (name, filename/content-type, bytes) parts
fn multipart_body(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file {
            Some((filename, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn wardrobe_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/time_wardrobe/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let mut image = RgbImage::new(width, height);
    for pixel in image.pixels_mut() {
        *pixel = Rgb([120, 90, 60]);
    }
    png::encode_rgb(&image).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_inline_submission_returns_normalized_png() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(1000, 1500),
        ),
        ("era_prompt", None, b"Victorian gown"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );

    // 1000x1500 normalizes to 512x768 under the dimension policy
    let result = image::load_from_memory(&body_bytes(response).await).unwrap();
    assert_eq!(result.width(), 512);
    assert_eq!(result.height(), 768);
    assert_eq!(app.segmentation.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.inpainting.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_non_image_upload_rejected_before_any_model_call() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        ("file", Some(("notes.txt", "text/plain")), b"just some text"),
        ("era_prompt", None, b"Victorian gown"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("not an image"));
    assert_eq!(app.segmentation.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.inpainting.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_era_prompt_rejected() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[(
        "file",
        Some(("photo.png", "image/png")),
        &sample_png(64, 64),
    )]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.segmentation.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_routed_submission_to_absent_display_still_acks() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(640, 480),
        ),
        ("era_prompt", None, b"1920s flapper"),
        ("display_id", None, b"ghost-display"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body["message"],
        "Image submitted and result sent to display."
    );
    // Processing still ran even though nobody was listening
    assert_eq!(app.inpainting.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_routed_submission_pushes_processing_then_result() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;
    let (_id, mut rx) = app.state.registry.register(Some("wall"));

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(640, 480),
        ),
        ("era_prompt", None, b"Victorian gown"),
        ("display_id", None, b"wall"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let first = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["type"], "status");
    assert_eq!(first["status"], "processing");
    assert_eq!(first["prompt"], "Victorian gown");
    assert!(first["original_image"].as_str().is_some());

    let second = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(second["type"], "result");
    assert_eq!(second["prompt"], "Victorian gown");
    assert!(second["result_image"].as_str().is_some());
}

#[tokio::test]
async fn test_routed_failure_pushes_error_status() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(true)).await;
    let (_id, mut rx) = app.state.registry.register(Some("wall"));

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(640, 480),
        ),
        ("era_prompt", None, b"Victorian gown"),
        ("display_id", None, b"wall"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let first = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["status"], "processing");

    let second = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(second["status"], "error");
    assert!(second["message"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn test_processing_failure_maps_to_500() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(true)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(64, 64),
        ),
        ("era_prompt", None, b"toga"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("sideways"));
}

#[tokio::test]
async fn test_models_not_ready_maps_to_503() {
    let mut segmentation = FakeSegmentation::new();
    segmentation.not_ready = true;
    let app = spawn_app(segmentation, FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(64, 64),
        ),
        ("era_prompt", None, b"toga"),
    ]);
    let response = app.router.oneshot(wardrobe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_stall_latest_is_404_before_any_write() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/stall/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/stall/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["timestamp"], 0);
}

#[tokio::test]
async fn test_stall_submission_refreshes_snapshot() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(640, 480),
        ),
        ("era_prompt", None, b"medieval tunic"),
        ("is_stall", None, b"true"),
    ]);
    let response = app
        .router
        .clone()
        .oneshot(wardrobe_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let inline_bytes = body_bytes(response).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/stall/latest")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, inline_bytes);

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/stall/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_plain_submission_does_not_touch_snapshot() {
    let app = spawn_app(FakeSegmentation::new(), FakeInpainting::new(false)).await;

    let body = multipart_body(&[
        (
            "file",
            Some(("photo.png", "image/png")),
            &sample_png(64, 64),
        ),
        ("era_prompt", None, b"toga"),
    ]);
    let response = app
        .router
        .clone()
        .oneshot(wardrobe_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app.state.stall.latest().is_none());
}
