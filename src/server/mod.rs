//! Web interface: upload form, JSON API, and example gallery.

mod error;
mod gallery;
mod handlers;
mod page;

pub use error::ApiError;
pub use gallery::Gallery;
pub use page::Pages;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::inference::BirdClassifier;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared, read-only state handed to every request.
pub struct AppState {
    /// Loaded classifier.
    pub classifier: Arc<BirdClassifier>,
    /// Example images.
    pub gallery: Gallery,
    /// Compiled HTML pages.
    pub pages: Pages,
}

impl AppState {
    /// Build state from a loaded classifier and server settings.
    pub fn new(classifier: Arc<BirdClassifier>, config: &ServerConfig) -> Result<Self> {
        Ok(Self {
            classifier,
            gallery: Gallery::discover(&config.examples_dir),
            pages: Pages::new(config)?,
        })
    }
}

/// Construct the router with all endpoints.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/classify", post(handlers::classify_form))
        .route("/api/classify", post(handlers::classify_api))
        .route("/api/labels", get(handlers::labels))
        .route("/api/info", get(handlers::model_info))
        .route("/examples/{name}", get(handlers::example_image))
        .route("/examples/{name}/classify", get(handlers::classify_example))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind and serve until Ctrl+C.
pub async fn serve(classifier: Arc<BirdClassifier>, config: &ServerConfig) -> Result<()> {
    let state = AppState::new(classifier, config)?;
    info!(
        "{} example image(s) available from {}",
        state.gallery.names().len(),
        config.examples_dir.display()
    );

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::ServerBind {
            addr: addr.clone(),
            source,
        })?;

    info!("{} listening on http://{}", config.title, addr);

    axum::serve(listener, router(state, config.max_upload_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::inference::{InferenceBackend, LabelSet, ModelInfo};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "birdlens-test-boundary";

    struct FixedBackend;

    impl InferenceBackend for FixedBackend {
        fn predict(&self, _image: &DynamicImage) -> crate::Result<Vec<f32>> {
            Ok(vec![0.1, 0.2, 0.6, 0.1])
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                device: "test".to_string(),
                ..ModelInfo::default()
            }
        }
    }

    fn classifier() -> Arc<BirdClassifier> {
        let labels = LabelSet::from_vocabulary(["Blue Jay", "Killdeer", "Mourning Dove", "Osprey"]);
        Arc::new(BirdClassifier::new(Box::new(FixedBackend), labels).unwrap())
    }

    fn png_bytes() -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([150, 140, 120])));
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn app_with(examples_dir: &std::path::Path, max_upload_bytes: usize) -> Router {
        let config = ServerConfig {
            examples_dir: examples_dir.to_path_buf(),
            max_upload_bytes,
            ..ServerConfig::default()
        };
        router(AppState::new(classifier(), &config).unwrap(), max_upload_bytes)
    }

    fn app() -> Router {
        app_with(std::path::Path::new("/nonexistent/examples"), 1024 * 1024)
    }

    fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"dove.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = text_body(response).await;
        assert!(html.contains("Bird Species Classifier"));
        assert!(html.contains("enctype=\"multipart/form-data\""));
    }

    #[tokio::test]
    async fn test_api_classify_returns_full_ranked_label_set() {
        let response = app()
            .oneshot(multipart_request("/api/classify", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["label"], "Mourning Dove");
        let confidences = json["confidences"].as_array().unwrap();
        assert_eq!(confidences.len(), 4);
        assert_eq!(confidences[0]["label"], "Mourning Dove");
        assert_eq!(confidences[1]["label"], "Killdeer");

        let sum: f64 = confidences
            .iter()
            .map(|c| c["confidence"].as_f64().unwrap())
            .sum();
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_api_classify_rejects_undecodable_image() {
        let response = app()
            .oneshot(multipart_request("/api/classify", "image", b"not an image"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "invalid_image");
    }

    #[tokio::test]
    async fn test_api_classify_requires_image_field() {
        let response = app()
            .oneshot(multipart_request("/api/classify", "photo", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "missing_image");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_rejected() {
        let app = app_with(std::path::Path::new("/nonexistent/examples"), 64);
        let response = app
            .oneshot(multipart_request("/api/classify", "image", &[0u8; 4096]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_form_classify_renders_ranked_html() {
        let response = app()
            .oneshot(multipart_request("/classify", "image", &png_bytes()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = text_body(response).await;
        let dove = html.find("Mourning Dove").unwrap();
        let osprey = html.find("Osprey").unwrap();
        assert!(dove < osprey);
        assert!(html.contains("60.0%"));
    }

    #[tokio::test]
    async fn test_form_classify_error_is_html() {
        let response = app()
            .oneshot(multipart_request("/classify", "image", b"garbage"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(text_body(response).await.contains("could not decode image"));
    }

    #[tokio::test]
    async fn test_labels_endpoint() {
        let response = app()
            .oneshot(Request::get("/api/labels").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(
            json,
            serde_json::json!(["Blue Jay", "Killdeer", "Mourning Dove", "Osprey"])
        );
    }

    #[tokio::test]
    async fn test_info_endpoint() {
        let response = app()
            .oneshot(Request::get("/api/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = json_body(response).await;
        assert_eq!(json["num_classes"], 4);
        assert_eq!(json["device"], "test");
    }

    #[tokio::test]
    async fn test_example_gallery_serves_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Mourning Dove.png"), png_bytes()).unwrap();
        let app = app_with(dir.path(), 1024 * 1024);

        let response = app
            .clone()
            .oneshot(
                Request::get("/examples/Mourning%20Dove.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");

        let response = app
            .oneshot(
                Request::get("/examples/Mourning%20Dove.png/classify")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = text_body(response).await;
        assert!(html.contains("Result for Mourning Dove.png"));
        assert!(html.contains("src=\"/examples/Mourning%20Dove.png\""));
    }

    #[tokio::test]
    async fn test_unknown_example_is_not_found() {
        let response = app()
            .oneshot(
                Request::get("/examples/missing.jpg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
