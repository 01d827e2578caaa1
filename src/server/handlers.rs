//! Route handlers.

use super::AppState;
use super::error::ApiError;
use super::gallery::content_type;
use crate::constants::{APP_NAME, server::IMAGE_FIELD};
use crate::inference::{BirdClassifier, ClassificationOutput, ModelInfo, Prediction};
use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Uploaded image bytes.
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: APP_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    Ok(Html(state.pages.index(state.gallery.names())?))
}

/// `GET /api/labels`
pub async fn labels(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.classifier.labels().as_slice().to_vec())
}

/// `GET /api/info`
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.classifier.info())
}

/// `POST /api/classify`
///
/// Returns every label ranked by descending probability.
pub async fn classify_api(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ClassificationOutput>, ApiError> {
    let upload = read_upload(multipart).await?;
    let prediction = run_classifier(Arc::clone(&state.classifier), upload.bytes).await?;
    Ok(Json(prediction.to_output(None)))
}

/// `POST /classify`
pub async fn classify_form(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let result = async {
        let upload = read_upload(multipart).await?;
        let source = upload
            .file_name
            .clone()
            .unwrap_or_else(|| "uploaded image".to_string());
        let prediction = run_classifier(Arc::clone(&state.classifier), upload.bytes).await?;
        Ok::<_, ApiError>((source, prediction))
    }
    .await;

    match result {
        Ok((source, prediction)) => html_page(state.pages.result(
            &source,
            None,
            &prediction.to_output(None),
            state.gallery.names(),
        )),
        Err(e) => e.into_html(&state.pages),
    }
}

/// `GET /examples/{name}`
pub async fn example_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = read_example(&state, &name).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&name))], bytes).into_response())
}

/// `GET /examples/{name}/classify`
pub async fn classify_example(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let result = async {
        let bytes = read_example(&state, &name).await?;
        run_classifier(Arc::clone(&state.classifier), bytes).await
    }
    .await;

    match result {
        Ok(prediction) => html_page(state.pages.result(
            &name,
            Some(&name),
            &prediction.to_output(None),
            state.gallery.names(),
        )),
        Err(e) => e.into_html(&state.pages),
    }
}

fn html_page(rendered: crate::Result<String>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Pull the image field out of a multipart form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::bad_request("empty_upload", "no image was uploaded"));
        }
        return Ok(Upload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }
    Err(ApiError::bad_request(
        "missing_image",
        format!("multipart field '{IMAGE_FIELD}' is required"),
    ))
}

async fn read_example(state: &AppState, name: &str) -> Result<Vec<u8>, ApiError> {
    let path = state
        .gallery
        .path_of(name)
        .ok_or_else(|| ApiError::not_found(format!("unknown example '{name}'")))?;
    tokio::fs::read(&path).await.map_err(|source| {
        ApiError::from(crate::Error::ExampleRead {
            path: path.clone(),
            source,
        })
    })
}

/// Run the synchronous classifier off the async executor.
async fn run_classifier(
    classifier: Arc<BirdClassifier>,
    bytes: Vec<u8>,
) -> Result<Prediction, ApiError> {
    let size = bytes.len();
    let prediction = tokio::task::spawn_blocking(move || classifier.classify_bytes(&bytes))
        .await
        .map_err(|e| ApiError::internal(format!("classification task failed: {e}")))??;

    if let Some(top) = prediction.top() {
        info!(
            "Classified {} byte image: {} ({:.4})",
            size, top.label, top.confidence
        );
    }
    Ok(prediction)
}
