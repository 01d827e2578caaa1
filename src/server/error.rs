//! HTTP error mapping.

use super::page::Pages;
use crate::error::Error;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// Error returned to HTTP clients.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    /// Build an error with an explicit status.
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with the given public code.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 404 for an unknown resource.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// 500 for unexpected failures.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Public error code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render as an HTML error page, falling back to JSON if the page fails.
    pub fn into_html(self, pages: &Pages) -> Response {
        match pages.error(self.status, &self.message) {
            Ok(body) => {
                self.log();
                (self.status, Html(body)).into_response()
            }
            Err(e) => {
                error!("Error page failed: {e}");
                self.into_response()
            }
        }
    }

    fn log(&self) {
        if self.status.is_server_error() {
            error!("{} {}: {}", self.status.as_u16(), self.code, self.message);
        } else {
            warn!("{} {}: {}", self.status.as_u16(), self.code, self.message);
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ImageDecode(e) => {
                Self::bad_request("invalid_image", format!("could not decode image: {e}"))
            }
            e @ (Error::Inference { .. } | Error::OutputShape { .. }) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "inference_failed",
                e.to_string(),
            ),
            e => Self::internal(e.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), "invalid_upload", err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_is_bad_request() {
        let decode = image::load_from_memory(b"garbage").err();
        let Some(decode) = decode else {
            panic!("garbage bytes decoded as an image");
        };
        let api = ApiError::from(Error::ImageDecode(decode));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "invalid_image");
    }

    #[test]
    fn test_inference_error_is_server_error() {
        let api = ApiError::from(Error::OutputShape {
            expected: 64,
            actual: 10,
        });
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), "inference_failed");
        assert!(api.message().contains("64"));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let api = ApiError::from(Error::Internal {
            message: "boom".to_string(),
        });
        assert_eq!(api.code(), "internal");
    }
}
