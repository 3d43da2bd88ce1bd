//! HTTP-facing errors.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const NO_IMAGE: &str = "No image uploaded";
pub const NO_PDF: &str = "No PDF uploaded";
pub const EMPTY_FILE_NAME: &str = "Empty file name";
pub const NOT_A_PDF: &str = "Uploaded file is not a PDF";

/// Error returned by a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Client input problem with a fixed message.
    BadRequest(&'static str),
    /// The multipart body could not be read (malformed, or over the size limit).
    Upload(MultipartError),
    /// Server-side failure.
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(e) => e.status(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.to_string(),
            ApiError::Upload(e) => e.body_text(),
            ApiError::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }
        (
            status,
            Json(serde_json::json!({ "error": self.message() })),
        )
            .into_response()
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Upload(e)
    }
}
