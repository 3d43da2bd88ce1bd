//! Liveness endpoint.

use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}
