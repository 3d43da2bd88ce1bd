//! PDF to page images endpoint.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;

use super::error::{ApiError, NOT_A_PDF, NO_PDF};
use super::upload::read_upload;
use crate::pdf::EncodedPage;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub message: String,
    pub images: Vec<EncodedPage>,
}

/// `POST /convert`: rasterize every page of the `pdf` field to base64 PNG.
pub async fn convert_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let upload = read_upload(multipart, "pdf", NO_PDF).await?;
    if !upload.filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest(NOT_A_PDF));
    }

    let stored = upload.persist(state.temp_dir.as_deref())?;
    let rasterizer = state.rasterizer.clone();
    let path = stored.path_buf();

    let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&path))
        .await
        .map_err(|e| ApiError::Internal(format!("Conversion failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("Conversion failed: {}", e)))?;
    drop(stored);

    tracing::info!("Converted '{}' to {} pages", upload.filename, pages.len());
    Ok(Json(ConvertResponse {
        message: format!("Converted {} pages.", pages.len()),
        images: pages.iter().map(EncodedPage::from).collect(),
    }))
}
