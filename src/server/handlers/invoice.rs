//! Invoice extraction and classification endpoints.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use serde_json::Value;

use super::error::{ApiError, NO_IMAGE};
use super::upload::read_upload;
use crate::invoice::Classification;
use crate::server::AppState;

/// `POST /extract-invoice`: OCR the `image` field and structure it as invoice JSON.
///
/// Model output that cannot be parsed or repaired is still a 200, carrying
/// the `{"error", "raw_output"}` record.
pub async fn extract_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let upload = read_upload(multipart, "image", NO_IMAGE).await?;
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(
        "[{}] Extracting invoice from '{}' ({} bytes)",
        request_id,
        upload.filename,
        upload.bytes.len()
    );

    let stored = upload.persist(state.temp_dir.as_deref())?;
    let outcome = state
        .extractor
        .extract(stored.path())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if let Some(record) = outcome.record() {
        tracing::info!(
            "[{}] Invoice {} with {} line items{}",
            request_id,
            record.invoice_number.as_deref().unwrap_or("(no number)"),
            record.line_item_count(),
            if outcome.was_repaired() {
                " after repair"
            } else {
                ""
            }
        );
    }
    Ok(Json(outcome.into_json()))
}

/// `POST /is-invoice`: OCR the `image` field and apply the keyword classifier.
pub async fn is_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Classification>, ApiError> {
    let upload = read_upload(multipart, "image", NO_IMAGE).await?;
    let stored = upload.persist(state.temp_dir.as_deref())?;

    let classification = state
        .extractor
        .classify(stored.path())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(
        "Classified '{}': is_invoice={}",
        upload.filename,
        classification.is_invoice
    );
    Ok(Json(classification))
}
