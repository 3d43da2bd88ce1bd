//! Reading a single file field out of a multipart request.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;

use super::error::{ApiError, EMPTY_FILE_NAME};
use crate::storage::TempUpload;

/// A file received from the client.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Write the upload to its own temporary file.
    pub fn persist(&self, dir: Option<&std::path::Path>) -> Result<TempUpload, ApiError> {
        TempUpload::persist(dir, &self.filename, &self.bytes)
            .map_err(|e| ApiError::Internal(format!("Failed to store upload: {}", e)))
    }
}

/// Find the file field called `field_name`.
///
/// A request that is not multipart, or has no such field, is reported with
/// `missing`. A matching field sent as a plain form value (no `filename`
/// attribute) is not a file and is skipped; `filename=""` is an empty file
/// name.
pub async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
    field_name: &str,
    missing: &'static str,
) -> Result<Upload, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::BadRequest(missing));
    };

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::BadRequest(EMPTY_FILE_NAME));
        }

        let bytes = field.bytes().await?;
        tracing::debug!(
            "Received {} upload '{}' ({} bytes)",
            field_name,
            filename,
            bytes.len()
        );
        return Ok(Upload { filename, bytes });
    }

    Err(ApiError::BadRequest(missing))
}
