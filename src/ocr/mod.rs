//! Image to text.
//!
//! Two engines sit behind [`OcrBackend`]: the `tesseract` binary (default)
//! and `ocrs` (feature `ocr-ocrs`). [`create_backend`] builds the configured
//! one once per process; requests share it.

mod backend;
mod models;
mod tesseract;

#[cfg(feature = "ocr-ocrs")]
mod ocrs_backend;

pub use backend::{create_backend, OcrBackend, OcrBackendKind, OcrConfig, OcrError, OcrResult};
pub use tesseract::TesseractBackend;

#[cfg(feature = "ocr-ocrs")]
pub use ocrs_backend::OcrsBackend;

/// Whether `name` resolves to an executable on `PATH`.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}
