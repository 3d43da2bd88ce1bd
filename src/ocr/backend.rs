//! The OCR seam: one trait, its error type, and the `[ocr]` settings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend unavailable: {0}")]
    BackendNotAvailable(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("OCR model missing: {0}")]
    ModelNotFound(String),

    #[error("Image could not be read: {0}")]
    ImageError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Text recognized from one image.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// One recognized fragment per line, in engine order.
    pub text: String,
    pub backend: OcrBackendKind,
    pub processing_time_ms: u64,
}

/// Engines that can be selected in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    /// The `tesseract` command-line tool.
    #[default]
    Tesseract,
    /// The pure-Rust `ocrs` engine (feature `ocr-ocrs`).
    Ocrs,
}

impl OcrBackendKind {
    pub fn name(self) -> &'static str {
        match self {
            OcrBackendKind::Tesseract => "tesseract",
            OcrBackendKind::Ocrs => "ocrs",
        }
    }
}

impl fmt::Display for OcrBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OcrBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [OcrBackendKind::Tesseract, OcrBackendKind::Ocrs]
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown OCR backend '{}'", s))
    }
}

/// An OCR engine shared by all requests.
///
/// `recognize` is called from the blocking thread pool and may be called
/// concurrently.
pub trait OcrBackend: Send + Sync {
    fn kind(&self) -> OcrBackendKind;

    /// `Err` with an install hint when the engine cannot run here.
    fn check(&self) -> Result<(), String>;

    /// Recognize the text in an image file.
    fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError>;
}

/// `[ocr]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    /// Tesseract language code, e.g. `eng` or `deu`.
    pub language: String,
    /// Directory holding the ocrs detection/recognition models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            language: "eng".to_string(),
            model_path: None,
        }
    }
}

impl OcrConfig {
    /// Apply `OCR_BACKEND` and `OCR_LANGUAGE`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("OCR_BACKEND") {
            match val.parse() {
                Ok(kind) => self.backend = kind,
                Err(e) => tracing::warn!("Ignoring OCR_BACKEND: {}", e),
            }
        }
        if let Ok(language) = std::env::var("OCR_LANGUAGE") {
            if !language.is_empty() {
                self.language = language;
            }
        }
        self
    }
}

/// Build the configured engine once for the whole process.
pub fn create_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    let backend: Arc<dyn OcrBackend> = match config.backend {
        OcrBackendKind::Tesseract => Arc::new(super::TesseractBackend::new(&config.language)),
        #[cfg(feature = "ocr-ocrs")]
        OcrBackendKind::Ocrs => Arc::new(super::OcrsBackend::new(config.model_path.clone())),
        #[cfg(not(feature = "ocr-ocrs"))]
        OcrBackendKind::Ocrs => {
            return Err(OcrError::BackendNotAvailable(
                "built without the ocr-ocrs feature".to_string(),
            ))
        }
    };

    match backend.check() {
        Ok(()) => tracing::debug!("OCR backend {} ready", backend.kind()),
        Err(hint) => tracing::warn!("OCR backend {} may fail: {}", backend.kind(), hint),
    }
    Ok(backend)
}
