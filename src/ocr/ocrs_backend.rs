//! Pure-Rust OCR via `ocrs`.
//!
//! The engine is expensive to build, so it is loaded on first use and kept
//! for the life of the process.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use super::backend::{OcrBackend, OcrBackendKind, OcrError, OcrResult};
use super::models;

static ENGINE: OnceLock<ocrs::OcrEngine> = OnceLock::new();

pub struct OcrsBackend {
    model_dir: Option<PathBuf>,
}

impl OcrsBackend {
    /// `model_dir` overrides the standard model search locations.
    pub fn new(model_dir: Option<PathBuf>) -> Self {
        Self { model_dir }
    }

    fn engine(&self) -> Result<&'static ocrs::OcrEngine, OcrError> {
        if let Some(engine) = ENGINE.get() {
            return Ok(engine);
        }
        let dir = match models::locate(self.model_dir.as_deref()) {
            Some(dir) => dir,
            None => {
                let dir = self.model_dir.clone().unwrap_or_else(models::default_dir);
                models::download_missing(&dir)?;
                dir
            }
        };
        let engine = load_engine(&dir)?;
        // A concurrent first call may have won; either engine is fine.
        let _ = ENGINE.set(engine);
        ENGINE
            .get()
            .ok_or_else(|| OcrError::OcrFailed("engine cache empty".to_string()))
    }
}

fn load_model(dir: &Path, file: models::ModelFile) -> Result<rten::Model, OcrError> {
    rten::Model::load_file(dir.join(file.name))
        .map_err(|e| OcrError::ModelNotFound(format!("{}: {}", file.name, e)))
}

fn load_engine(dir: &Path) -> Result<ocrs::OcrEngine, OcrError> {
    tracing::info!("Loading ocrs models from {}", dir.display());
    ocrs::OcrEngine::new(ocrs::OcrEngineParams {
        detection_model: Some(load_model(dir, models::DETECTION)?),
        recognition_model: Some(load_model(dir, models::RECOGNITION)?),
        ..Default::default()
    })
    .map_err(|e| OcrError::OcrFailed(format!("engine init: {}", e)))
}

impl OcrBackend for OcrsBackend {
    fn kind(&self) -> OcrBackendKind {
        OcrBackendKind::Ocrs
    }

    fn check(&self) -> Result<(), String> {
        match models::locate(self.model_dir.as_deref()) {
            Some(_) => Ok(()),
            None => Err(format!(
                "models not found; they will be downloaded to {} on first use",
                models::default_dir().display()
            )),
        }
    }

    fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let started = Instant::now();
        let engine = self.engine()?;

        let rgb = image::open(image_path)
            .map_err(|e| OcrError::ImageError(e.to_string()))?
            .into_rgb8();
        let source = ocrs::ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| OcrError::ImageError(e.to_string()))?;
        let input = engine
            .prepare_input(source)
            .map_err(|e| OcrError::OcrFailed(e.to_string()))?;
        // One line per detected text row, top to bottom.
        let text = engine
            .get_text(&input)
            .map_err(|e| OcrError::OcrFailed(e.to_string()))?;

        Ok(OcrResult {
            text,
            backend: OcrBackendKind::Ocrs,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
