//! Locating (and fetching) the ocrs model files.

#![cfg_attr(not(feature = "ocr-ocrs"), allow(dead_code))]

use std::path::{Path, PathBuf};

const MODEL_HOST: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";

/// One model file the ocrs engine needs.
#[derive(Debug, Clone, Copy)]
pub struct ModelFile {
    pub name: &'static str,
    pub approx_size: &'static str,
}

impl ModelFile {
    pub fn url(&self) -> String {
        format!("{}/{}", MODEL_HOST, self.name)
    }
}

pub const DETECTION: ModelFile = ModelFile {
    name: "text-detection.rten",
    approx_size: "2.5 MB",
};

pub const RECOGNITION: ModelFile = ModelFile {
    name: "text-recognition.rten",
    approx_size: "10 MB",
};

const REQUIRED: [ModelFile; 2] = [DETECTION, RECOGNITION];

/// Where downloaded models are stored.
pub fn default_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("invoice-ocr")
        .join("ocrs")
}

/// Directories searched, in order, when no explicit path is configured.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![default_dir()];
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".cache").join("ocrs"));
    }
    dirs.push(PathBuf::from("/usr/share/ocrs/models"));
    dirs.push(PathBuf::from("models/ocrs"));
    dirs
}

fn is_complete(dir: &Path) -> bool {
    REQUIRED.iter().all(|model| dir.join(model.name).is_file())
}

/// The first directory holding every model file. An explicit directory is
/// tried before the standard locations.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(search_dirs())
        .find(|dir| is_complete(dir))
}

#[cfg(feature = "ocr-ocrs")]
pub use fetch::download_missing;

#[cfg(feature = "ocr-ocrs")]
mod fetch {
    use std::path::Path;
    use std::process::Command;
    use std::sync::Mutex;

    use super::REQUIRED;
    use crate::ocr::{check_binary, OcrError};

    /// Held for the whole download so concurrent first requests never write
    /// the same file at once.
    static DOWNLOAD: Mutex<()> = Mutex::new(());

    /// Download every model not yet present in `dir` using `curl`.
    pub fn download_missing(dir: &Path) -> Result<(), OcrError> {
        let _guard = DOWNLOAD.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        std::fs::create_dir_all(dir)?;
        for model in REQUIRED {
            let dest = dir.join(model.name);
            if dest.is_file() {
                continue;
            }
            if !check_binary("curl") {
                return Err(OcrError::ModelNotFound(format!(
                    "{} missing from {} and curl is not installed",
                    model.name,
                    dir.display()
                )));
            }

            tracing::info!("Downloading {} (~{})", model.name, model.approx_size);
            let status = Command::new("curl")
                .args(["-fsSL", "-o"])
                .arg(&dest)
                .arg(model.url())
                .status()?;
            if !status.success() {
                let _ = std::fs::remove_file(&dest);
                return Err(OcrError::ModelNotFound(format!(
                    "download of {} failed ({})",
                    model.url(),
                    status
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_prefers_explicit_complete_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DETECTION.name), b"x").unwrap();
        assert_ne!(locate(Some(dir.path())).as_deref(), Some(dir.path()));

        std::fs::write(dir.path().join(RECOGNITION.name), b"x").unwrap();
        assert_eq!(locate(Some(dir.path())).as_deref(), Some(dir.path()));
    }

    #[cfg(feature = "ocr-ocrs")]
    #[test]
    fn test_concurrent_download_of_complete_dir_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        for model in REQUIRED {
            std::fs::write(dir.path().join(model.name), b"x").unwrap();
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| download_missing(dir.path())))
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });
        assert_eq!(std::fs::read(dir.path().join(DETECTION.name)).unwrap(), b"x");
    }

    #[test]
    fn test_model_urls() {
        assert_eq!(
            RECOGNITION.url(),
            "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten"
        );
    }
}
