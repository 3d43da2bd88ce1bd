//! Tesseract command-line backend.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use super::backend::{OcrBackend, OcrBackendKind, OcrError, OcrResult};
use super::check_binary;

pub struct TesseractBackend {
    language: String,
}

impl TesseractBackend {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }
}

impl OcrBackend for TesseractBackend {
    fn kind(&self) -> OcrBackendKind {
        OcrBackendKind::Tesseract
    }

    fn check(&self) -> Result<(), String> {
        if check_binary("tesseract") {
            Ok(())
        } else {
            Err("tesseract not on PATH (apt install tesseract-ocr)".to_string())
        }
    }

    fn recognize(&self, image_path: &Path) -> Result<OcrResult, OcrError> {
        let started = Instant::now();
        let output = Command::new("tesseract")
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    OcrError::BackendNotAvailable("tesseract not on PATH".to_string())
                }
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            return Err(OcrError::OcrFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(OcrResult {
            text: join_fragments(&String::from_utf8_lossy(&output.stdout)),
            backend: OcrBackendKind::Tesseract,
            processing_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Collapse tesseract's layout output into one fragment per line.
///
/// Blank separator lines and the trailing form feed carry no text and are
/// dropped. Fragment order is left untouched.
pub(crate) fn join_fragments(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == '\x0c'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_fragments_drops_blank_lines_and_form_feed() {
        let raw = "ACME Corp\n\nINVOICE\n  Total: 100.00  \n\x0c";
        assert_eq!(join_fragments(raw), "ACME Corp\nINVOICE\nTotal: 100.00");
    }

    #[test]
    fn test_join_fragments_keeps_order_and_duplicates() {
        assert_eq!(join_fragments("Total\nAmount\nTotal\n"), "Total\nAmount\nTotal");
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let backend = TesseractBackend::new("eng");
        assert!(backend
            .recognize(Path::new("/nonexistent/invoice.jpg"))
            .is_err());
    }
}
