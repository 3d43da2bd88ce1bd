//! PDF rasterization.
//!
//! Renders every page of a PDF to PNG with poppler's `pdftoppm` and returns
//! the pages in document order.

use std::path::{Path, PathBuf};
use std::process::Command;

use base64::Engine;
use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Errors that can occur while rasterizing a PDF.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("pdftoppm failed: {0}")]
    ConversionFailed(String),

    #[error("No pages were rendered")]
    NoPages,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single rendered page.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-indexed page number.
    pub page: u32,
    /// PNG-encoded image.
    pub png: Vec<u8>,
}

impl RasterPage {
    /// Standard (padded) base64 encoding of the PNG bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

/// Transport form of a rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedPage {
    pub page: u32,
    pub image_base64: String,
}

impl From<&RasterPage> for EncodedPage {
    fn from(page: &RasterPage) -> Self {
        Self {
            page: page.page,
            image_base64: page.to_base64(),
        }
    }
}

/// Render PDF pages to PNG at a fixed resolution.
#[derive(Debug, Clone)]
pub struct PdfRasterizer {
    dpi: u32,
}

impl Default for PdfRasterizer {
    fn default() -> Self {
        Self { dpi: DEFAULT_DPI }
    }
}

impl PdfRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rendering resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// Rasterize every page of `pdf_path`.
    ///
    /// All-or-nothing: any failure discards pages already rendered.
    pub fn rasterize(&self, pdf_path: &Path) -> Result<Vec<RasterPage>, RasterError> {
        let temp_dir = TempDir::new()?;
        let output_prefix = temp_dir.path().join("page");

        let output = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string()])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output();

        match output {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(RasterError::ConversionFailed(stderr.trim().to_string()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RasterError::ToolNotFound(
                    "pdftoppm (install poppler-utils)".to_string(),
                ));
            }
            Err(e) => return Err(RasterError::Io(e)),
        }

        let mut pages = Vec::new();
        for (page, path) in collect_page_images(temp_dir.path())? {
            pages.push(RasterPage {
                page,
                png: std::fs::read(&path)?,
            });
        }

        if pages.is_empty() {
            return Err(RasterError::NoPages);
        }

        tracing::debug!(
            "Rasterized {} pages from {} at {} DPI",
            pages.len(),
            pdf_path.display(),
            self.dpi
        );
        Ok(pages)
    }
}

/// Find pdftoppm output files in `dir`, ordered by page number.
///
/// pdftoppm zero-pads page numbers to the width of the last page
/// (page-1.png, page-01.png, page-001.png), so the number is parsed rather
/// than matched by name.
fn collect_page_images(dir: &Path) -> Result<Vec<(u32, PathBuf)>, RasterError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(page) = page_number_from_filename(&path) {
            pages.push((page, path));
        }
    }
    pages.sort_by_key(|(page, _)| *page);
    Ok(pages)
}

fn page_number_from_filename(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

/// A minimal PDF with three blank pages.
#[cfg(test)]
pub(crate) const THREE_PAGE_PDF: &str = "%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R 5 0 R] /Count 3 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj
4 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj
5 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 72 72] >> endobj
xref
0 6
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000127 00000 n
0000000196 00000 n
0000000265 00000 n
trailer << /Size 6 /Root 1 0 R >>
startxref
334
%%EOF
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::check_binary;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    #[test]
    fn test_dpi_defaults_and_override() {
        assert_eq!(PdfRasterizer::new().dpi(), DEFAULT_DPI);
        assert_eq!(PdfRasterizer::new().with_dpi(150).dpi(), 150);
    }

    #[test]
    fn test_page_number_from_filename() {
        assert_eq!(page_number_from_filename(Path::new("/t/page-1.png")), Some(1));
        assert_eq!(page_number_from_filename(Path::new("/t/page-07.png")), Some(7));
        assert_eq!(page_number_from_filename(Path::new("/t/page-120.png")), Some(120));
        assert_eq!(page_number_from_filename(Path::new("/t/page-1.ppm")), None);
        assert_eq!(page_number_from_filename(Path::new("/t/cover.png")), None);
    }

    #[test]
    fn test_collect_page_images_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pages: Vec<u32> = collect_page_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|(page, _)| page)
            .collect();
        assert_eq!(pages, vec![1, 2, 10]);
    }

    #[test]
    fn test_encoded_page_is_standard_base64() {
        let page = RasterPage {
            page: 1,
            png: PNG_MAGIC.to_vec(),
        };
        let encoded = EncodedPage::from(&page);
        assert_eq!(encoded.page, 1);
        assert_eq!(encoded.image_base64, "iVBORw0KGgo=");
    }

    #[test]
    fn test_corrupt_pdf_fails_without_partial_results() {
        if !check_binary("pdftoppm") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let result = PdfRasterizer::new().rasterize(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_three_page_pdf() {
        if !check_binary("pdftoppm") {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, THREE_PAGE_PDF).unwrap();

        let pages = PdfRasterizer::new().with_dpi(30).rasterize(&path).unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        for page in &pages {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(page.to_base64())
                .unwrap();
            assert!(decoded.starts_with(PNG_MAGIC));
        }
    }
}
