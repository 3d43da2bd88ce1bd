//! Temporary on-disk storage for uploaded files.
//!
//! Every upload is written to its own uniquely named file and removed when
//! the [`TempUpload`] is dropped, whichever way the request ends.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Extension used when the uploaded filename has none.
const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

/// An uploaded file persisted for the lifetime of a request.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
}

impl TempUpload {
    /// Write `content` to a new temporary file.
    ///
    /// The file lives in `dir` when given, otherwise in the system temp
    /// directory. Its suffix follows the extension of `original_filename`.
    pub fn persist(
        dir: Option<&Path>,
        original_filename: &str,
        content: &[u8],
    ) -> std::io::Result<Self> {
        let suffix = format!(".{}", upload_extension(original_filename));
        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);

        let mut file = match dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };
        file.write_all(content)?;
        file.flush()?;

        tracing::debug!(
            "Stored upload '{}' ({} bytes) at {}",
            original_filename,
            content.len(),
            file.path().display()
        );
        Ok(Self { file })
    }

    /// Path of the stored file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Owned copy of the path, for moving into blocking tasks.
    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

/// Lowercased extension of an uploaded filename, restricted to a safe charset.
fn upload_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}
