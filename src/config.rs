//! Configuration management for invoice-ocr using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::llm::LlmConfig;
use crate::ocr::OcrConfig;
use crate::pdf::DEFAULT_DPI;

/// Default upload limit (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body limit in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Directory for per-request upload files. System temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            temp_dir: None,
        }
    }
}

impl ServerConfig {
    /// Apply `INVOICE_OCR_HOST`, `INVOICE_OCR_PORT` and `INVOICE_OCR_TEMP_DIR`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("INVOICE_OCR_HOST") {
            self.host = host;
        }
        if let Ok(val) = std::env::var("INVOICE_OCR_PORT") {
            match val.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid INVOICE_OCR_PORT '{}'", val),
            }
        }
        if let Ok(dir) = std::env::var("INVOICE_OCR_TEMP_DIR") {
            if !dir.is_empty() {
                self.temp_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }
}

/// PDF rasterization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfConfig {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self { dpi: default_dpi() }
    }
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path is read directly. Otherwise prefer discovers an
    /// `invoice-ocr` config file in the standard locations; with no file,
    /// defaults are used. Environment overrides are applied last.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, String> {
        let config = match explicit {
            Some(path) => Self::load_from_path(path).await?,
            None => Self::discover().await,
        };
        Ok(config.with_env_overrides())
    }

    async fn discover() -> Self {
        match prefer::load("invoice-ocr").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("{}, using defaults", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Format follows the extension: TOML, YAML, or JSON (the fallback).
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => {
                toml::from_str(contents).map_err(|e| format!("Failed to parse TOML config: {}", e))
            }
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Apply environment variable overrides to every section.
    pub fn with_env_overrides(mut self) -> Self {
        self.server = self.server.with_env_overrides();
        self.llm = self.llm.with_env_overrides();
        self.ocr = self.ocr.with_env_overrides();
        self
    }

    /// Serialize to TOML, as printed by `invoice-ocr config`.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }
}
