//! HTTP service for invoice extraction.
//!
//! Exposes three multipart upload endpoints:
//! - `/extract-invoice`: OCR plus LLM structuring of an invoice image
//! - `/is-invoice`: keyword classification of an image
//! - `/convert`: PDF pages to base64 PNG images

mod handlers;
mod routes;

pub use handlers::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::invoice::InvoiceExtractor;
use crate::llm::LlmClient;
use crate::ocr::create_backend;
use crate::pdf::PdfRasterizer;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub extractor: InvoiceExtractor,
    pub rasterizer: PdfRasterizer,
    /// Where uploads are written; system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Build the OCR backend, LLM client and rasterizer from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let ocr = create_backend(&config.ocr)?;
        let llm = LlmClient::new(config.llm.clone())?;

        Ok(Self {
            extractor: InvoiceExtractor::new(ocr, Arc::new(llm), &config.llm),
            rasterizer: PdfRasterizer::new().with_dpi(config.pdf.dpi),
            temp_dir: config.server.temp_dir.clone(),
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

/// Start the web server.
pub async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);
    tracing::info!(
        "Using {} via {} (repair model {})",
        config.llm.model,
        config.llm.endpoint,
        config.llm.repair_model
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::Engine;
    use tempfile::tempdir;
    use tower::ServiceExt;

    use crate::invoice::testing::{FixedOcr, ScriptedChat};
    use crate::llm::LlmConfig;
    use crate::ocr::{check_binary, OcrBackend};
    use crate::pdf::THREE_PAGE_PDF;

    const BOUNDARY: &str = "invoice-ocr-test-boundary";

    fn setup_test_app(
        ocr: impl OcrBackend + 'static,
        llm: Arc<ScriptedChat>,
    ) -> (axum::Router, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let state = AppState {
            extractor: InvoiceExtractor::new(Arc::new(ocr), llm, &LlmConfig::default()),
            rasterizer: PdfRasterizer::new().with_dpi(30),
            temp_dir: Some(dir.path().to_path_buf()),
            max_upload_bytes: 1024 * 1024,
        };
        (create_router(state), dir)
    }

    /// Multipart body with a single part. `filename: None` sends a plain form field.
    fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    field, name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn dir_is_empty(dir: &tempfile::TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let cases = [
            ("/extract-invoice", "No image uploaded"),
            ("/is-invoice", "No image uploaded"),
            ("/convert", "No PDF uploaded"),
        ];

        for (uri, message) in cases {
            let (app, _dir) =
                setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));
            let body = multipart_body("other", Some("x.png"), b"data");
            let (status, json) = send(app, upload_request(uri, body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json, serde_json::json!({ "error": message }), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_empty_filename_is_bad_request() {
        for (uri, field) in [
            ("/extract-invoice", "image"),
            ("/is-invoice", "image"),
            ("/convert", "pdf"),
        ] {
            let (app, _dir) =
                setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));
            let body = multipart_body(field, Some(""), b"");
            let (status, json) = send(app, upload_request(uri, body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["error"], "Empty file name", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_plain_form_value_is_not_an_upload() {
        for (uri, field, missing) in [
            ("/extract-invoice", "image", "No image uploaded"),
            ("/is-invoice", "image", "No image uploaded"),
            ("/convert", "pdf", "No PDF uploaded"),
        ] {
            let (app, _dir) =
                setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));
            let body = multipart_body(field, None, b"just text");
            let (status, json) = send(app, upload_request(uri, body)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(json["error"], missing, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_missing_field() {
        let (app, _dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));
        let request = Request::builder()
            .method("POST")
            .uri("/extract-invoice")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No image uploaded");
    }

    #[tokio::test]
    async fn test_extract_invoice_success_cleans_up() {
        let llm = Arc::new(ScriptedChat::new(vec![Ok(
            r#"{"Company Name": "ACME", "Invoice Number": "INV-9", "Line Items": []}"#,
        )]));
        let (app, dir) = setup_test_app(FixedOcr::new("ACME\nInvoice INV-9"), llm.clone());

        let body = multipart_body("image", Some("scan.png"), b"not really a png");
        let (status, json) = send(app, upload_request("/extract-invoice", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({"Company Name": "ACME", "Invoice Number": "INV-9", "Line Items": []})
        );
        assert_eq!(llm.calls().len(), 1);
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_extract_invoice_unrepairable_output_is_ok_with_error_record() {
        let llm = Arc::new(ScriptedChat::new(vec![Ok("nope"), Ok("still nope")]));
        let (app, dir) = setup_test_app(FixedOcr::new("text"), llm);

        let body = multipart_body("image", Some("scan.jpg"), b"jpeg");
        let (status, json) = send(app, upload_request("/extract-invoice", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["error"], "LLM did not return valid JSON.");
        assert_eq!(json["raw_output"], "still nope");
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_ocr_failure_is_server_error_and_cleans_up() {
        let (app, dir) = setup_test_app(FixedOcr::failing(), Arc::new(ScriptedChat::new(vec![])));

        let body = multipart_body("image", Some("scan.png"), b"png");
        let (status, json) = send(app, upload_request("/extract-invoice", body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("unreadable image"));
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_is_invoice() {
        let (app, dir) = setup_test_app(
            FixedOcr::new("TAX INVOICE\nGrand Total: 1,180.00"),
            Arc::new(ScriptedChat::new(vec![])),
        );

        let body = multipart_body("image", Some("scan.png"), b"png");
        let (status, json) = send(app, upload_request("/is-invoice", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({"is_invoice": true, "reason": "Matched keywords in text"})
        );
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_is_invoice_negative() {
        let (app, _dir) = setup_test_app(
            FixedOcr::new("Lunch menu"),
            Arc::new(ScriptedChat::new(vec![])),
        );

        let body = multipart_body("image", Some("menu.png"), b"png");
        let (_, json) = send(app, upload_request("/is-invoice", body)).await;
        assert_eq!(json["is_invoice"], false);
        assert_eq!(json["reason"], "Not enough invoice-related content");
    }

    #[tokio::test]
    async fn test_convert_rejects_non_pdf_name() {
        let (app, dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));

        let body = multipart_body("pdf", Some("scan.png"), b"%PDF-1.4");
        let (status, json) = send(app, upload_request("/convert", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Uploaded file is not a PDF");
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_convert_corrupt_pdf_is_server_error() {
        let (app, dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));

        let body = multipart_body("pdf", Some("broken.PDF"), b"this is not a pdf");
        let (status, json) = send(app, upload_request("/convert", body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("Conversion failed: "));
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_convert_three_page_pdf() {
        if !check_binary("pdftoppm") {
            return;
        }
        let (app, dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));

        let body = multipart_body("pdf", Some("three.pdf"), THREE_PAGE_PDF.as_bytes());
        let (status, json) = send(app, upload_request("/convert", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Converted 3 pages.");
        let images = json["images"].as_array().unwrap();
        let pages: Vec<u64> = images.iter().map(|i| i["page"].as_u64().unwrap()).collect();
        assert_eq!(pages, vec![1, 2, 3]);

        for image in images {
            let png = base64::engine::general_purpose::STANDARD
                .decode(image["image_base64"].as_str().unwrap())
                .unwrap();
            assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));
        }
        assert!(dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_rejected() {
        let (app, dir) = setup_test_app(FixedOcr::new(""), Arc::new(ScriptedChat::new(vec![])));

        let body = multipart_body("image", Some("big.png"), &vec![b'x'; 2 * 1024 * 1024]);
        let (status, _) = send(app, upload_request("/extract-invoice", body)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(dir_is_empty(&dir));
    }
}
