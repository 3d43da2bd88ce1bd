//! invoice-ocr - invoice OCR and structured extraction service.
//!
//! Reads invoice images with OCR, structures the text into JSON with an LLM
//! (repairing malformed output once), and converts PDFs into page images.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_ocr::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env must be applied before config and filters read the environment.
    let _ = dotenvy::dotenv();

    let default_filter = if cli::is_verbose() {
        "invoice_ocr=debug,tower_http=debug"
    } else {
        "invoice_ocr=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
