//! Local invoice extraction and classification commands.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::cli::icons::Icon;
use crate::config::Config;
use crate::invoice::InvoiceExtractor;
use crate::llm::LlmClient;
use crate::ocr::create_backend;

fn build_extractor(config: &Config) -> anyhow::Result<InvoiceExtractor> {
    let ocr = create_backend(&config.ocr)?;
    let llm = LlmClient::new(config.llm.clone())?;
    Ok(InvoiceExtractor::new(ocr, Arc::new(llm), &config.llm))
}

fn ensure_file(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(())
}

/// OCR an image, structure it with the LLM and print the JSON.
pub async fn cmd_extract(config: &Config, image: &Path) -> anyhow::Result<()> {
    ensure_file(image)?;
    let extractor = build_extractor(config)?;

    eprintln!(
        "{} Extracting {} with {}",
        Icon::Step,
        style(image.display()).bold(),
        config.llm.model
    );
    let outcome = extractor.extract(image).await?;

    if outcome.is_failure() {
        eprintln!("{} Model output could not be parsed or repaired", Icon::Fail);
    } else if outcome.was_repaired() {
        eprintln!("{} Extracted after JSON repair", Icon::Warn);
    } else {
        eprintln!("{} Extracted", Icon::Done);
    }

    if let Some(record) = outcome.record() {
        let field = |value: Option<&str>| value.unwrap_or("-").to_string();
        eprintln!(
            "  {} {} / {} / {}",
            Icon::Detail,
            field(record.company_name.as_deref()),
            field(record.invoice_number.as_deref()),
            field(record.invoice_date.as_deref())
        );
        eprintln!(
            "  {} total {}, {} line items",
            Icon::Detail,
            record
                .total_amount
                .map_or_else(|| "-".to_string(), |t| format!("{:.2}", t)),
            record.line_item_count()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome.into_json())?);
    Ok(())
}

/// OCR an image and print the invoice classification.
pub async fn cmd_classify(config: &Config, image: &Path) -> anyhow::Result<()> {
    ensure_file(image)?;
    let extractor = build_extractor(config)?;

    let classification = extractor.classify(image).await?;
    if !classification.matched.is_empty() {
        eprintln!(
            "{} Matched: {}",
            Icon::Step,
            classification.matched.join(", ")
        );
    }

    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}
