//! Invoice extraction: OCR, then LLM structuring with one repair attempt.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::classifier::{classify, Classification};
use super::record::InvoiceRecord;
use super::repair::{repair_json, RepairFailure};
use crate::llm::{extraction_prompt, ChatModel, LlmConfig};
use crate::ocr::{OcrBackend, OcrError, OcrResult};

/// Failures that abort a request before any model output exists.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("OCR task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// What the extraction produced.
///
/// Serializes to the bare JSON object on success, or to the
/// `{"error", "raw_output"}` record when repair failed too.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    /// The first completion was a JSON object.
    Parsed(Map<String, Value>),
    /// The first completion was unusable; the repair pass produced an object.
    Repaired(Map<String, Value>),
    /// Both passes failed.
    Failed(RepairFailure),
}

impl ExtractionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExtractionOutcome::Failed(_))
    }

    pub fn was_repaired(&self) -> bool {
        matches!(self, ExtractionOutcome::Repaired(_))
    }

    /// Typed view of the extracted object, if any.
    pub fn record(&self) -> Option<InvoiceRecord> {
        match self {
            ExtractionOutcome::Parsed(object) | ExtractionOutcome::Repaired(object) => {
                InvoiceRecord::from_json(&Value::Object(object.clone()))
            }
            ExtractionOutcome::Failed(_) => None,
        }
    }

    /// The JSON body sent back to the caller.
    pub fn into_json(self) -> Value {
        match self {
            ExtractionOutcome::Parsed(object) | ExtractionOutcome::Repaired(object) => {
                Value::Object(object)
            }
            ExtractionOutcome::Failed(failure) => serde_json::json!({
                "error": failure.error,
                "raw_output": failure.raw_output,
            }),
        }
    }
}

/// Runs OCR and the structuring/repair sequence.
#[derive(Clone)]
pub struct InvoiceExtractor {
    ocr: Arc<dyn OcrBackend>,
    llm: Arc<dyn ChatModel>,
    model: String,
    repair_model: String,
}

impl InvoiceExtractor {
    pub fn new(ocr: Arc<dyn OcrBackend>, llm: Arc<dyn ChatModel>, config: &LlmConfig) -> Self {
        Self {
            ocr,
            llm,
            model: config.model.clone(),
            repair_model: config.repair_model.clone(),
        }
    }

    /// Run OCR on the blocking pool.
    pub async fn recognize(&self, image_path: &Path) -> Result<OcrResult, ExtractError> {
        let ocr = Arc::clone(&self.ocr);
        let path = image_path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || ocr.recognize(&path)).await??;

        debug!(
            "{} recognized {} chars in {}ms",
            result.backend,
            result.text.len(),
            result.processing_time_ms
        );
        Ok(result)
    }

    /// OCR an image and structure the text into invoice JSON.
    pub async fn extract(&self, image_path: &Path) -> Result<ExtractionOutcome, ExtractError> {
        let ocr = self.recognize(image_path).await?;
        Ok(self.structure(&ocr.text).await)
    }

    /// OCR an image and run the keyword classifier on the text.
    pub async fn classify(&self, image_path: &Path) -> Result<Classification, ExtractError> {
        let ocr = self.recognize(image_path).await?;
        let classification = classify(&ocr.text);
        debug!(
            "Classified as invoice={} (matched {:?})",
            classification.is_invoice, classification.matched
        );
        Ok(classification)
    }

    /// Structure OCR text with the model, repairing once on failure.
    pub async fn structure(&self, ocr_text: &str) -> ExtractionOutcome {
        let prompt = extraction_prompt(ocr_text);

        let raw_output = match self.llm.chat(&self.model, &prompt).await {
            Ok(output) => match serde_json::from_str::<Value>(&output) {
                Ok(Value::Object(object)) => {
                    info!("Model {} returned valid invoice JSON", self.model);
                    return ExtractionOutcome::Parsed(object);
                }
                Ok(other) => {
                    warn!("Model returned JSON {} instead of an object", json_kind(&other));
                    output
                }
                Err(e) => {
                    warn!("Model output is not valid JSON ({}), attempting repair", e);
                    output
                }
            },
            Err(e) => {
                // Nothing to repair, but the repair pass still gets its one attempt
                warn!("Extraction call to {} failed: {}", self.model, e);
                String::new()
            }
        };

        match repair_json(self.llm.as_ref(), &self.repair_model, &raw_output).await {
            Ok(object) => {
                info!("Repair model {} fixed the JSON", self.repair_model);
                ExtractionOutcome::Repaired(object)
            }
            Err(failure) => {
                warn!("JSON repair failed: {}", failure.error);
                ExtractionOutcome::Failed(failure)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
