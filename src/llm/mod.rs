//! LLM integration for invoice structuring.
//!
//! Uses a chat model (Ollama by default) to turn OCR text into invoice JSON
//! and, when that JSON is malformed, to repair it.

mod client;

pub use client::{
    extraction_prompt, repair_prompt, ChatModel, LlmClient, LlmConfig, LlmError, LlmProvider,
};
