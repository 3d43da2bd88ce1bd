//! Invoice OCR service library.
//!
//! OCR backends, the LLM client, invoice extraction with JSON repair, PDF
//! rasterization, and the HTTP server that exposes them.

pub mod cli;
pub mod config;
pub mod invoice;
pub mod llm;
pub mod ocr;
pub mod pdf;
pub mod server;
pub mod storage;
