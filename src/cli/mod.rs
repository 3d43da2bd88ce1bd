//! Command-line interface for invoice-ocr.

mod commands;
pub mod icons;

pub use commands::{is_verbose, run};
