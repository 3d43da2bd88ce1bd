//! HTTP request handlers.

mod convert;
mod error;
mod invoice;
mod status;
mod upload;

pub use convert::convert_pdf;
pub use error::ApiError;
pub use invoice::{extract_invoice, is_invoice};
pub use status::health;
