//! Invoice processing: classification, extraction and JSON repair.

mod classifier;
mod extractor;
mod record;
mod repair;

pub use classifier::{classify, Classification, INVOICE_KEYWORDS, MIN_KEYWORD_MATCHES};
pub use extractor::{ExtractError, ExtractionOutcome, InvoiceExtractor};
pub use record::{InvoiceRecord, LineItem, TaxBifurcation};
pub use repair::{find_json_object, repair_json, strip_code_fences, RepairFailure};
