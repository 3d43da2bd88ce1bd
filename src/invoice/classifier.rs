//! Keyword heuristic for deciding whether OCR text looks like an invoice.

use serde::Serialize;

/// Phrases that suggest invoice content. Each counts at most once.
pub const INVOICE_KEYWORDS: [&str; 6] = [
    "invoice",
    "total",
    "amount",
    "bill to",
    "invoice number",
    "invoice date",
];

/// Distinct keywords needed for a positive answer.
pub const MIN_KEYWORD_MATCHES: usize = 2;

const REASON_MATCHED: &str = "Matched keywords in text";
const REASON_NOT_ENOUGH: &str = "Not enough invoice-related content";

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub is_invoice: bool,
    pub reason: &'static str,
    #[serde(skip)]
    pub matched: Vec<&'static str>,
}

/// Classify text by counting distinct invoice keywords, case-insensitively.
pub fn classify(text: &str) -> Classification {
    let lowered = text.to_lowercase();
    let matched: Vec<&'static str> = INVOICE_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .collect();

    let is_invoice = matched.len() >= MIN_KEYWORD_MATCHES;
    Classification {
        is_invoice,
        reason: if is_invoice {
            REASON_MATCHED
        } else {
            REASON_NOT_ENOUGH
        },
        matched,
    }
}
