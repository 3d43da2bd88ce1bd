//! Prompt templates for invoice extraction.

/// Prompt for structuring OCR text into the invoice schema.
/// `{ocr_text}` is replaced verbatim with the recognized text.
pub const EXTRACTION_PROMPT: &str = r#"
Extract ONLY the fields from the OCR invoice text. Return a valid **JSON object only** with the following structure. DO NOT return markdown (no ```), explanation, or text before/after JSON.

All numeric fields (e.g., total, tax, RCM) must be numbers (not words). Dates should follow DD-MMM-YYYY. Quantity should be numeric and line items cost and quantity should be accurate numbers. Example:

{
  "Company Name": "",
  "Vendor GST Number": "",
  "Invoice Number": "",
  "Invoice Date": "",
  "Bill-to Address": "",
  "Ship-to Address": "",
  "RCM Applicable": false,
  "RCM Amount": 0.0,
  "Billing Address": "",
  "Total Amount": 0.0,
  "Tax Total": 0.0,
  "Tax Bifurcation": {
    "IGST": 0.0,
    "CGST": 0.0,
    "SGST": 0.0
  },
  "Line Items": [
    {
      "description": "",
      "quantity": 1,
      "price": 0.0
    }
  ]
}

OCR TEXT:
"""{ocr_text}"""
"#;

/// Prompt asking the model to fix its own malformed JSON.
/// `{raw_output}` is replaced with the broken completion.
pub const REPAIR_PROMPT: &str = r#"
You are a JSON repair expert.

Fix the following broken or improperly formatted JSON to make it valid and strict.
- All keys and string values should be in double quotes.
- No trailing commas.
- Amounts must be numeric (no words or currency symbols).
- Return only the corrected JSON. No explanation, no markdown, no commentary.

Here is the raw output:
"""{raw_output}"""
"#;

/// Build the extraction prompt for a block of OCR text.
pub fn extraction_prompt(ocr_text: &str) -> String {
    EXTRACTION_PROMPT.replace("{ocr_text}", ocr_text)
}

/// Build the repair prompt for a broken completion.
pub fn repair_prompt(raw_output: &str) -> String {
    REPAIR_PROMPT.replace("{raw_output}", raw_output)
}
