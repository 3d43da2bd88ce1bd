//! Typed, absent-tolerant view of an extracted invoice.
//!
//! The service returns whatever JSON object the model produced. This view is
//! read out of that object for logging and display; a field that is missing
//! or has an unexpected JSON type is simply `None`.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(rename = "Company Name", default, deserialize_with = "lenient")]
    pub company_name: Option<String>,
    #[serde(rename = "Vendor GST Number", default, deserialize_with = "lenient")]
    pub vendor_tax_id: Option<String>,
    #[serde(rename = "Invoice Number", default, deserialize_with = "lenient")]
    pub invoice_number: Option<String>,
    /// Expected as DD-MMM-YYYY, not checked.
    #[serde(rename = "Invoice Date", default, deserialize_with = "lenient")]
    pub invoice_date: Option<String>,
    #[serde(rename = "Bill-to Address", default, deserialize_with = "lenient")]
    pub bill_to_address: Option<String>,
    #[serde(rename = "Ship-to Address", default, deserialize_with = "lenient")]
    pub ship_to_address: Option<String>,
    #[serde(rename = "RCM Applicable", default, deserialize_with = "lenient")]
    pub rcm_applicable: Option<bool>,
    #[serde(rename = "RCM Amount", default, deserialize_with = "lenient")]
    pub rcm_amount: Option<f64>,
    #[serde(rename = "Billing Address", default, deserialize_with = "lenient")]
    pub billing_address: Option<String>,
    #[serde(rename = "Total Amount", default, deserialize_with = "lenient")]
    pub total_amount: Option<f64>,
    #[serde(rename = "Tax Total", default, deserialize_with = "lenient")]
    pub tax_total: Option<f64>,
    #[serde(rename = "Tax Bifurcation", default, deserialize_with = "lenient")]
    pub tax_bifurcation: Option<TaxBifurcation>,
    #[serde(rename = "Line Items", default, deserialize_with = "lenient")]
    pub line_items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxBifurcation {
    #[serde(rename = "IGST", default, deserialize_with = "lenient")]
    pub igst: Option<f64>,
    #[serde(rename = "CGST", default, deserialize_with = "lenient")]
    pub cgst: Option<f64>,
    #[serde(rename = "SGST", default, deserialize_with = "lenient")]
    pub sgst: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<f64>,
}

/// Deserialize a field, turning a type mismatch into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl InvoiceRecord {
    /// Read the typed view out of a JSON value. Returns `None` unless the
    /// value is an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Number of line items the model reported.
    pub fn line_item_count(&self) -> usize {
        self.line_items.as_ref().map_or(0, Vec::len)
    }
}
