//! Structured extraction payload normalization.
//!
//! # Responsibility
//! - Decode the JSON contract produced by the vision extraction service.
//! - Expand quantity lines into per-unit items with fresh IDs.
//! - Coerce loosely-typed fields the way the upstream contract allows.
//!
//! # Invariants
//! - A payload without an `items` array is rejected, never coerced.
//! - Every expanded unit gets its own stable ID and a cent-rounded price.
//! - Non-numeric tax/tip/price values degrade to zero, not to an error.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::receipt::{round2, ReceiptItem};
use crate::parser::ParsedReceipt;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures while decoding one extraction payload.
#[derive(Debug)]
pub enum ExtractError {
    /// Payload is not valid JSON.
    InvalidPayload(serde_json::Error),
    /// Payload decoded but violates the items contract.
    InvalidExtraction(String),
    /// Payload is a well-formed upstream error report.
    UpstreamRejected(String),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload(err) => write!(f, "extraction payload is not valid JSON: {err}"),
            Self::InvalidExtraction(message) => {
                write!(f, "invalid extraction response: {message}")
            }
            Self::UpstreamRejected(message) => {
                write!(f, "extraction service reported an error: {message}")
            }
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPayload(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidPayload(value)
    }
}

/// Decodes raw JSON text from the extraction service into receipt parts.
///
/// # Errors
/// - `InvalidPayload` when the body is not JSON.
/// - `UpstreamRejected` when the body carries an `error` field.
/// - `InvalidExtraction` when `items` is missing or not an array.
pub fn decode_extraction(raw: &str) -> Result<ParsedReceipt, ExtractError> {
    let payload: Value = serde_json::from_str(raw)?;
    normalize_extraction(&payload)
}

/// Normalizes one decoded extraction payload into receipt parts.
///
/// Per entry at index `i`:
/// - `quantity` counts only when it is a positive number, else 1.
/// - `price` is the line total and counts only when numeric, else 0.
/// - the unit price is `price / quantity` for multi-unit lines, rounded
///   to cents.
/// - a missing or blank name falls back to `Item {i + 1}`.
///
/// The entry is expanded into one `ReceiptItem` per unit, each with a
/// fresh ID.
pub fn normalize_extraction(payload: &Value) -> Result<ParsedReceipt, ExtractError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(ExtractError::UpstreamRejected(message.to_string()));
    }

    let entries = payload
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ExtractError::InvalidExtraction("missing items array".to_string())
        })?;

    let mut items = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let quantity = entry
            .get("quantity")
            .and_then(Value::as_f64)
            .filter(|value| *value > 0.0)
            .unwrap_or(1.0);
        let line_total = entry
            .get("price")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let unit_price = if quantity > 1.0 {
            round2(line_total / quantity)
        } else {
            round2(line_total)
        };
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| format!("Item {}", index + 1));

        let units = quantity.ceil() as usize;
        for _ in 0..units {
            items.push(ReceiptItem::new(name.clone(), unit_price));
        }
    }

    Ok(ParsedReceipt {
        items,
        tax: payload.get("tax").and_then(Value::as_f64).unwrap_or(0.0),
        tip: payload.get("tip").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_extraction, normalize_extraction, ExtractError};
    use serde_json::json;

    #[test]
    fn missing_items_array_is_rejected() {
        let err = normalize_extraction(&json!({ "tax": 1.0 })).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidExtraction(_)));

        let err = normalize_extraction(&json!({ "items": "nope" })).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidExtraction(_)));
    }

    #[test]
    fn error_payload_is_surfaced_as_upstream_rejection() {
        let err = decode_extraction(r#"{"error":"Vision OCR failed"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::UpstreamRejected(_)));
    }

    #[test]
    fn non_numeric_fields_degrade_to_zero() {
        let parsed = normalize_extraction(&json!({
            "items": [{ "name": "Soup", "price": "4.50" }],
            "tax": "a lot",
        }))
        .unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].price, 0.0);
        assert_eq!(parsed.tax, 0.0);
    }

    #[test]
    fn blank_names_fall_back_to_positional_label() {
        let parsed = normalize_extraction(&json!({
            "items": [{ "price": 2.0 }, { "name": "  ", "price": 3.0 }],
        }))
        .unwrap();
        assert_eq!(parsed.items[0].name, "Item 1");
        assert_eq!(parsed.items[1].name, "Item 2");
    }
}
