//! Raw recognized-text normalization.
//!
//! # Responsibility
//! - Turn an OCR text blob into priced line items plus a tax amount.
//! - Keep tokenizing rules in one place so recognition quirks stay local.
//!
//! # Invariants
//! - A line recognized as a tax row sets the tax amount and never becomes
//!   an item.
//! - Lines without a name prefix before the price token are discarded.
//! - When several lines carry a tax amount, the last one wins.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::receipt::ReceiptItem;
use crate::parser::ParsedReceipt;
use once_cell::sync::Lazy;
use regex::Regex;

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\d+[.,]\d{2}").expect("valid price regex"));
static SALES_TAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sales\s*)?tax\b[:\s]*\$?\s*(\d+(?:\.\d{1,2})?)")
        .expect("valid sales tax regex")
});
static TAX_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btax\b[:\s]*\$?\s*(\d+(?:\.\d{1,2})?)").expect("valid tax amount regex")
});
static TAX_PERCENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\btax\b[:\s]*(\d+(?:\.\d{1,2})?)%").expect("valid tax percent regex")
});

/// Normalizes one raw recognized text blob into receipt parts.
///
/// Rules:
/// - Blank lines are skipped.
/// - The first price-looking token (`$` optional, two decimals, `.` or `,`
///   separator) splits a line into name prefix and price.
/// - A decimal comma in the price token is normalized to a dot.
/// - Tax rows are matched by dedicated patterns and consumed as the tax
///   amount instead of an item.
pub fn parse_receipt_text(raw: &str) -> ParsedReceipt {
    let mut items = Vec::new();
    let mut tax = 0.0;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(amount) = match_tax_amount(line) {
            tax = amount;
            continue;
        }

        if let Some(price_match) = PRICE_RE.find(line) {
            let name = line[..price_match.start()].trim();
            if name.is_empty() {
                continue;
            }
            let price = parse_price_token(price_match.as_str());
            items.push(ReceiptItem::new(name, price));
        }
    }

    ParsedReceipt {
        items,
        tax,
        tip: 0.0,
    }
}

/// Returns the tax amount carried by one line, if any.
///
/// Patterns are tried in order; the percent form captures its numeric part
/// as the amount, matching how recognition output was historically read.
fn match_tax_amount(line: &str) -> Option<f64> {
    for pattern in [&*SALES_TAX_RE, &*TAX_AMOUNT_RE, &*TAX_PERCENT_RE] {
        if let Some(captures) = pattern.captures(line) {
            if let Some(value) = captures.get(1) {
                return Some(value.as_str().parse::<f64>().unwrap_or(0.0));
            }
        }
    }
    None
}

fn parse_price_token(token: &str) -> f64 {
    let normalized = token.trim_start_matches('$').replacen(',', ".", 1);
    normalized.parse::<f64>().unwrap_or(0.0)
}
