//! Receipt normalization entry points.
//!
//! # Responsibility
//! - Convert recognized text blobs and structured extraction payloads into
//!   one canonical receipt shape.
//! - Keep upstream format quirks out of store/split logic.
//!
//! # Invariants
//! - Both parsing modes yield the same `ParsedReceipt` shape.
//! - Missing tax/tip values default to zero, never to an error.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::receipt::ReceiptItem;

pub mod extraction;
pub mod text;

/// Canonical output of both parsing modes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReceipt {
    /// Normalized line items, one per billable unit.
    pub items: Vec<ReceiptItem>,
    /// Tax amount, zero when the source carried none.
    pub tax: f64,
    /// Tip amount, zero when the source carried none.
    pub tip: f64,
}
