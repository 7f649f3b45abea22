//! Receipt domain model.
//!
//! # Responsibility
//! - Define the canonical priced line item shared by parsing, editing and
//!   splitting flows.
//! - Represent the receipt lifecycle as an explicit tagged state.
//!
//! # Invariants
//! - `id` is stable and never reused for another item within a session.
//! - Item prices are finite and non-negative.
//! - The receipt grand total is always derived, never stored.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for one receipt line item.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = Uuid;

/// Validation failures for receipt item fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptValidationError {
    /// Item name is empty after trimming.
    BlankName,
    /// Item price is negative.
    NegativePrice(f64),
    /// Item price is NaN or infinite.
    NonFinitePrice,
    /// Receipt-level tax amount is negative or non-finite.
    InvalidTax(f64),
    /// Receipt-level tip amount is negative or non-finite.
    InvalidTip(f64),
}

impl Display for ReceiptValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "item name cannot be blank"),
            Self::NegativePrice(value) => write!(f, "item price cannot be negative: {value}"),
            Self::NonFinitePrice => write!(f, "item price must be a finite number"),
            Self::InvalidTax(value) => write!(f, "tax must be a finite non-negative number: {value}"),
            Self::InvalidTip(value) => write!(f, "tip must be a finite non-negative number: {value}"),
        }
    }
}

impl Error for ReceiptValidationError {}

/// One priced line on a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// Stable ID used for assignment and undo bookkeeping.
    pub id: ItemId,
    /// Display name as recognized or entered.
    pub name: String,
    /// Unit price in currency units.
    pub price: f64,
}

impl ReceiptItem {
    /// Creates a new item with a generated stable ID.
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self::with_id(Uuid::new_v4(), name, price)
    }

    /// Creates an item with a caller-provided stable ID.
    ///
    /// Used by undo restore paths where identity already exists.
    pub fn with_id(id: ItemId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }

    /// Checks name/price field rules.
    ///
    /// # Errors
    /// - `BlankName` when the trimmed name is empty.
    /// - `NonFinitePrice` when the price is NaN or infinite.
    /// - `NegativePrice` when the price is below zero.
    pub fn validate(&self) -> Result<(), ReceiptValidationError> {
        if self.name.trim().is_empty() {
            return Err(ReceiptValidationError::BlankName);
        }
        if !self.price.is_finite() {
            return Err(ReceiptValidationError::NonFinitePrice);
        }
        if self.price < 0.0 {
            return Err(ReceiptValidationError::NegativePrice(self.price));
        }
        Ok(())
    }
}

/// Canonical receipt content after normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Assignable line items.
    pub items: Vec<ReceiptItem>,
    /// Receipt-level tax amount.
    pub tax: f64,
    /// Receipt-level tip amount.
    pub tip: f64,
    /// Items that stayed with the payer after assignment.
    pub user_items: Vec<ReceiptItem>,
}

impl Receipt {
    /// Creates a receipt from normalized parts with empty payer items.
    pub fn new(items: Vec<ReceiptItem>, tax: f64, tip: f64) -> Self {
        Self {
            items,
            tax,
            tip,
            user_items: Vec::new(),
        }
    }

    /// Sum of all item prices, payer items excluded.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.price).sum()
    }

    /// Validates all items plus the tax/tip scalars.
    pub fn validate(&self) -> Result<(), ReceiptValidationError> {
        for item in self.items.iter().chain(self.user_items.iter()) {
            item.validate()?;
        }
        if !self.tax.is_finite() || self.tax < 0.0 {
            return Err(ReceiptValidationError::InvalidTax(self.tax));
        }
        if !self.tip.is_finite() || self.tip < 0.0 {
            return Err(ReceiptValidationError::InvalidTip(self.tip));
        }
        Ok(())
    }
}

/// Receipt lifecycle state.
///
/// Keeps "no receipt yet", "usable receipt" and "recognition failed" as
/// distinct variants so callers cannot confuse them by inspecting field
/// shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ReceiptState {
    /// No capture has produced data yet.
    #[default]
    Empty,
    /// A capture produced a usable receipt.
    Populated(Receipt),
    /// The most recent capture failed.
    Failed {
        /// Human-readable failure summary.
        message: String,
    },
}

impl ReceiptState {
    /// Returns the populated receipt, if any.
    pub fn receipt(&self) -> Option<&Receipt> {
        match self {
            Self::Populated(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn is_populated(&self) -> bool {
        matches!(self, Self::Populated(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Rounds a currency amount to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Returns whether an item name denotes a tax line rather than food.
///
/// Recognized text can carry the tax row through as a named item; such
/// lines must never be assignable or counted into the meal subtotal.
pub fn is_tax_line(name: &str) -> bool {
    name.to_lowercase().contains("tax")
}

#[cfg(test)]
mod tests {
    use super::{is_tax_line, round2, ReceiptItem, ReceiptValidationError};

    #[test]
    fn validate_rejects_blank_name_and_bad_prices() {
        let blank = ReceiptItem::new("   ", 1.0);
        assert!(matches!(
            blank.validate(),
            Err(ReceiptValidationError::BlankName)
        ));

        let negative = ReceiptItem::new("Burger", -0.5);
        assert!(matches!(
            negative.validate(),
            Err(ReceiptValidationError::NegativePrice(_))
        ));

        let non_finite = ReceiptItem::new("Burger", f64::NAN);
        assert!(matches!(
            non_finite.validate(),
            Err(ReceiptValidationError::NonFinitePrice)
        ));

        assert!(ReceiptItem::new("Burger", 9.99).validate().is_ok());
    }

    #[test]
    fn round2_rounds_to_cents() {
        assert_eq!(round2(10.005), 10.01);
        assert_eq!(round2(3.333_333), 3.33);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn tax_lines_are_detected_case_insensitively() {
        assert!(is_tax_line("Tax"));
        assert!(is_tax_line("SALES TAX"));
        assert!(is_tax_line("tax 8.25%"));
        assert!(!is_tax_line("Taco"));
    }
}
