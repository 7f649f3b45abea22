//! Tax and tip allocation across everyone at the table.
//!
//! # Responsibility
//! - Compute each person's subtotal, tax share, tip share and total.
//! - Validate that allocated totals add back up to the grand total.
//!
//! # Invariants
//! - Tax is apportioned proportionally to each person's subtotal.
//! - Tip is split evenly across contacts plus the payer (when the payer
//!   kept any items).
//! - Divisions are guarded; a zero subtotal or empty table never raises.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::contact::{Contact, ContactId};
use crate::model::receipt::{is_tax_line, ReceiptItem};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Tolerance for summing person totals back to the grand total.
pub const RECONCILE_EPSILON: f64 = 1e-6;

/// One contact's computed share.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactShare {
    pub contact_id: ContactId,
    pub name: String,
    /// Sum of this contact's claimed item prices.
    pub subtotal: f64,
    /// Proportional slice of the receipt tax.
    pub tax_share: f64,
    /// Even slice of the tip.
    pub tip_share: f64,
    /// Amount this contact owes.
    pub total: f64,
}

/// The payer's computed share over leftover items.
#[derive(Debug, Clone, PartialEq)]
pub struct PayerShare {
    pub subtotal: f64,
    pub tax_share: f64,
    pub tip_share: f64,
    pub total: f64,
}

/// Full allocation result for one receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub contact_shares: Vec<ContactShare>,
    /// Present only when the payer kept any items.
    pub payer_share: Option<PayerShare>,
    /// Meal subtotal across all parties, tax-named lines excluded.
    pub subtotal: f64,
    pub tax: f64,
    pub tip: f64,
    /// `subtotal + tax + tip`.
    pub grand_total: f64,
}

impl Allocation {
    /// Checks that allocated person totals sum back to the grand total.
    ///
    /// # Errors
    /// Returns the expected and allocated sums when they differ by more
    /// than `RECONCILE_EPSILON`.
    pub fn reconcile(&self) -> Result<(), ReconcileError> {
        let allocated = self
            .contact_shares
            .iter()
            .map(|share| share.total)
            .sum::<f64>()
            + self
                .payer_share
                .as_ref()
                .map_or(0.0, |share| share.total);

        if (allocated - self.grand_total).abs() > RECONCILE_EPSILON {
            return Err(ReconcileError {
                expected: self.grand_total,
                allocated,
            });
        }
        Ok(())
    }
}

/// Allocation total mismatch beyond tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileError {
    pub expected: f64,
    pub allocated: f64,
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "allocated totals {:.6} do not reconcile with grand total {:.6}",
            self.allocated, self.expected
        )
    }
}

impl Error for ReconcileError {}

/// Computes every person's share for one assigned receipt.
///
/// Rules:
/// - `tax_rate = tax / subtotal` only when both are positive, else zero.
/// - each person's tax share is their subtotal times the rate.
/// - the tip is split evenly across contacts plus the payer; the payer
///   counts only when holding leftover items.
pub fn allocate(contacts: &[Contact], user_items: &[ReceiptItem], tax: f64, tip: f64) -> Allocation {
    let payer_subtotal = meal_subtotal(user_items);
    let contact_subtotals: Vec<f64> = contacts
        .iter()
        .map(|contact| meal_subtotal(&contact.items))
        .collect();
    let subtotal = contact_subtotals.iter().sum::<f64>() + payer_subtotal;

    let tax_rate = if tax > 0.0 && subtotal > 0.0 {
        tax / subtotal
    } else {
        0.0
    };

    let payer_present = !user_items.is_empty();
    let total_people = contacts.len() + usize::from(payer_present);
    let tip_per_person = if tip > 0.0 && total_people > 0 {
        tip / total_people as f64
    } else {
        0.0
    };

    let contact_shares = contacts
        .iter()
        .zip(contact_subtotals)
        .map(|(contact, person_subtotal)| {
            let tax_share = person_subtotal * tax_rate;
            ContactShare {
                contact_id: contact.id,
                name: contact.name.clone(),
                subtotal: person_subtotal,
                tax_share,
                tip_share: tip_per_person,
                total: person_subtotal + tax_share + tip_per_person,
            }
        })
        .collect();

    let payer_share = payer_present.then(|| {
        let tax_share = payer_subtotal * tax_rate;
        PayerShare {
            subtotal: payer_subtotal,
            tax_share,
            tip_share: tip_per_person,
            total: payer_subtotal + tax_share + tip_per_person,
        }
    });

    Allocation {
        contact_shares,
        payer_share,
        subtotal,
        tax,
        tip,
        grand_total: subtotal + tax + tip,
    }
}

fn meal_subtotal(items: &[ReceiptItem]) -> f64 {
    items
        .iter()
        .filter(|item| !is_tax_line(&item.name))
        .map(|item| item.price)
        .sum()
}
