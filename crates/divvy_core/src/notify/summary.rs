//! Per-contact dues and summary message composition.
//!
//! # Responsibility
//! - Project an allocation into the inputs messaging transports need.
//! - Format the human-readable split summary and per-contact texts.
//!
//! # Invariants
//! - Due amounts are rounded to cents exactly once, at formatting time.
//! - Contacts without a share in the allocation get no due entry.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::contact::{Contact, ContactId};
use crate::model::receipt::round2;
use crate::split::allocation::Allocation;

/// One contact's owed amount plus the details a transport needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactDue {
    pub contact_id: ContactId,
    pub name: String,
    pub phone_number: Option<String>,
    /// Amount owed, unrounded.
    pub amount: f64,
}

/// Joins contacts with their allocated totals.
///
/// Contacts absent from the allocation are skipped; the order follows
/// the allocation's contact shares.
pub fn contact_dues(contacts: &[Contact], allocation: &Allocation) -> Vec<ContactDue> {
    allocation
        .contact_shares
        .iter()
        .filter_map(|share| {
            let contact = contacts
                .iter()
                .find(|contact| contact.id == share.contact_id)?;
            Some(ContactDue {
                contact_id: contact.id,
                name: contact.name.clone(),
                phone_number: contact.phone_number.clone(),
                amount: share.total,
            })
        })
        .collect()
}

/// Formats one amount as dollars and cents.
pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", round2(amount))
}

/// Composes the text sent to one contact.
pub fn due_message(due: &ContactDue, payer: &str, bill_date: &str) -> String {
    format!(
        "Hello! You owe {} for the bill created on {bill_date} by {payer} (from Divvy)",
        format_amount(due.amount)
    )
}

/// Composes one multi-line summary covering the whole table.
///
/// Used by native composers that take a single body plus a recipient
/// list; the payer's own share is appended last when present.
pub fn split_summary(dues: &[ContactDue], allocation: &Allocation, payer: &str) -> String {
    let mut lines = vec![format!("Split of {} (by {payer})", format_amount(allocation.grand_total))];
    for due in dues {
        lines.push(format!("{}: {}", due.name, format_amount(due.amount)));
    }
    if let Some(share) = &allocation.payer_share {
        lines.push(format!("{payer} (payer): {}", format_amount(share.total)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{contact_dues, due_message, format_amount, split_summary};
    use crate::model::contact::Contact;
    use crate::model::receipt::ReceiptItem;
    use crate::split::allocation::allocate;

    fn table() -> (Vec<Contact>, Vec<ReceiptItem>) {
        let mut ana = Contact::new("Ana", Some("+15550001111".to_string()));
        ana.items = vec![ReceiptItem::new("Burger", 10.0)];
        let mut ben = Contact::new("Ben", None);
        ben.items = vec![ReceiptItem::new("Fries", 5.0)];
        let leftovers = vec![ReceiptItem::new("Soda", 5.0)];
        (vec![ana, ben], leftovers)
    }

    #[test]
    fn dues_follow_allocation_shares() {
        let (contacts, leftovers) = table();
        let allocation = allocate(&contacts, &leftovers, 2.0, 3.0);
        let dues = contact_dues(&contacts, &allocation);

        assert_eq!(dues.len(), 2);
        assert_eq!(dues[0].name, "Ana");
        assert_eq!(dues[0].phone_number.as_deref(), Some("+15550001111"));
        // 10 + 10 * (2/20) + 3/3
        assert!((dues[0].amount - 12.0).abs() < 1e-9);
    }

    #[test]
    fn amounts_format_as_dollars_and_cents() {
        assert_eq!(format_amount(12.0), "$12.00");
        assert_eq!(format_amount(3.335), "$3.34");
    }

    #[test]
    fn due_message_names_payer_and_date() {
        let (contacts, leftovers) = table();
        let allocation = allocate(&contacts, &leftovers, 0.0, 0.0);
        let dues = contact_dues(&contacts, &allocation);

        let message = due_message(&dues[0], "Sam", "2026-08-24");
        assert_eq!(
            message,
            "Hello! You owe $10.00 for the bill created on 2026-08-24 by Sam (from Divvy)"
        );
    }

    #[test]
    fn summary_lists_everyone_including_payer() {
        let (contacts, leftovers) = table();
        let allocation = allocate(&contacts, &leftovers, 0.0, 0.0);
        let dues = contact_dues(&contacts, &allocation);

        let summary = split_summary(&dues, &allocation, "Sam");
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Split of $20.00 (by Sam)");
        assert_eq!(lines[1], "Ana: $10.00");
        assert_eq!(lines[3], "Sam (payer): $5.00");
    }
}
