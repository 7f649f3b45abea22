use divvy_core::split::ledger::{AssignmentLedger, LedgerError, LedgerState};
use divvy_core::{Contact, ReceiptItem};
use std::collections::BTreeSet;

#[test]
fn toggling_the_same_item_twice_restores_the_starting_point() {
    let items = vec![ReceiptItem::new("Burger", 9.99)];
    let id = items[0].id;
    let mut ledger = AssignmentLedger::new(&items, vec![Contact::new("Ana", None)]);

    assert!(ledger.toggle_item(id).expect("first toggle should claim"));
    assert!(!ledger.toggle_item(id).expect("second toggle should release"));
    assert!(ledger.contacts()[0].items.is_empty());
}

#[test]
fn advance_is_the_only_transition_and_visits_every_contact() {
    let items = vec![
        ReceiptItem::new("Burger", 9.99),
        ReceiptItem::new("Fries", 3.50),
    ];
    let contacts = vec![Contact::new("Ana", None), Contact::new("Ben", None)];
    let mut ledger = AssignmentLedger::new(&items, contacts);

    assert_eq!(ledger.state(), LedgerState::Assigning(0));
    assert_eq!(ledger.current_contact().unwrap().name, "Ana");

    assert_eq!(ledger.advance().unwrap(), LedgerState::Assigning(1));
    assert_eq!(ledger.current_contact().unwrap().name, "Ben");

    assert_eq!(ledger.advance().unwrap(), LedgerState::Done);
    assert!(ledger.current_contact().is_none());

    let err = ledger.advance().unwrap_err();
    assert_eq!(err, LedgerError::Complete);
}

#[test]
fn finished_walk_rejects_late_toggles() {
    let items = vec![
        ReceiptItem::new("Burger", 9.99),
        ReceiptItem::new("Fries", 3.50),
    ];
    let fries_id = items[1].id;
    let mut ledger = AssignmentLedger::new(&items, vec![Contact::new("Ana", None)]);

    ledger.toggle_item(items[0].id).expect("Ana claims the burger");
    assert_eq!(ledger.advance().unwrap(), LedgerState::Done);

    let err = ledger.toggle_item(fries_id).unwrap_err();
    assert_eq!(err, LedgerError::Complete);
    assert_eq!(
        ledger.contacts()[0].items.len(),
        1,
        "assignments must not move after the walk ends"
    );
}

#[test]
fn claimed_items_are_unavailable_to_later_contacts() {
    let items = vec![
        ReceiptItem::new("Burger", 9.99),
        ReceiptItem::new("Fries", 3.50),
    ];
    let burger_id = items[0].id;
    let contacts = vec![Contact::new("Ana", None), Contact::new("Ben", None)];
    let mut ledger = AssignmentLedger::new(&items, contacts);

    ledger.toggle_item(burger_id).expect("Ana should claim the burger");
    ledger.advance().expect("walk should move to Ben");

    let available: Vec<&str> = ledger
        .available_items()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    assert_eq!(available, vec!["Fries"]);

    let err = ledger.toggle_item(burger_id).unwrap_err();
    assert_eq!(err, LedgerError::ItemUnavailable(burger_id));
}

#[test]
fn completed_walk_partitions_every_item_exactly_once() {
    let items = vec![
        ReceiptItem::new("Burger", 9.99),
        ReceiptItem::new("Fries", 3.50),
        ReceiptItem::new("Soda", 2.00),
        ReceiptItem::new("Pie", 4.75),
    ];
    let contacts = vec![Contact::new("Ana", None), Contact::new("Ben", None)];
    let mut ledger = AssignmentLedger::new(&items, contacts);

    ledger.toggle_item(items[0].id).expect("Ana claims the burger");
    ledger.advance().expect("walk should move to Ben");
    ledger.toggle_item(items[1].id).expect("Ben claims the fries");
    ledger.toggle_item(items[2].id).expect("Ben claims the soda");
    ledger.advance().expect("walk should complete");

    let partition = ledger.partition().expect("partition should be ready");
    let mut seen = BTreeSet::new();
    for contact in &partition.contacts {
        for item in &contact.items {
            assert!(seen.insert(item.id), "item assigned twice: {}", item.name);
        }
    }
    for item in &partition.payer_items {
        assert!(seen.insert(item.id), "payer item also assigned: {}", item.name);
    }
    assert_eq!(seen.len(), items.len(), "every item must land somewhere");
    assert_eq!(partition.payer_items[0].name, "Pie");
}

#[test]
fn partition_is_unavailable_while_contacts_are_still_claiming() {
    let items = vec![ReceiptItem::new("Burger", 9.99)];
    let ledger = AssignmentLedger::new(&items, vec![Contact::new("Ana", None)]);

    let err = ledger.partition().unwrap_err();
    assert_eq!(err, LedgerError::Incomplete);
}

#[test]
fn unknown_items_are_rejected_on_toggle() {
    let items = vec![ReceiptItem::new("Burger", 9.99)];
    let mut ledger = AssignmentLedger::new(&items, vec![Contact::new("Ana", None)]);

    let stray = ReceiptItem::new("Ghost", 1.00);
    let err = ledger.toggle_item(stray.id).unwrap_err();
    assert_eq!(err, LedgerError::UnknownItem(stray.id));
}
