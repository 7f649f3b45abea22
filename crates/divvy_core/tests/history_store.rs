use divvy_core::db::open_db_in_memory;
use divvy_core::repo::history_repo::{
    ContactAssignment, HistoryQuery, HistoryRepository, ReceiptDraft, RepoError,
    SqliteHistoryRepository,
};
use divvy_core::ReceiptItem;
use uuid::Uuid;

#[test]
fn save_then_get_round_trips_items_contacts_and_assignments() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteHistoryRepository::new(&mut conn);

    let burger = ReceiptItem::new("Burger", 9.99);
    let fries = ReceiptItem::new("Fries", 3.50);
    let draft = ReceiptDraft {
        name: Some("Team lunch".to_string()),
        total: 15.69,
        tax: 1.20,
        tip: 1.00,
        created_at_ms: Some(1_756_000_000_000),
        items: vec![burger.clone(), fries.clone()],
        contacts: vec![ContactAssignment {
            name: "Ana".to_string(),
            phone_number: Some("+15550001111".to_string()),
            item_ids: vec![burger.id],
        }],
    };

    let id = repo.save_receipt(&draft).expect("save should succeed");
    let record = repo
        .get_receipt(id)
        .expect("get should succeed")
        .expect("saved receipt should exist");

    assert_eq!(record.name.as_deref(), Some("Team lunch"));
    assert_eq!(record.total, 15.69);
    assert_eq!(record.tax, 1.20);
    assert_eq!(record.tip, 1.00);
    assert_eq!(record.created_at, 1_756_000_000_000);

    let names: Vec<&str> = record.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Burger", "Fries"], "item order must survive");

    assert_eq!(record.contacts.len(), 1);
    let stored_ana = &record.contacts[0];
    assert_eq!(stored_ana.phone_number.as_deref(), Some("+15550001111"));
    // Assignments point at the stored burger row, not the session id.
    assert_eq!(stored_ana.item_ids.len(), 1);
    assert_eq!(stored_ana.item_ids[0], record.items[0].id);
}

#[test]
fn assignments_referencing_unknown_items_are_skipped() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteHistoryRepository::new(&mut conn);

    let burger = ReceiptItem::new("Burger", 9.99);
    let draft = ReceiptDraft {
        name: None,
        total: 9.99,
        tax: 0.0,
        tip: 0.0,
        created_at_ms: Some(1),
        items: vec![burger.clone()],
        contacts: vec![ContactAssignment {
            name: "Ana".to_string(),
            phone_number: None,
            item_ids: vec![burger.id, Uuid::new_v4()],
        }],
    };

    let id = repo.save_receipt(&draft).expect("save should succeed");
    let record = repo.get_receipt(id).unwrap().unwrap();
    assert_eq!(record.contacts[0].item_ids.len(), 1);
    assert_eq!(record.name.as_deref(), Some("Untitled Receipt"));
}

#[test]
fn listing_pages_newest_first_with_has_more() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteHistoryRepository::new(&mut conn);
    for (index, name) in ["first", "second", "third"].iter().enumerate() {
        repo.save_receipt(&named_draft(name, 1_000 + index as i64))
            .expect("save should succeed");
    }

    let first_page = repo
        .list_receipts(&HistoryQuery {
            limit: Some(2),
            offset: 0,
        })
        .expect("list should succeed");
    assert_eq!(first_page.total, 3);
    assert!(first_page.has_more);
    let names: Vec<&str> = first_page
        .receipts
        .iter()
        .map(|record| record.name.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["third", "second"]);

    let second_page = repo
        .list_receipts(&HistoryQuery {
            limit: Some(2),
            offset: 2,
        })
        .expect("list should succeed");
    assert_eq!(second_page.receipts.len(), 1);
    assert!(!second_page.has_more);
    assert_eq!(second_page.receipts[0].name.as_deref(), Some("first"));
}

#[test]
fn listing_an_empty_history_returns_an_empty_page() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteHistoryRepository::new(&mut conn);

    let page = repo
        .list_receipts(&HistoryQuery::default())
        .expect("list should succeed");
    assert_eq!(page.total, 0);
    assert!(page.receipts.is_empty());
    assert!(!page.has_more);
}

#[test]
fn delete_removes_the_receipt_and_all_dependents() {
    let mut conn = open_db_in_memory().unwrap();

    let id = {
        let mut repo = SqliteHistoryRepository::new(&mut conn);
        repo.save_receipt(&named_draft("dinner", 42))
            .expect("save should succeed")
    };

    {
        let mut repo = SqliteHistoryRepository::new(&mut conn);
        repo.delete_receipt(id).expect("delete should succeed");
        assert!(repo.get_receipt(id).unwrap().is_none());

        let err = repo.delete_receipt(id).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    for table in ["receipt_items", "receipt_contacts", "contact_items"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 0, "table {table} should be empty after delete");
    }
}

fn named_draft(name: &str, created_at_ms: i64) -> ReceiptDraft {
    let item = ReceiptItem::new("Burger", 9.99);
    ReceiptDraft {
        name: Some(name.to_string()),
        total: 9.99,
        tax: 0.0,
        tip: 0.0,
        created_at_ms: Some(created_at_ms),
        items: vec![item.clone()],
        contacts: vec![ContactAssignment {
            name: "Ana".to_string(),
            phone_number: None,
            item_ids: vec![item.id],
        }],
    }
}
