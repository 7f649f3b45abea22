use divvy_core::parser::extraction::{decode_extraction, normalize_extraction, ExtractError};
use divvy_core::parser::text::parse_receipt_text;
use serde_json::json;
use std::collections::BTreeSet;

#[test]
fn raw_text_yields_items_and_tax() {
    let parsed = parse_receipt_text("Burger 9.99\nFries 3.50\nTax 1.20");

    let names: Vec<&str> = parsed.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Burger", "Fries"]);
    assert_eq!(parsed.items[0].price, 9.99);
    assert_eq!(parsed.items[1].price, 3.50);
    assert_eq!(parsed.tax, 1.20);
    assert_eq!(parsed.tip, 0.0);
}

#[test]
fn raw_text_last_tax_line_wins_and_never_becomes_an_item() {
    let parsed = parse_receipt_text("Sales Tax $0.90\nBurger 9.99\nTax 1.20");

    assert_eq!(parsed.tax, 1.20);
    assert_eq!(parsed.items.len(), 1);
    assert_eq!(parsed.items[0].name, "Burger");
}

#[test]
fn raw_text_handles_dollar_signs_and_decimal_commas() {
    let parsed = parse_receipt_text("Schnitzel 12,50\nCola $2.25");

    assert_eq!(parsed.items[0].price, 12.50);
    assert_eq!(parsed.items[1].price, 2.25);
}

#[test]
fn raw_text_skips_blank_lines_and_lines_without_price() {
    let parsed = parse_receipt_text("\n  \nThank you for visiting\nBurger 9.99\n");

    assert_eq!(parsed.items.len(), 1);
    assert_eq!(parsed.items[0].name, "Burger");
}

#[test]
fn structured_quantity_line_expands_into_units_with_distinct_ids() {
    let parsed = normalize_extraction(&json!({
        "items": [{ "name": "Soda", "price": 4.00, "quantity": 2 }],
    }))
    .unwrap();

    assert_eq!(parsed.items.len(), 2);
    for item in &parsed.items {
        assert_eq!(item.name, "Soda");
        assert_eq!(item.price, 2.00);
    }
    let ids: BTreeSet<_> = parsed.items.iter().map(|item| item.id).collect();
    assert_eq!(ids.len(), 2, "each unit must carry its own id");
}

#[test]
fn structured_unit_price_is_rounded_to_cents() {
    let parsed = normalize_extraction(&json!({
        "items": [{ "name": "Dumplings", "price": 10.00, "quantity": 3 }],
    }))
    .unwrap();

    assert_eq!(parsed.items.len(), 3);
    assert_eq!(parsed.items[0].price, 3.33);
}

#[test]
fn structured_defaults_quantity_tax_and_tip() {
    let parsed = normalize_extraction(&json!({
        "items": [{ "name": "Pad Thai", "price": 11.50, "quantity": -2 }],
    }))
    .unwrap();

    assert_eq!(parsed.items.len(), 1, "non-positive quantity falls back to 1");
    assert_eq!(parsed.tax, 0.0);
    assert_eq!(parsed.tip, 0.0);
}

#[test]
fn structured_without_items_array_is_a_hard_failure() {
    let missing = decode_extraction(r#"{"tax": 2.0, "tip": 1.0}"#).unwrap_err();
    assert!(matches!(missing, ExtractError::InvalidExtraction(_)));

    let wrong_shape = decode_extraction(r#"{"items": {"name": "x"}}"#).unwrap_err();
    assert!(matches!(wrong_shape, ExtractError::InvalidExtraction(_)));
}

#[test]
fn upstream_error_payload_is_not_coerced_into_a_receipt() {
    let err = decode_extraction(r#"{"error": "quota exceeded"}"#).unwrap_err();
    assert!(matches!(err, ExtractError::UpstreamRejected(_)));
}

#[test]
fn both_modes_generate_unique_item_ids() {
    let text_parsed = parse_receipt_text("Burger 9.99\nFries 3.50");
    let structured = normalize_extraction(&json!({
        "items": [{ "name": "Soda", "price": 4.00, "quantity": 2 }],
    }))
    .unwrap();

    let ids: BTreeSet<_> = text_parsed
        .items
        .iter()
        .chain(structured.items.iter())
        .map(|item| item.id)
        .collect();
    assert_eq!(ids.len(), text_parsed.items.len() + structured.items.len());
}
