//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `divvy_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use divvy_core::{default_log_level, init_logging, logging_status, Contact, SplitSession};

fn main() {
    let log_dir = std::env::temp_dir().join("divvy-cli-logs");
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }
    if let Some((level, dir)) = logging_status() {
        println!("divvy_core logging level={level} dir={}", dir.display());
    }

    println!("divvy_core ping={}", divvy_core::ping());
    println!("divvy_core version={}", divvy_core::core_version());

    // One parse -> assign -> allocate round over a fixed receipt.
    let mut session = SplitSession::new();
    session
        .apply_text("Burger 9.99\nFries 3.50\nTax 1.20")
        .expect("fixed receipt text should parse");
    session.set_contacts(vec![Contact::new("Ana", None)]);
    session
        .start_assignment()
        .expect("assignment should start over a populated receipt");
    let item_id = session
        .available_items()
        .expect("assignment walk should be active")
        .first()
        .map(|item| item.id)
        .expect("parsed receipt should have items");
    session
        .toggle_item(item_id)
        .expect("first item should be claimable");
    session.advance().expect("single contact walk should finish");

    let allocation = session.allocate().expect("allocation should compute");
    allocation
        .reconcile()
        .expect("allocated totals should reconcile");
    println!(
        "divvy_core smoke subtotal={:.2} grand_total={:.2} contacts={}",
        allocation.subtotal,
        allocation.grand_total,
        allocation.contact_shares.len()
    );
}
