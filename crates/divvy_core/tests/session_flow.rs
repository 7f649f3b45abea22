use divvy_core::extract::service::{
    ExtractionErrorEnvelope, ExtractionRequest, ExtractionResult, ExtractionService,
};
use divvy_core::store::receipt_store::StoreEvent;
use divvy_core::{Contact, LedgerState, ReceiptState, SessionError, SplitSession};
use std::cell::RefCell;
use std::rc::Rc;

struct FixedResponseService {
    body: String,
}

impl ExtractionService for FixedResponseService {
    fn service_id(&self) -> &str {
        "fixed"
    }

    fn extract(&self, _request: &ExtractionRequest) -> ExtractionResult<String> {
        Ok(self.body.clone())
    }
}

struct FailingService;

impl ExtractionService for FailingService {
    fn service_id(&self) -> &str {
        "failing"
    }

    fn extract(&self, _request: &ExtractionRequest) -> ExtractionResult<String> {
        Err(ExtractionErrorEnvelope::new(
            "failing",
            "quota_exceeded",
            "Vision quota exceeded.",
            true,
        ))
    }
}

#[test]
fn extraction_round_populates_the_receipt() {
    let mut session = SplitSession::new();
    let service = FixedResponseService {
        body: r#"{"items":[{"name":"Soda","price":4.0,"quantity":2}],"tax":0.5,"tip":1.0}"#
            .to_string(),
    };

    let state = session
        .run_extraction(&service, &request())
        .expect("current token should land");
    assert!(state.is_populated());

    let receipt = session.receipt().unwrap();
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.tax, 0.5);
    assert_eq!(receipt.tip, 1.0);
}

#[test]
fn adapter_failure_parks_the_session_in_the_failed_state() {
    let mut session = SplitSession::new();

    let state = session
        .run_extraction(&FailingService, &request())
        .expect("current token should land");
    assert!(state.is_failed());
    assert!(session.receipt().is_none());
}

#[test]
fn undecodable_body_fails_without_touching_a_previous_receipt_shape() {
    let mut session = SplitSession::new();
    let service = FixedResponseService {
        body: "not json at all".to_string(),
    };

    let state = session
        .run_extraction(&service, &request())
        .expect("current token should land");
    assert!(matches!(state, ReceiptState::Failed { .. }));
}

#[test]
fn stale_extraction_tokens_are_discarded() {
    let mut session = SplitSession::new();
    let stale = session.begin_extraction();
    let _current = session.begin_extraction();

    let err = session
        .apply_extraction(stale, r#"{"items":[]}"#)
        .unwrap_err();
    assert!(matches!(err, SessionError::StaleExtraction { .. }));
    assert!(matches!(session.state(), ReceiptState::Empty));
}

#[test]
fn reset_invalidates_outstanding_tokens() {
    let mut session = SplitSession::new();
    let token = session.begin_extraction();
    session.reset();

    let err = session
        .apply_extraction(token, r#"{"items":[]}"#)
        .unwrap_err();
    assert!(matches!(err, SessionError::StaleExtraction { .. }));
}

#[test]
fn full_flow_from_text_to_allocation_reconciles() {
    let mut session = SplitSession::new();
    session
        .apply_text("Burger 9.99\nFries 3.50\nTax 1.20")
        .expect("receipt text should parse");
    session.set_contacts(vec![Contact::new("Ana", None)]);

    assert_eq!(session.start_assignment().unwrap(), LedgerState::Assigning(0));
    let first = session.available_items().unwrap()[0].id;
    session.toggle_item(first).expect("item should be claimable");
    assert_eq!(session.advance().unwrap(), LedgerState::Done);

    let receipt = session.receipt().unwrap();
    assert_eq!(receipt.user_items.len(), 1, "fries stay with the payer");
    assert_eq!(session.contacts()[0].items.len(), 1);

    let allocation = session.allocate().expect("allocation should compute");
    allocation.reconcile().expect("totals should reconcile");
    assert_eq!(allocation.tax, 1.20);
}

#[test]
fn assignment_before_populating_a_receipt_is_rejected() {
    let mut session = SplitSession::new();
    session.set_contacts(vec![Contact::new("Ana", None)]);

    let err = session.start_assignment().unwrap_err();
    assert!(matches!(err, SessionError::Store(_)));
}

#[test]
fn toggling_without_an_active_walk_is_rejected() {
    let mut session = SplitSession::new();
    session.apply_text("Burger 9.99").expect("text should parse");
    let id = session.receipt().unwrap().items[0].id;

    let err = session.toggle_item(id).unwrap_err();
    assert!(matches!(err, SessionError::NoAssignment));
}

#[test]
fn history_draft_carries_assignments_and_grand_total() {
    let mut session = SplitSession::new();
    session
        .apply_text("Burger 10.00\nFries 5.00\nTax 1.50")
        .expect("receipt text should parse");
    session.set_contacts(vec![Contact::new("Ana", Some("+15550001111".to_string()))]);
    session.start_assignment().expect("walk should start");
    let first = session.available_items().unwrap()[0].id;
    session.toggle_item(first).expect("item should be claimable");
    session.advance().expect("walk should complete");

    let draft = session
        .history_draft(Some("Team lunch".to_string()))
        .expect("draft should assemble");
    assert_eq!(draft.name.as_deref(), Some("Team lunch"));
    assert_eq!(draft.tax, 1.50);
    assert_eq!(draft.items.len(), 2);
    assert_eq!(draft.contacts.len(), 1);
    assert_eq!(draft.contacts[0].item_ids, vec![first]);
    assert!((draft.total - 16.50).abs() < 1e-6);
}

#[test]
fn store_subscribers_observe_session_mutations() {
    let events: Rc<RefCell<Vec<StoreEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);

    let mut session = SplitSession::new();
    let subscription = session.subscribe(Box::new(move |event| {
        sink.borrow_mut().push(event.clone());
    }));

    session.apply_text("Burger 9.99").expect("text should parse");
    let id = session.receipt().unwrap().items[0].id;
    session.reprice_item(id, 8.99).expect("reprice should apply");

    {
        let seen = events.borrow();
        assert_eq!(seen[0], StoreEvent::Populated);
        assert_eq!(seen[1], StoreEvent::ItemUpdated(id));
    }

    assert!(session.unsubscribe(subscription));
    session.reprice_item(id, 7.99).expect("reprice should apply");
    assert_eq!(events.borrow().len(), 2, "dropped subscriber stays quiet");
}

fn request() -> ExtractionRequest {
    ExtractionRequest::new("data:image/png;base64,AAAA").expect("fixture request should validate")
}
