//! Split session orchestration.
//!
//! # Responsibility
//! - Own the receipt store, edit history, contact selection and
//!   assignment walk for one bill.
//! - Gate extraction results behind a generation token so stale
//!   responses can never land.
//!
//! # Invariants
//! - All mutation flows through this facade; collaborators never share
//!   state behind its back.
//! - Every edit pairs a store mutation with exactly one change record.
//! - A token issued before a reset or a newer capture is rejected.
//!
//! This type is single-owner by design; embedders needing cross-thread
//! access wrap it in their own lock.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::extract::service::{ExtractionErrorEnvelope, ExtractionRequest, ExtractionService};
use crate::model::contact::Contact;
use crate::model::receipt::{ItemId, Receipt, ReceiptItem, ReceiptState};
use crate::parser::extraction::decode_extraction;
use crate::parser::text::parse_receipt_text;
use crate::repo::history_repo::{ContactAssignment, ReceiptDraft};
use crate::split::allocation::{allocate, Allocation};
use crate::split::ledger::{AssignmentLedger, LedgerError, LedgerState};
use crate::store::change_stack::{Change, ChangeStack};
use crate::store::receipt_store::{ReceiptStore, StoreError, StoreEvent};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Capture generation handle issued by `begin_extraction`.
///
/// Only the newest token can land a result; older ones are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Session orchestration errors.
#[derive(Debug)]
pub enum SessionError {
    Store(StoreError),
    Ledger(LedgerError),
    /// Extraction result carried an outdated generation token.
    StaleExtraction { token: u64, generation: u64 },
    /// Edit referenced an item the receipt does not hold.
    UnknownItem(ItemId),
    /// Assignment operation without a started walk.
    NoAssignment,
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
            Self::StaleExtraction { token, generation } => write!(
                f,
                "extraction result for generation {token} discarded; session is at {generation}"
            ),
            Self::UnknownItem(id) => write!(f, "item not found: {id}"),
            Self::NoAssignment => write!(f, "assignment has not been started"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<LedgerError> for SessionError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

/// State-owning facade for one bill-splitting session.
#[derive(Default)]
pub struct SplitSession {
    store: ReceiptStore,
    changes: ChangeStack,
    contacts: Vec<Contact>,
    ledger: Option<AssignmentLedger>,
    generation: u64,
}

impl SplitSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReceiptState {
        self.store.state()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.store.receipt()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn change_stack(&self) -> &ChangeStack {
        &self.changes
    }

    /// Registers one store observer; see `ReceiptStore::subscribe`.
    pub fn subscribe(&mut self, subscriber: Box<dyn Fn(&StoreEvent)>) -> usize {
        self.store.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, subscription: usize) -> bool {
        self.store.unsubscribe(subscription)
    }

    /// Starts a new capture generation and returns its token.
    ///
    /// Outstanding tokens from earlier captures become stale.
    pub fn begin_extraction(&mut self) -> SessionToken {
        self.generation += 1;
        info!(
            "event=extraction_begin module=session generation={}",
            self.generation
        );
        SessionToken(self.generation)
    }

    /// Applies one raw extraction response body for the given token.
    ///
    /// A decodable payload populates the receipt; a decode failure or an
    /// upstream error payload parks the session in the failed state. In
    /// both cases the resulting state is returned.
    ///
    /// # Errors
    /// Returns `StaleExtraction` when a newer capture or a reset has
    /// superseded the token; the current state is left untouched.
    pub fn apply_extraction(
        &mut self,
        token: SessionToken,
        raw_body: &str,
    ) -> Result<&ReceiptState, SessionError> {
        self.ensure_current(token)?;

        match decode_extraction(raw_body) {
            Ok(parsed) => {
                let item_count = parsed.items.len();
                match self.store.populate(parsed) {
                    Ok(()) => {
                        self.changes.clear();
                        self.ledger = None;
                        info!(
                            "event=extraction_apply module=session status=ok generation={} items={}",
                            self.generation, item_count
                        );
                    }
                    Err(err) => {
                        warn!(
                            "event=extraction_apply module=session status=error generation={} error={err}",
                            self.generation
                        );
                        self.store.fail(err.to_string());
                    }
                }
            }
            Err(err) => {
                warn!(
                    "event=extraction_apply module=session status=error generation={} error={err}",
                    self.generation
                );
                self.store.fail(err.to_string());
            }
        }

        Ok(self.store.state())
    }

    /// Records one adapter failure for the given token.
    ///
    /// # Errors
    /// Returns `StaleExtraction` for superseded tokens.
    pub fn fail_extraction(
        &mut self,
        token: SessionToken,
        envelope: &ExtractionErrorEnvelope,
    ) -> Result<&ReceiptState, SessionError> {
        self.ensure_current(token)?;

        warn!(
            "event=extraction_apply module=session status=error generation={} service={} code={} retryable={}",
            self.generation, envelope.service, envelope.code, envelope.retryable
        );
        self.store.fail(envelope.message.clone());
        Ok(self.store.state())
    }

    /// Runs one full capture round against an extraction adapter.
    pub fn run_extraction(
        &mut self,
        service: &dyn ExtractionService,
        request: &ExtractionRequest,
    ) -> Result<&ReceiptState, SessionError> {
        let token = self.begin_extraction();
        match service.extract(request) {
            Ok(raw_body) => self.apply_extraction(token, &raw_body),
            Err(envelope) => self.fail_extraction(token, &envelope),
        }
    }

    /// Populates the receipt from a raw recognized text blob.
    ///
    /// Starts a new generation, so outstanding extraction tokens become
    /// stale.
    pub fn apply_text(&mut self, raw_text: &str) -> Result<&ReceiptState, SessionError> {
        self.generation += 1;
        let parsed = parse_receipt_text(raw_text);
        let item_count = parsed.items.len();
        self.store.populate(parsed)?;
        self.changes.clear();
        self.ledger = None;
        info!(
            "event=text_parse module=session status=ok generation={} items={}",
            self.generation, item_count
        );
        Ok(self.store.state())
    }

    /// Returns the session to its initial state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.store.clear();
        self.changes.clear();
        self.contacts.clear();
        self.ledger = None;
    }

    /// Renames one item, recording the previous name for undo.
    ///
    /// Renaming to the current name records nothing.
    pub fn rename_item(
        &mut self,
        id: ItemId,
        new_name: impl Into<String>,
    ) -> Result<(), SessionError> {
        let new_name = new_name.into();
        let current = self
            .store
            .find_item(id)
            .cloned()
            .ok_or(SessionError::UnknownItem(id))?;
        if current.name == new_name {
            return Ok(());
        }

        let previous = current.name.clone();
        let mut updated = current;
        updated.name = new_name;
        self.store.update_item(updated)?;
        self.changes.push(Change::EditName { id, previous });
        Ok(())
    }

    /// Reprices one item, recording the previous price for undo.
    pub fn reprice_item(&mut self, id: ItemId, new_price: f64) -> Result<(), SessionError> {
        let current = self
            .store
            .find_item(id)
            .cloned()
            .ok_or(SessionError::UnknownItem(id))?;
        if current.price == new_price {
            return Ok(());
        }

        let previous = current.price;
        let mut updated = current;
        updated.price = new_price;
        self.store.update_item(updated)?;
        self.changes.push(Change::EditPrice { id, previous });
        Ok(())
    }

    /// Adds one manually entered item and records the addition.
    pub fn add_item(
        &mut self,
        name: impl Into<String>,
        price: f64,
    ) -> Result<ItemId, SessionError> {
        let item = ReceiptItem::new(name, price);
        let id = item.id;
        self.store.add_item(item)?;
        self.changes.push(Change::Add { id });
        Ok(id)
    }

    /// Deletes one item, recording its snapshot for undo.
    pub fn delete_item(&mut self, id: ItemId) -> Result<(), SessionError> {
        let snapshot = self
            .store
            .find_item(id)
            .cloned()
            .ok_or(SessionError::UnknownItem(id))?;
        self.store.remove_item(id)?;
        self.changes.push(Change::Delete { item: snapshot });
        Ok(())
    }

    /// Reverts the most recent change; `None` when nothing is recorded.
    pub fn undo(&mut self) -> Result<Option<Change>, SessionError> {
        Ok(self.changes.undo(&mut self.store)?)
    }

    /// Drops all recorded changes, typically at edit-screen exit.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Replaces the selected contacts and discards any assignment walk.
    pub fn set_contacts(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
        self.ledger = None;
    }

    /// Starts the assignment walk over the current receipt and contacts.
    ///
    /// With no contacts selected the walk completes immediately and every
    /// item stays with the payer.
    pub fn start_assignment(&mut self) -> Result<LedgerState, SessionError> {
        let receipt = self
            .store
            .receipt()
            .ok_or(SessionError::Store(StoreError::NotPopulated))?;
        let ledger = AssignmentLedger::new(&receipt.items, self.contacts.clone());
        let state = ledger.state();
        self.ledger = Some(ledger);
        if state == LedgerState::Done {
            self.finalize_partition()?;
        }
        Ok(state)
    }

    pub fn ledger_state(&self) -> Option<LedgerState> {
        self.ledger.as_ref().map(AssignmentLedger::state)
    }

    /// The contact currently claiming items, if a walk is active.
    pub fn current_contact(&self) -> Option<&Contact> {
        self.ledger.as_ref()?.current_contact()
    }

    /// Items the current contact may claim or release.
    pub fn available_items(&self) -> Result<Vec<&ReceiptItem>, SessionError> {
        let ledger = self.ledger.as_ref().ok_or(SessionError::NoAssignment)?;
        Ok(ledger.available_items())
    }

    /// Claims or releases one item for the current contact.
    pub fn toggle_item(&mut self, id: ItemId) -> Result<bool, SessionError> {
        let ledger = self.ledger.as_mut().ok_or(SessionError::NoAssignment)?;
        Ok(ledger.toggle_item(id)?)
    }

    /// Locks the current contact's claims and moves on.
    ///
    /// Completing the walk writes claims back to the selected contacts and
    /// hands leftover items to the payer.
    pub fn advance(&mut self) -> Result<LedgerState, SessionError> {
        let ledger = self.ledger.as_mut().ok_or(SessionError::NoAssignment)?;
        let state = ledger.advance()?;
        if state == LedgerState::Done {
            self.finalize_partition()?;
        }
        Ok(state)
    }

    /// Computes every person's share from the current partition.
    pub fn allocate(&self) -> Result<Allocation, SessionError> {
        let receipt = self
            .store
            .receipt()
            .ok_or(SessionError::Store(StoreError::NotPopulated))?;
        Ok(allocate(
            &self.contacts,
            &receipt.user_items,
            receipt.tax,
            receipt.tip,
        ))
    }

    /// Assembles a persistable draft of the current session.
    pub fn history_draft(&self, name: Option<String>) -> Result<ReceiptDraft, SessionError> {
        let receipt = self
            .store
            .receipt()
            .ok_or(SessionError::Store(StoreError::NotPopulated))?;
        let allocation = self.allocate()?;

        Ok(ReceiptDraft {
            name,
            total: allocation.grand_total,
            tax: receipt.tax,
            tip: receipt.tip,
            created_at_ms: None,
            items: receipt.items.clone(),
            contacts: self
                .contacts
                .iter()
                .map(|contact| ContactAssignment {
                    name: contact.name.clone(),
                    phone_number: contact.phone_number.clone(),
                    item_ids: contact.items.iter().map(|item| item.id).collect(),
                })
                .collect(),
        })
    }

    fn ensure_current(&self, token: SessionToken) -> Result<(), SessionError> {
        if token.0 != self.generation {
            info!(
                "event=extraction_discard module=session status=stale token={} generation={}",
                token.0, self.generation
            );
            return Err(SessionError::StaleExtraction {
                token: token.0,
                generation: self.generation,
            });
        }
        Ok(())
    }

    fn finalize_partition(&mut self) -> Result<(), SessionError> {
        let Some(ledger) = self.ledger.as_ref() else {
            return Err(SessionError::NoAssignment);
        };
        let partition = ledger.partition()?;
        self.store.set_user_items(partition.payer_items)?;
        self.contacts = partition.contacts;
        info!(
            "event=assignment_complete module=session contacts={} payer_items={}",
            self.contacts.len(),
            self.store
                .receipt()
                .map_or(0, |receipt| receipt.user_items.len())
        );
        Ok(())
    }
}
