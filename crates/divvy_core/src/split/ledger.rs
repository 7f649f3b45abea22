//! Sequential item assignment across contacts.
//!
//! # Responsibility
//! - Walk contacts one at a time through claiming receipt items.
//! - Keep claimed items out of later contacts' reach.
//! - Hand leftover items to the payer when the walk completes.
//!
//! # Invariants
//! - `advance` is the only state transition; no contact is skipped.
//! - Tax-named lines are never assignable.
//! - After completion every assignable item belongs to exactly one party.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::contact::Contact;
use crate::model::receipt::{is_tax_line, ItemId, ReceiptItem};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Wizard position: one contact at a time, then done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// Claiming items for the contact at this index.
    Assigning(usize),
    /// Every contact has been visited.
    Done,
}

/// Assignment flow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Toggle or advance attempted after the walk completed.
    Complete,
    /// Partition requested before the walk completed.
    Incomplete,
    /// The item is not part of the assignable set.
    UnknownItem(ItemId),
    /// The item was already claimed by an earlier contact.
    ItemUnavailable(ItemId),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complete => write!(f, "assignment is already complete"),
            Self::Incomplete => write!(f, "assignment has not completed yet"),
            Self::UnknownItem(id) => write!(f, "item is not assignable: {id}"),
            Self::ItemUnavailable(id) => write!(f, "item was already claimed: {id}"),
        }
    }
}

impl Error for LedgerError {}

/// Final item partition produced by a completed walk.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPartition {
    /// Contacts with their claimed items.
    pub contacts: Vec<Contact>,
    /// Unclaimed items that stay with the payer.
    pub payer_items: Vec<ReceiptItem>,
}

/// Single-pass assignment wizard over one receipt.
#[derive(Debug, Clone)]
pub struct AssignmentLedger {
    assignable: Vec<ReceiptItem>,
    contacts: Vec<Contact>,
    pooled: BTreeSet<ItemId>,
    state: LedgerState,
}

impl AssignmentLedger {
    /// Starts a walk over the given items and contacts.
    ///
    /// Tax-named lines are dropped from the assignable set up front. Any
    /// claims carried by the provided contacts are cleared; with no
    /// contacts the walk is complete immediately and everything stays
    /// with the payer.
    pub fn new(items: &[ReceiptItem], mut contacts: Vec<Contact>) -> Self {
        let assignable = items
            .iter()
            .filter(|item| !is_tax_line(&item.name))
            .cloned()
            .collect();
        for contact in &mut contacts {
            contact.items.clear();
        }
        let state = if contacts.is_empty() {
            LedgerState::Done
        } else {
            LedgerState::Assigning(0)
        };

        Self {
            assignable,
            contacts,
            pooled: BTreeSet::new(),
            state,
        }
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// The contact currently claiming items, if the walk is active.
    pub fn current_contact(&self) -> Option<&Contact> {
        match self.state {
            LedgerState::Assigning(index) => self.contacts.get(index),
            LedgerState::Done => None,
        }
    }

    /// Items the current contact may still claim or release.
    ///
    /// Earlier contacts' claims are pooled away; the current contact's own
    /// claims stay listed so they can be released again.
    pub fn available_items(&self) -> Vec<&ReceiptItem> {
        self.assignable
            .iter()
            .filter(|item| !self.pooled.contains(&item.id))
            .collect()
    }

    /// Claims or releases one item for the current contact.
    ///
    /// Returns whether the item is claimed after the call, so two calls
    /// with the same ID always restore the starting point.
    ///
    /// # Errors
    /// - `Complete` after the walk finished.
    /// - `UnknownItem` for IDs outside the assignable set.
    /// - `ItemUnavailable` for items pooled by earlier contacts.
    pub fn toggle_item(&mut self, id: ItemId) -> Result<bool, LedgerError> {
        let LedgerState::Assigning(index) = self.state else {
            return Err(LedgerError::Complete);
        };
        let Some(item) = self.assignable.iter().find(|item| item.id == id) else {
            return Err(LedgerError::UnknownItem(id));
        };
        if self.pooled.contains(&id) {
            return Err(LedgerError::ItemUnavailable(id));
        }

        let item = item.clone();
        let contact = &mut self.contacts[index];
        if let Some(position) = contact.items.iter().position(|claimed| claimed.id == id) {
            contact.items.remove(position);
            Ok(false)
        } else {
            contact.items.push(item);
            Ok(true)
        }
    }

    /// Locks the current contact's claims and moves to the next contact.
    ///
    /// After the last contact the walk is done and `partition` becomes
    /// available.
    ///
    /// # Errors
    /// Returns `Complete` when called after the walk finished.
    pub fn advance(&mut self) -> Result<LedgerState, LedgerError> {
        let LedgerState::Assigning(index) = self.state else {
            return Err(LedgerError::Complete);
        };

        for claimed in &self.contacts[index].items {
            self.pooled.insert(claimed.id);
        }
        let next = index + 1;
        self.state = if next >= self.contacts.len() {
            LedgerState::Done
        } else {
            LedgerState::Assigning(next)
        };
        Ok(self.state)
    }

    /// Returns the final partition once the walk is done.
    ///
    /// # Errors
    /// Returns `Incomplete` while contacts are still claiming.
    pub fn partition(&self) -> Result<SplitPartition, LedgerError> {
        if self.state != LedgerState::Done {
            return Err(LedgerError::Incomplete);
        }

        let payer_items = self
            .assignable
            .iter()
            .filter(|item| !self.pooled.contains(&item.id))
            .cloned()
            .collect();
        Ok(SplitPartition {
            contacts: self.contacts.clone(),
            payer_items,
        })
    }
}
