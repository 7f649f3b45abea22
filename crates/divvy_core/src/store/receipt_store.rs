//! Receipt store with explicit mutation API and observers.
//!
//! # Responsibility
//! - Own the receipt lifecycle state for one split session.
//! - Apply item mutations through a defined API instead of shared state.
//! - Notify subscribers after every applied mutation.
//!
//! # Invariants
//! - Item IDs are unique across `items` and `user_items`.
//! - Item mutations are rejected while no receipt is populated.
//! - Observers are notified only after a mutation actually changed state.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::receipt::{
    ItemId, Receipt, ReceiptItem, ReceiptState, ReceiptValidationError,
};
use crate::parser::ParsedReceipt;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store mutation errors.
#[derive(Debug)]
pub enum StoreError {
    /// Item mutation attempted while no receipt is populated.
    NotPopulated,
    /// An item with the same ID already exists.
    DuplicateItemId(ItemId),
    /// Item or receipt field validation failed.
    Validation(ReceiptValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPopulated => write!(f, "no receipt is populated"),
            Self::DuplicateItemId(id) => write!(f, "item id already present: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReceiptValidationError> for StoreError {
    fn from(value: ReceiptValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Mutation notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A capture produced a usable receipt.
    Populated,
    /// A capture failed and the state now carries the failure.
    Failed,
    /// The store returned to the empty state.
    Cleared,
    ItemAdded(ItemId),
    ItemUpdated(ItemId),
    ItemRemoved(ItemId),
    /// The payer's leftover items were replaced wholesale.
    UserItemsReplaced,
}

type Subscriber = Box<dyn Fn(&StoreEvent)>;

/// State-owning receipt store for one session.
#[derive(Default)]
pub struct ReceiptStore {
    state: ReceiptState,
    subscribers: Vec<(usize, Subscriber)>,
    next_subscriber_id: usize,
}

impl ReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ReceiptState {
        &self.state
    }

    /// Returns the populated receipt, if any.
    pub fn receipt(&self) -> Option<&Receipt> {
        self.state.receipt()
    }

    /// Returns one assignable item by ID.
    pub fn find_item(&self, id: ItemId) -> Option<&ReceiptItem> {
        self.receipt()
            .and_then(|receipt| receipt.items.iter().find(|item| item.id == id))
    }

    /// Sum of assignable item prices; zero while unpopulated.
    pub fn subtotal(&self) -> f64 {
        self.receipt().map_or(0.0, Receipt::subtotal)
    }

    /// Replaces the current state with a freshly parsed receipt.
    ///
    /// # Errors
    /// Returns `Validation` when any parsed part violates field rules; the
    /// previous state is kept untouched in that case.
    pub fn populate(&mut self, parsed: ParsedReceipt) -> StoreResult<()> {
        let receipt = Receipt::new(parsed.items, parsed.tax, parsed.tip);
        receipt.validate()?;
        self.state = ReceiptState::Populated(receipt);
        self.notify(&StoreEvent::Populated);
        Ok(())
    }

    /// Parks the store in the failed state with a capture failure summary.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ReceiptState::Failed {
            message: message.into(),
        };
        self.notify(&StoreEvent::Failed);
    }

    /// Returns the store to the empty state.
    pub fn clear(&mut self) {
        self.state = ReceiptState::Empty;
        self.notify(&StoreEvent::Cleared);
    }

    /// Appends one item to the assignable list.
    ///
    /// # Errors
    /// - `NotPopulated` while no receipt is loaded.
    /// - `Validation` when the item fields are invalid.
    /// - `DuplicateItemId` when the ID is already present.
    pub fn add_item(&mut self, item: ReceiptItem) -> StoreResult<()> {
        item.validate()?;
        let receipt = self.populated_mut()?;
        let duplicate = receipt
            .items
            .iter()
            .chain(receipt.user_items.iter())
            .any(|existing| existing.id == item.id);
        if duplicate {
            return Err(StoreError::DuplicateItemId(item.id));
        }

        let id = item.id;
        receipt.items.push(item);
        self.notify(&StoreEvent::ItemAdded(id));
        Ok(())
    }

    /// Replaces the item carrying the same ID.
    ///
    /// Returns `Ok(false)` without touching state when no item matches,
    /// mirroring edit semantics where a concurrent delete wins.
    pub fn update_item(&mut self, item: ReceiptItem) -> StoreResult<bool> {
        item.validate()?;
        let receipt = self.populated_mut()?;
        let Some(slot) = receipt
            .items
            .iter_mut()
            .find(|existing| existing.id == item.id)
        else {
            return Ok(false);
        };

        let id = item.id;
        *slot = item;
        self.notify(&StoreEvent::ItemUpdated(id));
        Ok(true)
    }

    /// Removes the item carrying the given ID.
    ///
    /// Returns `Ok(false)` when no item matches.
    pub fn remove_item(&mut self, id: ItemId) -> StoreResult<bool> {
        let receipt = self.populated_mut()?;
        let before = receipt.items.len();
        receipt.items.retain(|item| item.id != id);
        if receipt.items.len() == before {
            return Ok(false);
        }

        self.notify(&StoreEvent::ItemRemoved(id));
        Ok(true)
    }

    /// Replaces the payer's leftover items wholesale.
    pub fn set_user_items(&mut self, items: Vec<ReceiptItem>) -> StoreResult<()> {
        for item in &items {
            item.validate()?;
        }
        let receipt = self.populated_mut()?;
        receipt.user_items = items;
        self.notify(&StoreEvent::UserItemsReplaced);
        Ok(())
    }

    /// Registers one observer and returns its subscription handle.
    pub fn subscribe(&mut self, subscriber: Subscriber) -> usize {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Drops one observer. Returns whether it was registered.
    pub fn unsubscribe(&mut self, subscription: usize) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(id, _)| *id != subscription);
        self.subscribers.len() != before
    }

    fn populated_mut(&mut self) -> StoreResult<&mut Receipt> {
        match &mut self.state {
            ReceiptState::Populated(receipt) => Ok(receipt),
            _ => Err(StoreError::NotPopulated),
        }
    }

    fn notify(&self, event: &StoreEvent) {
        for (_, subscriber) in &self.subscribers {
            subscriber(event);
        }
    }
}
