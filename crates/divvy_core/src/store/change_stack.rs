//! Field-level edit records with LIFO undo.
//!
//! # Responsibility
//! - Record one reversible entry per mutated field or structural change.
//! - Apply inverses against the receipt store in reverse order.
//!
//! # Invariants
//! - One `undo` reverts exactly one recorded change.
//! - Field restores are skipped (but still consumed) when the target item
//!   no longer exists.
//! - `undo` on an empty stack is a no-op.
//!
//! # See also
//! - docs/architecture/split-flow.md

use crate::model::receipt::{ItemId, ReceiptItem};
use crate::store::receipt_store::{ReceiptStore, StoreResult};

/// One reversible edit against the receipt store.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// An item was renamed; `previous` restores the old name.
    EditName { id: ItemId, previous: String },
    /// An item was repriced; `previous` restores the old price.
    EditPrice { id: ItemId, previous: f64 },
    /// An item was deleted; the snapshot restores it.
    Delete { item: ReceiptItem },
    /// An item was added; undoing removes it again.
    Add { id: ItemId },
}

impl Change {
    /// The item this change refers to.
    pub fn item_id(&self) -> ItemId {
        match self {
            Self::EditName { id, .. } => *id,
            Self::EditPrice { id, .. } => *id,
            Self::Delete { item } => item.id,
            Self::Add { id } => *id,
        }
    }
}

/// LIFO log of reversible receipt edits.
#[derive(Debug, Clone, Default)]
pub struct ChangeStack {
    changes: Vec<Change>,
}

impl ChangeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one change on top of the stack.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Drops all recorded changes, typically at edit-session exit.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Reverts the most recent change against the store.
    ///
    /// Returns the consumed change, or `None` when the stack is empty.
    /// A field restore whose item has since been deleted consumes the
    /// record without mutating the store.
    ///
    /// # Errors
    /// Propagates store failures; the record stays on the stack then.
    pub fn undo(&mut self, store: &mut ReceiptStore) -> StoreResult<Option<Change>> {
        let Some(change) = self.changes.last().cloned() else {
            return Ok(None);
        };

        match &change {
            Change::EditName { id, previous } => {
                if let Some(current) = store.find_item(*id).cloned() {
                    let mut restored = current;
                    restored.name = previous.clone();
                    store.update_item(restored)?;
                }
            }
            Change::EditPrice { id, previous } => {
                if let Some(current) = store.find_item(*id).cloned() {
                    let mut restored = current;
                    restored.price = *previous;
                    store.update_item(restored)?;
                }
            }
            Change::Delete { item } => {
                store.add_item(item.clone())?;
            }
            Change::Add { id } => {
                store.remove_item(*id)?;
            }
        }

        self.changes.pop();
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::{Change, ChangeStack};
    use crate::model::receipt::ReceiptItem;
    use crate::parser::ParsedReceipt;
    use crate::store::receipt_store::ReceiptStore;

    fn populated_store(items: Vec<ReceiptItem>) -> ReceiptStore {
        let mut store = ReceiptStore::new();
        store
            .populate(ParsedReceipt {
                items,
                tax: 0.0,
                tip: 0.0,
            })
            .expect("store should populate");
        store
    }

    #[test]
    fn undo_on_empty_stack_is_noop() {
        let mut store = populated_store(vec![]);
        let mut stack = ChangeStack::new();
        assert!(stack.undo(&mut store).expect("undo should succeed").is_none());
    }

    #[test]
    fn field_restore_is_skipped_when_item_is_gone() {
        let item = ReceiptItem::new("Burger", 5.0);
        let id = item.id;
        let mut store = populated_store(vec![item]);
        let mut stack = ChangeStack::new();
        stack.push(Change::EditPrice { id, previous: 4.0 });

        store.remove_item(id).expect("remove should succeed");
        let consumed = stack.undo(&mut store).expect("undo should succeed");
        assert!(matches!(consumed, Some(Change::EditPrice { .. })));
        assert!(stack.is_empty());
        assert!(store.find_item(id).is_none());
    }
}
