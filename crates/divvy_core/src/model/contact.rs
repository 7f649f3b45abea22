//! Contact domain model.
//!
//! # Responsibility
//! - Represent one person (other than the payer) who may owe money.
//! - Carry that person's claimed items through the assignment flow.
//!
//! # Invariants
//! - `id` is stable within a session and never reused.
//! - `items` holds only items claimed by this contact.

use crate::model::receipt::ReceiptItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one contact.
pub type ContactId = Uuid;

/// One person who can be assigned receipt items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Stable ID used for selection and assignment bookkeeping.
    pub id: ContactId,
    /// Display name.
    pub name: String,
    /// Optional phone number used by messaging collaborators.
    pub phone_number: Option<String>,
    /// Items claimed during assignment. Empty before the wizard runs.
    pub items: Vec<ReceiptItem>,
}

impl Contact {
    /// Creates a contact with a generated stable ID and no claimed items.
    pub fn new(name: impl Into<String>, phone_number: Option<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, phone_number)
    }

    /// Creates a contact with a caller-provided stable ID.
    ///
    /// Used when the embedding address book already owns identity.
    pub fn with_id(id: ContactId, name: impl Into<String>, phone_number: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phone_number,
            items: Vec::new(),
        }
    }
}
