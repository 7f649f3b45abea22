//! Receipt state ownership and reversible editing.
//!
//! # Responsibility
//! - Hold the canonical receipt for one session behind a mutation API.
//! - Track field-level edit history for LIFO undo.
//!
//! # Invariants
//! - All receipt mutations flow through `ReceiptStore`.
//! - Undo granularity is one field or structural change per record.
//!
//! # See also
//! - docs/architecture/split-flow.md

pub mod change_stack;
pub mod receipt_store;
