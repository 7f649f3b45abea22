//! Domain model for receipts, items and contacts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one item shape shared by parsing, editing, assignment and
//!   allocation.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Receipt lifecycle is an explicit tagged state, not a field-shape check.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod contact;
pub mod receipt;
