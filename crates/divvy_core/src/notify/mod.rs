//! Outbound split notifications.
//!
//! # Responsibility
//! - Turn an allocation into per-contact due amounts and message text.
//! - Keep the messaging transport behind an adapter registry.
//!
//! # Invariants
//! - Core composes message content only; transports own delivery.
//! - One contact's failure never aborts the rest of a batch.
//!
//! # See also
//! - docs/architecture/split-flow.md

pub mod messenger;
pub mod summary;
