//! Item assignment and share allocation.
//!
//! # Responsibility
//! - Partition receipt items across contacts and the payer.
//! - Turn a completed partition into per-person owed amounts.
//!
//! # Invariants
//! - Assignment is a strict single-pass walk; allocation is a pure
//!   projection of the partition.
//!
//! # See also
//! - docs/architecture/split-flow.md

pub mod allocation;
pub mod ledger;
