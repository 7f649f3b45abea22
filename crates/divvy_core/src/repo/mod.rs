//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for saved splits.
//! - Isolate SQLite query details from session orchestration.
//!
//! # Invariants
//! - Repository writes are transactional; a failed save persists nothing.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod history_repo;
