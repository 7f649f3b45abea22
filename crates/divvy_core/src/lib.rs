//! Core domain logic for Divvy receipt splitting.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod extract;
pub mod logging;
pub mod model;
pub mod notify;
pub mod parser;
pub mod repo;
pub mod session;
pub mod split;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::contact::{Contact, ContactId};
pub use model::receipt::{
    round2, ItemId, Receipt, ReceiptItem, ReceiptState, ReceiptValidationError,
};
pub use repo::history_repo::{
    HistoryPage, HistoryQuery, HistoryRepository, ReceiptDraft, ReceiptId, ReceiptRecord,
    RepoError, RepoResult, SqliteHistoryRepository,
};
pub use session::{SessionError, SessionToken, SplitSession};
pub use split::allocation::{allocate, Allocation, ContactShare, PayerShare};
pub use split::ledger::{AssignmentLedger, LedgerError, LedgerState};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
