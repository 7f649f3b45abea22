//! External vision extraction boundary.
//!
//! # Responsibility
//! - Keep the extraction consumer contract (request shape, error
//!   envelope, adapter trait) in one place.
//!
//! # See also
//! - docs/architecture/split-flow.md

pub mod service;
