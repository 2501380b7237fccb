//! # Financial Engines
//!
//! The two aggregates with approval state machines. Engines differ from
//! repositories in one way: a single public call may touch several
//! tables (status flip, ledger debt, inventory snapshot, investment,
//! audit row) and everything runs on one database transaction.

pub mod payment;
pub mod transaction;
