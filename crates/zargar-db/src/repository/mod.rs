//! # Repository Implementations
//!
//! One repository per aggregate. Repositories own plain CRUD plus the
//! audit write for each mutation; anything that crosses an approval
//! threshold (status flips, financial side effects) belongs to the
//! engines in [`crate::engine`], which compose repository internals on
//! a single transaction handle.

pub mod account_ledger;
pub mod contact;
pub mod inventory;
pub mod investor;
pub mod item;
pub mod saved_bank_account;
pub mod user;
