//! # coop-store
//!
//! Record persistence for the wallet ledger: one table per record type,
//! each enforcing its uniqueness and terminal-state constraints, wrapped in
//! an atomic transaction primitive.
//!
//! ## Usage
//!
//! ```text
//! store.transaction(|tables| {
//!     let deposit = tables.insert_deposit(new)?;   // constraint-checked
//!     tables.insert_intent(intent)?;               // same unit of work
//!     Ok(deposit)
//! })                                               // commit, or roll back on Err
//! ```

pub mod store;
pub mod tables;

pub use store::Store;
pub use tables::Tables;
