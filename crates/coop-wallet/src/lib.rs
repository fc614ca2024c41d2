//! # coop-wallet
//!
//! Two-phase ledger workflows for a cooperative crowdfunding platform.
//!
//! Every operation that moves value on the remote ledger is split in two:
//!
//! 1. **generate**: validate local state, ask the ledger gateway for an
//!    unsigned payload, persist a [`TransactionIntent`](coop_types::TransactionIntent)
//!    and return both to the caller.
//! 2. **dispatch**: the caller signs the payload externally and hands it
//!    back with the intent id. The [`BroadcastDispatcher`] re-validates,
//!    posts, applies the kind-specific [`Finalizer`] and deletes the intent
//!    in one store transaction.
//!
//! Managers:
//!
//! - [`WalletManager`]: user/organization/project wallets and activation
//! - [`DepositManager`]: deposit, approval, mint
//! - [`WithdrawManager`]: withdraw, burn approval, burn
//! - [`InvestmentAdmission`]: invest and cancel-investment gates
//! - [`RevenuePayoutManager`]: project revenue distribution
//!
//! [`CoopServices`] wires them together for one coop.

pub mod context;
pub mod deposit;
pub mod dispatcher;
pub mod finalizer;
pub mod intent;
pub mod investment;
pub mod reference;
pub mod revenue;
pub mod services;
pub mod telemetry;
pub mod wallet;
pub mod withdraw;

#[cfg(test)]
mod testkit;

pub use context::Context;
pub use deposit::{DepositManager, DepositWithUser};
pub use dispatcher::BroadcastDispatcher;
pub use finalizer::{Finalizer, FinalizerRegistry};
pub use intent::TransactionIntentRegistry;
pub use investment::InvestmentAdmission;
pub use revenue::RevenuePayoutManager;
pub use services::{CoopServices, Finalizers};
pub use telemetry::init_tracing;
pub use wallet::WalletManager;
pub use withdraw::WithdrawManager;
