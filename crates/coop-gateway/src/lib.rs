//! # coop-gateway
//!
//! Outbound ports of the wallet ledger. Everything behind these traits is
//! remote and out of our control:
//!
//! 1. **LedgerGateway**: balances, unsigned-payload builders, `post`
//! 2. **ProjectDirectory / UserDirectory**: metadata lookups by id
//! 3. **Notifier**: best-effort mail/push
//!
//! With the `test-helpers` feature the [`memory`] module provides
//! in-process doubles for all of them.

pub mod directory;
pub mod ledger;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod notifier;

pub use directory::{ProjectDirectory, UserDirectory};
pub use ledger::LedgerGateway;
pub use notifier::{Notifier, notify_best_effort};
