//! # coop-types
//!
//! Shared records, errors, and configuration for the cooperative wallet
//! ledger.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`OrganizationId`], [`ProjectId`], [`WalletId`], [`IntentId`], [`OwnerId`], row ids
//! - **Wallet model**: [`Wallet`], [`WalletKind`], [`Currency`]
//! - **Deposit model**: [`Deposit`], [`DepositState`], [`NewDeposit`]
//! - **Withdraw model**: [`Withdraw`], [`WithdrawState`], [`NewWithdraw`]
//! - **Intent model**: [`TransactionIntent`], [`IntentKind`], [`CompanionData`]
//! - **Value records**: [`BankAccount`], [`Declined`], [`Document`], [`RevenuePayout`]
//! - **Ledger values**: [`LedgerHash`], [`UnsignedPayload`], [`SignedPayload`], [`GeneratedTransaction`]
//! - **Directory metadata**: [`ProjectInfo`], [`OrganizationInfo`], [`UserInfo`]
//! - **Notifications**: [`Notification`]
//! - **Configuration**: [`CoopConfig`], [`LogConfig`]
//! - **Errors**: [`CoopError`] with stable [`ErrorCode`]s

pub mod config;
pub mod constants;
pub mod deposit;
pub mod directory;
pub mod error;
pub mod ids;
pub mod intent;
pub mod notification;
pub mod payload;
pub mod records;
pub mod wallet;
pub mod withdraw;

pub use config::*;
pub use deposit::*;
pub use directory::*;
pub use error::*;
pub use ids::*;
pub use intent::*;
pub use notification::*;
pub use payload::*;
pub use records::*;
pub use wallet::*;
pub use withdraw::*;

// Constants are accessed via `coop_types::constants::FOO`.
