//! Withdraw records: tokens burned from the owner's wallet and paid out to
//! a bank account.
//!
//! ## State Machine
//!
//! ```text
//!   ┌───────────┐  approval posted  ┌──────────┐  burn posted  ┌────────┐
//!   │ REQUESTED ├──────────────────▶│ APPROVED ├──────────────▶│ BURNED │
//!   └───────────┘                   └──────────┘               └────────┘
//! ```
//!
//! A burn requires a prior approval hash. BURNED is terminal. REQUESTED and
//! APPROVED are both "open"; at most one open withdraw exists per owner.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BankAccount, DocumentId, LedgerHash, UserId, WithdrawId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawState {
    Requested,
    Approved,
    Burned,
}

impl fmt::Display for WithdrawState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "REQUESTED"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Burned => write!(f, "BURNED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub id: WithdrawId,
    pub owner: UserId,
    pub amount: Amount,
    pub bank_account: BankAccount,
    /// Hash of the owner's burn-approval transaction.
    pub approved_tx_hash: Option<LedgerHash>,
    pub approved_at: Option<DateTime<Utc>>,
    pub burned_tx_hash: Option<LedgerHash>,
    pub burned_at: Option<DateTime<Utc>>,
    /// Stamped when the burn transaction is generated, not when it lands.
    pub burned_by: Option<UserId>,
    pub document: Option<DocumentId>,
    pub created_at: DateTime<Utc>,
    pub coop: String,
}

impl Withdraw {
    #[must_use]
    pub fn state(&self) -> WithdrawState {
        if self.burned_tx_hash.is_some() {
            WithdrawState::Burned
        } else if self.approved_tx_hash.is_some() {
            WithdrawState::Approved
        } else {
            WithdrawState::Requested
        }
    }

    /// Unapproved, or approved but not yet burned.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.burned_tx_hash.is_none()
    }

    #[must_use]
    pub fn is_burned(&self) -> bool {
        self.burned_tx_hash.is_some()
    }
}

/// Fields supplied when a withdraw row is inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdraw {
    pub owner: UserId,
    pub amount: Amount,
    pub bank_account: BankAccount,
    pub coop: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_hashes() {
        let owner = UserId::new();
        let mut w = Withdraw {
            id: WithdrawId(1),
            owner,
            amount: 500,
            bank_account: BankAccount::new("HR1210010051863000160", None, owner),
            approved_tx_hash: None,
            approved_at: None,
            burned_tx_hash: None,
            burned_at: None,
            burned_by: None,
            document: None,
            created_at: Utc::now(),
            coop: "coop".into(),
        };
        assert_eq!(w.state(), WithdrawState::Requested);
        assert!(w.is_open());

        w.approved_tx_hash = Some(LedgerHash::new("th_approve"));
        assert_eq!(w.state(), WithdrawState::Approved);
        assert!(w.is_open());

        w.burned_tx_hash = Some(LedgerHash::new("th_burn"));
        assert_eq!(w.state(), WithdrawState::Burned);
        assert!(!w.is_open());
    }
}
