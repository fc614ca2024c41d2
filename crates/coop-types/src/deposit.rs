//! Deposit records: fiat paid into the cooperative's bank account, minted
//! onto the owner's wallet once an admin has matched the payment.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  approve   ┌──────────┐  mint posted   ┌────────┐
//!   │ PENDING ├───────────▶│ APPROVED ├───────────────▶│ MINTED │
//!   └────┬────┘            └────┬─────┘                └────────┘
//!        │ decline              │ decline
//!        ▼                      ▼
//!   ┌──────────┐◀───────────────┘
//!   │ DECLINED │
//!   └──────────┘
//! ```
//!
//! MINTED is terminal. At most one unapproved deposit (PENDING or DECLINED)
//! exists per owner; deleting a declined deposit frees the slot.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, DeclinedId, DepositId, DocumentId, LedgerHash, UserId};

/// Derived lifecycle state of a [`Deposit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepositState {
    Pending,
    Approved,
    Declined,
    Minted,
}

impl fmt::Display for DepositState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Declined => write!(f, "DECLINED"),
            Self::Minted => write!(f, "MINTED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub owner: UserId,
    /// Short code the user writes on the bank transfer.
    pub reference: String,
    pub amount: Amount,
    pub approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Mint transaction hash. Only ever set on an approved deposit.
    pub tx_hash: Option<LedgerHash>,
    pub declined: Option<DeclinedId>,
    pub document: Option<DocumentId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub coop: String,
}

impl Deposit {
    #[must_use]
    pub fn state(&self) -> DepositState {
        if self.tx_hash.is_some() {
            DepositState::Minted
        } else if self.approved {
            DepositState::Approved
        } else if self.declined.is_some() {
            DepositState::Declined
        } else {
            DepositState::Pending
        }
    }

    /// Waiting for an admin decision: neither approved nor declined.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state() == DepositState::Pending
    }

    /// Counts against the owner's single deposit slot.
    #[must_use]
    pub fn is_unapproved(&self) -> bool {
        !self.approved
    }

    #[must_use]
    pub fn is_minted(&self) -> bool {
        self.tx_hash.is_some()
    }
}

/// Fields supplied when a deposit row is inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeposit {
    pub owner: UserId,
    pub reference: String,
    pub amount: Amount,
    pub created_by: UserId,
    pub coop: String,
}
