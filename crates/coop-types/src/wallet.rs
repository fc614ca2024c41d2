//! Wallet records.
//!
//! A wallet binds an owner (user, organization or project) to an address on
//! the remote ledger. It is created locally with the owner's activation data
//! and becomes usable once an activation transaction has been posted and its
//! hash recorded.
//!
//! ```text
//!   ┌─────────────┐  activation posted   ┌───────────┐
//!   │ UNACTIVATED ├─────────────────────▶│ ACTIVATED │
//!   └─────────────┘                      └───────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoopError, ErrorCode, LedgerHash, OwnerId, Result, WalletId};

/// What kind of entity owns the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletKind {
    User,
    Org,
    Project,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "USER"),
            Self::Org => write!(f, "ORG"),
            Self::Project => write!(f, "PROJECT"),
        }
    }
}

/// Currency a wallet is denominated in. Conversion is out of scope; the
/// field is carried for display and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eur => write!(f, "EUR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub owner: OwnerId,
    pub kind: WalletKind,
    /// Public key material the ledger derives the wallet address from.
    /// Unique within a coop.
    pub activation_data: String,
    /// Ledger address, set once the activation transaction is posted.
    pub hash: Option<LedgerHash>,
    pub activated_at: Option<DateTime<Utc>>,
    pub currency: Currency,
    pub coop: String,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// A fresh, unactivated wallet.
    pub fn new(
        owner: OwnerId,
        kind: WalletKind,
        activation_data: impl Into<String>,
        currency: Currency,
        coop: impl Into<String>,
    ) -> Self {
        Self {
            id: WalletId::new(),
            owner,
            kind,
            activation_data: activation_data.into(),
            hash: None,
            activated_at: None,
            currency,
            coop: coop.into(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.hash.is_some()
    }

    /// The ledger address, or `WALLET_NOT_ACTIVATED`.
    pub fn activated_hash(&self) -> Result<&LedgerHash> {
        self.hash.as_ref().ok_or_else(|| {
            CoopError::invalid(
                ErrorCode::WalletNotActivated,
                format!("{} wallet of {} is not activated", self.kind, self.owner),
            )
        })
    }

    /// Record the posted activation. Overwrites a previous hash; callers
    /// decide whether that is acceptable.
    pub fn activate(&mut self, hash: LedgerHash, at: DateTime<Utc>) {
        self.hash = Some(hash);
        self.activated_at = Some(at);
    }
}
