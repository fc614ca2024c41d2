//! Identifiers used throughout the wallet ledger.
//!
//! Entity ids minted locally (wallets, intents) use UUIDv7 for time-ordered
//! sorting. Users, organizations and projects are owned by the directory
//! services; their UUIDs are only wrapped here. Relational rows (deposits,
//! withdraws, payouts, declines, documents) use integer surrogate keys
//! assigned by the store.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Directory-owned identities
// ---------------------------------------------------------------------------

uuid_id!(
    /// A platform user, as known to the user directory.
    UserId,
    "user"
);

uuid_id!(
    /// An organization, as known to the project directory.
    OrganizationId,
    "org"
);

uuid_id!(
    /// A crowdfunding project, as known to the project directory.
    ProjectId,
    "project"
);

// ---------------------------------------------------------------------------
// Locally minted identities
// ---------------------------------------------------------------------------

uuid_id!(
    /// Wallet surrogate key.
    WalletId,
    "wallet"
);

uuid_id!(
    /// Single-use transaction intent key.
    IntentId,
    "tx"
);

// ---------------------------------------------------------------------------
// OwnerId
// ---------------------------------------------------------------------------

/// The owner of a wallet. Users, organizations and projects share one UUID
/// space, so the wallet table keys owners by the raw UUID and the wallet's
/// [`crate::WalletKind`] tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl From<UserId> for OwnerId {
    fn from(id: UserId) -> Self {
        Self(id.0)
    }
}

impl From<OrganizationId> for OwnerId {
    fn from(id: OrganizationId) -> Self {
        Self(id.0)
    }
}

impl From<ProjectId> for OwnerId {
    fn from(id: ProjectId) -> Self {
        Self(id.0)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Relational row ids
// ---------------------------------------------------------------------------

row_id!(DepositId, "deposit");
row_id!(WithdrawId, "withdraw");
row_id!(RevenuePayoutId, "payout");
row_id!(DeclinedId, "declined");
row_id!(DocumentId, "document");
