//! Ledger-facing value types: hashes, payloads and the result of a
//! generate call.
//!
//! Payloads are opaque to this system. The ledger gateway builds an
//! [`UnsignedPayload`], an external client signs it, and the resulting
//! [`SignedPayload`] comes back through the broadcast dispatcher.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::IntentId;

/// Monetary amount in the smallest currency unit (cents).
pub type Amount = i64;

/// A hash on the remote ledger: a wallet address or a transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerHash(pub String);

impl LedgerHash {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LedgerHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction body built by the ledger, awaiting an external signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedPayload(pub String);

/// Transaction body after external signing, ready to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload(pub String);

impl SignedPayload {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

/// Everything the ledger needs to deploy a project contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectParams {
    pub user: LedgerHash,
    pub organization: LedgerHash,
    pub min_per_user: Amount,
    pub max_per_user: Amount,
    pub expected_funding: Amount,
    pub end_date: DateTime<Utc>,
}

impl CreateProjectParams {
    /// End date as epoch milliseconds, the unit the ledger expects.
    #[must_use]
    pub fn end_epoch_millis(&self) -> i64 {
        self.end_date.timestamp_millis()
    }
}

/// Returned by every `generate_*` call: the payload to sign and the intent
/// that the signed payload must be broadcast against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTransaction {
    pub unsigned: UnsignedPayload,
    pub intent_id: IntentId,
    pub description: String,
}
