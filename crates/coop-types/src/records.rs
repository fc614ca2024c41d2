//! Small value records referenced one-way from deposits, withdraws and
//! projects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, DeclinedId, DocumentId, LedgerHash, ProjectId, RevenuePayoutId, UserId};

/// Destination account of a withdraw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub iban: String,
    pub bank_code: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl BankAccount {
    pub fn new(iban: impl Into<String>, bank_code: Option<String>, created_by: UserId) -> Self {
        Self {
            iban: iban.into(),
            bank_code,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// Why an admin refused a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declined {
    pub id: DeclinedId,
    pub comment: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// A document already uploaded to object storage; only its metadata is
/// recorded here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub link: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Metadata of an uploaded file, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub link: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

/// A project owner paying revenue share back to the investors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenuePayout {
    pub id: RevenuePayoutId,
    pub project: ProjectId,
    pub amount: Amount,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub tx_hash: Option<LedgerHash>,
    pub completed_at: Option<DateTime<Utc>>,
    pub coop: String,
}

impl RevenuePayout {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.tx_hash.is_some()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl NewDocument {
    pub fn dummy(name: &str) -> Self {
        Self {
            link: format!("https://files.example/{name}"),
            name: name.to_string(),
            content_type: "application/pdf".to_string(),
            size: 1024,
        }
    }
}
