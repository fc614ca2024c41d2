//! Transaction intents.
//!
//! An intent is the local half of a two-phase ledger operation. A generate
//! call persists one next to the unsigned payload it hands out; the
//! broadcast dispatcher consumes it exactly once when the signed payload
//! comes back, then deletes it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoopError, ErrorCode, IntentId, Result, UserId};

/// The closed set of operations that go through the intent registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    Activate,
    CreateOrg,
    CreateProject,
    Invest,
    CancelInvestment,
    Mint,
    BurnApproval,
    Burn,
    RevenuePayout,
}

impl IntentKind {
    pub const ALL: [Self; 9] = [
        Self::Activate,
        Self::CreateOrg,
        Self::CreateProject,
        Self::Invest,
        Self::CancelInvestment,
        Self::Mint,
        Self::BurnApproval,
        Self::Burn,
        Self::RevenuePayout,
    ];
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Activate => "ACTIVATE",
            Self::CreateOrg => "CREATE_ORG",
            Self::CreateProject => "CREATE_PROJECT",
            Self::Invest => "INVEST",
            Self::CancelInvestment => "CANCEL_INVESTMENT",
            Self::Mint => "MINT",
            Self::BurnApproval => "BURN_APPROVAL",
            Self::Burn => "BURN",
            Self::RevenuePayout => "REVENUE_PAYOUT",
        };
        f.write_str(s)
    }
}

/// Reference from an intent back to the entity its transaction affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CompanionData {
    /// Wallet, organization or project UUID.
    StructuredId(Uuid),
    /// Deposit, withdraw or payout row id.
    IntegerId(i64),
    #[default]
    None,
}

impl CompanionData {
    /// The UUID this intent points at.
    ///
    /// # Errors
    /// `TX_COMPANION_DATA_MISSING` when absent, `INT_INVALID_VALUE` when the
    /// intent carries a row id instead.
    pub fn structured_id(&self) -> Result<Uuid> {
        match self {
            Self::StructuredId(id) => Ok(*id),
            Self::IntegerId(id) => Err(CoopError::internal(
                ErrorCode::IntInvalidValue,
                format!("expected a structured id, intent carries row id {id}"),
            )),
            Self::None => Err(Self::missing()),
        }
    }

    /// The row id this intent points at.
    ///
    /// # Errors
    /// `TX_COMPANION_DATA_MISSING` when absent, `INT_INVALID_VALUE` when the
    /// intent carries a UUID instead.
    pub fn integer_id(&self) -> Result<i64> {
        match self {
            Self::IntegerId(id) => Ok(*id),
            Self::StructuredId(id) => Err(CoopError::internal(
                ErrorCode::IntInvalidValue,
                format!("expected a row id, intent carries structured id {id}"),
            )),
            Self::None => Err(Self::missing()),
        }
    }

    fn missing() -> CoopError {
        CoopError::invalid(
            ErrorCode::TxCompanionDataMissing,
            "transaction intent has no companion data",
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub id: IntentId,
    pub kind: IntentKind,
    pub description: String,
    pub requester: UserId,
    pub companion: CompanionData,
    pub created_at: DateTime<Utc>,
    pub coop: String,
}

impl TransactionIntent {
    pub fn new(
        kind: IntentKind,
        description: impl Into<String>,
        requester: UserId,
        companion: CompanionData,
        coop: impl Into<String>,
    ) -> Self {
        Self {
            id: IntentId::new(),
            kind,
            description: description.into(),
            requester,
            companion,
            created_at: Utc::now(),
            coop: coop.into(),
        }
    }
}
