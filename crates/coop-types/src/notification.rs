//! Outbound notifications. Delivery is best-effort; see the notifier port.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Amount, DepositId, OwnerId, ProjectId, RevenuePayoutId, UserId, WalletKind, WithdrawId};

/// A mail/push message triggered by a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    WalletActivated {
        owner: OwnerId,
        kind: WalletKind,
    },
    DepositRequested {
        user: UserId,
        deposit: DepositId,
        reference: String,
        amount: Amount,
    },
    DepositDeclined {
        user: UserId,
        deposit: DepositId,
        comment: String,
    },
    DepositMinted {
        user: UserId,
        deposit: DepositId,
        amount: Amount,
    },
    WithdrawRequested {
        user: UserId,
        withdraw: WithdrawId,
        amount: Amount,
    },
    WithdrawApproved {
        user: UserId,
        withdraw: WithdrawId,
        amount: Amount,
    },
    WithdrawBurned {
        user: UserId,
        withdraw: WithdrawId,
        amount: Amount,
    },
    WithdrawCancelled {
        user: UserId,
        withdraw: WithdrawId,
        amount: Amount,
    },
    RevenuePayoutCompleted {
        project: ProjectId,
        payout: RevenuePayoutId,
        amount: Amount,
    },
}

impl Notification {
    /// Short event name used as the log field and mail template key.
    #[must_use]
    pub fn event(&self) -> &'static str {
        match self {
            Self::WalletActivated { .. } => "wallet_activated",
            Self::DepositRequested { .. } => "deposit_requested",
            Self::DepositDeclined { .. } => "deposit_declined",
            Self::DepositMinted { .. } => "deposit_minted",
            Self::WithdrawRequested { .. } => "withdraw_requested",
            Self::WithdrawApproved { .. } => "withdraw_approved",
            Self::WithdrawBurned { .. } => "withdraw_burned",
            Self::WithdrawCancelled { .. } => "withdraw_cancelled",
            Self::RevenuePayoutCompleted { .. } => "revenue_payout_completed",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event())
    }
}
