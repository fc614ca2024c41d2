//! Error types for the wallet ledger.
//!
//! Every failure carries a stable [`ErrorCode`] (`WALLET_MISSING`,
//! `TX_MISSING`, ...) that the request layer forwards to clients unchanged,
//! plus one of five categories:
//! - NotFound: missing wallet, deposit, withdraw, payout or intent
//! - AlreadyExists: duplicate wallet or open record, ledger hash already recorded
//! - InvalidRequest: wrong state for the transition, failed admission rule
//! - Gateway: a remote ledger/directory/mail call failed
//! - Internal: unexpected decode or store failure

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable, client-facing error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Wallet
    WalletMissing,
    WalletExists,
    WalletHashExists,
    WalletNotActivated,
    WalletFunds,

    // Deposit
    WalletDepositMissing,
    WalletDepositExists,
    WalletDepositNotApproved,
    WalletDepositMinted,
    WalletDepositDeclined,
    WalletDepositAmount,

    // Withdraw
    WalletWithdrawMissing,
    WalletWithdrawExists,
    WalletWithdrawApproved,
    WalletWithdrawNotApproved,
    WalletWithdrawBurned,
    WalletWithdrawNotBurned,
    WalletWithdrawMissingPrivilege,
    WalletWithdrawAmount,

    // Revenue payout
    RevenuePayoutMissing,
    RevenuePayoutCompleted,
    RevenuePayoutAmount,

    // Project / organization
    PrjMissing,
    PrjNotActive,
    PrjDateExpired,
    PrjMaxPerUser,
    PrjMinPerUser,
    PrjMaxFunds,
    PrjMissingPrivilege,
    OrgMissing,
    OrgMissingPrivilege,

    // Transaction intents
    TxMissing,
    TxCompanionDataMissing,

    // Internal / gateway
    IntInvalidValue,
    IntStore,
    IntConfig,
    IntIo,
    IntGatewayLedger,
    IntGatewayProject,
    IntGatewayUser,
    IntGatewayMail,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WalletMissing => "WALLET_MISSING",
            Self::WalletExists => "WALLET_EXISTS",
            Self::WalletHashExists => "WALLET_HASH_EXISTS",
            Self::WalletNotActivated => "WALLET_NOT_ACTIVATED",
            Self::WalletFunds => "WALLET_FUNDS",
            Self::WalletDepositMissing => "WALLET_DEPOSIT_MISSING",
            Self::WalletDepositExists => "WALLET_DEPOSIT_EXISTS",
            Self::WalletDepositNotApproved => "WALLET_DEPOSIT_NOT_APPROVED",
            Self::WalletDepositMinted => "WALLET_DEPOSIT_MINTED",
            Self::WalletDepositDeclined => "WALLET_DEPOSIT_DECLINED",
            Self::WalletDepositAmount => "WALLET_DEPOSIT_AMOUNT",
            Self::WalletWithdrawMissing => "WALLET_WITHDRAW_MISSING",
            Self::WalletWithdrawExists => "WALLET_WITHDRAW_EXISTS",
            Self::WalletWithdrawApproved => "WALLET_WITHDRAW_APPROVED",
            Self::WalletWithdrawNotApproved => "WALLET_WITHDRAW_NOT_APPROVED",
            Self::WalletWithdrawBurned => "WALLET_WITHDRAW_BURNED",
            Self::WalletWithdrawNotBurned => "WALLET_WITHDRAW_NOT_BURNED",
            Self::WalletWithdrawMissingPrivilege => "WALLET_WITHDRAW_MISSING_PRIVILEGE",
            Self::WalletWithdrawAmount => "WALLET_WITHDRAW_AMOUNT",
            Self::RevenuePayoutMissing => "REVENUE_PAYOUT_MISSING",
            Self::RevenuePayoutCompleted => "REVENUE_PAYOUT_COMPLETED",
            Self::RevenuePayoutAmount => "REVENUE_PAYOUT_AMOUNT",
            Self::PrjMissing => "PRJ_MISSING",
            Self::PrjNotActive => "PRJ_NOT_ACTIVE",
            Self::PrjDateExpired => "PRJ_DATE_EXPIRED",
            Self::PrjMaxPerUser => "PRJ_MAX_PER_USER",
            Self::PrjMinPerUser => "PRJ_MIN_PER_USER",
            Self::PrjMaxFunds => "PRJ_MAX_FUNDS",
            Self::PrjMissingPrivilege => "PRJ_MISSING_PRIVILEGE",
            Self::OrgMissing => "ORG_MISSING",
            Self::OrgMissingPrivilege => "ORG_MISSING_PRIVILEGE",
            Self::TxMissing => "TX_MISSING",
            Self::TxCompanionDataMissing => "TX_COMPANION_DATA_MISSING",
            Self::IntInvalidValue => "INT_INVALID_VALUE",
            Self::IntStore => "INT_STORE",
            Self::IntConfig => "INT_CONFIG",
            Self::IntIo => "INT_IO",
            Self::IntGatewayLedger => "INT_GATEWAY_LEDGER",
            Self::IntGatewayProject => "INT_GATEWAY_PROJECT",
            Self::IntGatewayUser => "INT_GATEWAY_USER",
            Self::IntGatewayMail => "INT_GATEWAY_MAIL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Central error enum for all wallet ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoopError {
    /// The addressed record does not exist.
    #[error("{code}: Not found: {message}")]
    NotFound { code: ErrorCode, message: String },

    /// A uniqueness rule would be broken, or the ledger hash is already recorded.
    #[error("{code}: Already exists: {message}")]
    AlreadyExists { code: ErrorCode, message: String },

    /// The record is in the wrong state or an admission rule failed.
    #[error("{code}: Invalid request: {message}")]
    InvalidRequest { code: ErrorCode, message: String },

    /// A remote capability failed. `remote_code` is whatever the back-end
    /// reported and is kept verbatim.
    #[error("{code}: Gateway failure [{remote_code}]: {message}")]
    Gateway {
        code: ErrorCode,
        remote_code: String,
        message: String,
    },

    /// Unrecoverable internal error.
    #[error("{code}: Internal error: {message}")]
    Internal { code: ErrorCode, message: String },
}

impl CoopError {
    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn already_exists(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code,
            message: message.into(),
        }
    }

    pub fn gateway(
        code: ErrorCode,
        remote_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Gateway {
            code,
            remote_code: remote_code.into(),
            message: message.into(),
        }
    }

    pub fn internal(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Internal {
            code,
            message: message.into(),
        }
    }

    /// The stable code attached to this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { code, .. }
            | Self::AlreadyExists { code, .. }
            | Self::InvalidRequest { code, .. }
            | Self::Gateway { code, .. }
            | Self::Internal { code, .. } => *code,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CoopError>;

impl From<std::io::Error> for CoopError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(ErrorCode::IntIo, err.to_string())
    }
}

impl From<serde_json::Error> for CoopError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(ErrorCode::IntConfig, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_starts_with_code() {
        let err = CoopError::not_found(ErrorCode::TxMissing, "intent tx:1");
        let msg = format!("{err}");
        assert!(msg.starts_with("TX_MISSING"), "Got: {msg}");
        assert!(msg.contains("intent tx:1"));
    }

    #[test]
    fn gateway_display_keeps_remote_code() {
        let err = CoopError::gateway(ErrorCode::IntGatewayLedger, "UNAVAILABLE", "node down");
        let msg = format!("{err}");
        assert!(msg.contains("INT_GATEWAY_LEDGER"));
        assert!(msg.contains("[UNAVAILABLE]"));
        assert!(msg.contains("node down"));
    }

    #[test]
    fn code_accessor_covers_every_category() {
        let errors = [
            CoopError::not_found(ErrorCode::WalletMissing, ""),
            CoopError::already_exists(ErrorCode::WalletMissing, ""),
            CoopError::invalid(ErrorCode::WalletMissing, ""),
            CoopError::gateway(ErrorCode::WalletMissing, "", ""),
            CoopError::internal(ErrorCode::WalletMissing, ""),
        ];
        for err in errors {
            assert_eq!(err.code(), ErrorCode::WalletMissing);
        }
    }

    #[test]
    fn code_serializes_like_display() {
        for code in [
            ErrorCode::WalletDepositNotApproved,
            ErrorCode::PrjMaxFunds,
            ErrorCode::TxCompanionDataMissing,
            ErrorCode::WalletWithdrawMissingPrivilege,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }
}
