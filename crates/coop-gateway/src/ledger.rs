//! Port to the remote distributed ledger.
//!
//! The ledger is reached only through coarse request/response calls:
//! balance lookups, one unsigned-payload builder per operation kind, and a
//! single `post` for every signed payload. Calls are synchronous and carry
//! no timeout of their own; adapters impose their deadline.

use coop_types::{Amount, CreateProjectParams, LedgerHash, Result, SignedPayload, UnsignedPayload};

/// Remote ledger capability.
///
/// Every method may fail with [`coop_types::CoopError::Gateway`] carrying
/// the remote error code and message.
pub trait LedgerGateway: Send + Sync {
    /// Token balance of a wallet address. `None` when the ledger has never
    /// seen the address.
    fn balance(&self, wallet: &LedgerHash) -> Result<Option<Amount>>;

    fn build_activation(&self, activation_data: &str) -> Result<UnsignedPayload>;

    fn build_create_organization(&self, user: &LedgerHash) -> Result<UnsignedPayload>;

    fn build_create_project(&self, params: &CreateProjectParams) -> Result<UnsignedPayload>;

    fn build_invest(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
        amount: Amount,
    ) -> Result<UnsignedPayload>;

    fn build_cancel_investment(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
    ) -> Result<UnsignedPayload>;

    fn build_mint(&self, to: &LedgerHash, amount: Amount) -> Result<UnsignedPayload>;

    fn build_approve_burn(&self, from: &LedgerHash, amount: Amount) -> Result<UnsignedPayload>;

    fn build_burn(&self, from: &LedgerHash) -> Result<UnsignedPayload>;

    fn build_revenue_payout(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
        amount: Amount,
    ) -> Result<UnsignedPayload>;

    /// Submit a signed payload. Returns the ledger transaction hash. Once
    /// this returns `Ok` the effect on the ledger is irreversible.
    fn post(&self, signed: &SignedPayload) -> Result<LedgerHash>;

    /// Balance with "unknown address" read as zero.
    fn balance_or_zero(&self, wallet: &LedgerHash) -> Result<Amount> {
        Ok(self.balance(wallet)?.unwrap_or(0))
    }
}
