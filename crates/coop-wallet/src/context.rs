//! Collaborators shared by every manager.

use std::sync::Arc;

use coop_gateway::{LedgerGateway, Notifier, ProjectDirectory, UserDirectory, notify_best_effort};
use coop_store::{Store, Tables};
use coop_types::{
    CompanionData, CoopConfig, CoopError, ErrorCode, IntentKind, LedgerHash, OwnerId, Result,
    SignedPayload, Wallet,
};

use crate::finalizer::{Finalizer, Settled, settle};

/// Store, gateways and configuration of one coop. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<Store>,
    pub ledger: Arc<dyn LedgerGateway>,
    pub projects: Arc<dyn ProjectDirectory>,
    pub users: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<CoopConfig>,
}

impl Context {
    #[must_use]
    pub fn coop(&self) -> &str {
        &self.config.coop
    }

    /// The owner's wallet in this coop, or `WALLET_MISSING`.
    pub(crate) fn wallet_of<'t>(&self, tables: &'t Tables, owner: OwnerId) -> Result<&'t Wallet> {
        tables.wallet_by_owner(owner, self.coop()).ok_or_else(|| {
            CoopError::not_found(ErrorCode::WalletMissing, format!("no wallet for {owner}"))
        })
    }

    /// The owner's ledger address: `WALLET_MISSING` without a wallet,
    /// `WALLET_NOT_ACTIVATED` before activation.
    pub(crate) fn activated_hash(&self, tables: &Tables, owner: OwnerId) -> Result<LedgerHash> {
        self.wallet_of(tables, owner)?.activated_hash().cloned()
    }

    /// Confirm a transaction without going through the intent registry:
    /// verify, post and apply in one store transaction, then notify.
    pub(crate) fn confirm_direct(
        &self,
        kind: IntentKind,
        finalizer: &dyn Finalizer,
        companion: CompanionData,
        signed: &SignedPayload,
    ) -> Result<LedgerHash> {
        let settled = self.store.transaction(|tables| {
            settle(tables, self.ledger.as_ref(), finalizer, kind, &companion, signed, None)
        })?;
        Ok(self.deliver(settled))
    }

    /// Send the settled notification (best-effort) and hand back the hash.
    pub(crate) fn deliver(&self, settled: Settled) -> LedgerHash {
        if let Some(notification) = &settled.notification {
            notify_best_effort(self.notifier.as_ref(), notification);
        }
        settled.tx_hash
    }
}
