//! Per-kind confirmation logic.
//!
//! Every [`IntentKind`] has exactly one [`Finalizer`]. The dispatcher looks
//! it up through a [`FinalizerRegistry`] and runs [`settle`]:
//!
//! ```text
//!   verify(tables) ──▶ ledger.post(signed) ──▶ apply(tables, tx_hash)
//!        │                    │                        │
//!        ▼                    ▼                        ▼
//!   reject, nothing      reject, nothing       posted but not recorded:
//!   posted               recorded              logged for reconciliation
//! ```
//!
//! `settle` runs inside the caller's store transaction, so a failed apply
//! also rolls back everything else the transaction touched (in particular
//! the intent stays in place).

use coop_gateway::LedgerGateway;
use coop_store::Tables;
use coop_types::{
    CompanionData, IntentId, IntentKind, LedgerHash, Notification, Result, SignedPayload,
};

/// Entity-specific half of a confirmation.
pub trait Finalizer: Send + Sync {
    /// Re-check the referenced entity right before posting. Runs against
    /// the same working copy `apply` will mutate.
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()>;

    /// Record a posted transaction and name the notification to send once
    /// the store transaction commits.
    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>>;
}

/// Maps every intent kind to its finalizer. Implementations must be
/// exhaustive over [`IntentKind`].
pub trait FinalizerRegistry: Send + Sync {
    fn finalizer(&self, kind: IntentKind) -> &dyn Finalizer;
}

/// Outcome of a successful [`settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub tx_hash: LedgerHash,
    pub notification: Option<Notification>,
}

/// Verify, post and apply one signed transaction.
///
/// `intent` is only used to tag the reconciliation log line.
pub fn settle(
    tables: &mut Tables,
    ledger: &dyn LedgerGateway,
    finalizer: &dyn Finalizer,
    kind: IntentKind,
    companion: &CompanionData,
    signed: &SignedPayload,
    intent: Option<IntentId>,
) -> Result<Settled> {
    finalizer.verify(tables, companion)?;
    let tx_hash = ledger.post(signed)?;
    match finalizer.apply(tables, companion, &tx_hash) {
        Ok(notification) => {
            tracing::info!(%kind, ?companion, %tx_hash, "Transaction settled");
            Ok(Settled {
                tx_hash,
                notification,
            })
        }
        Err(err) => {
            tracing::error!(
                %kind,
                ?companion,
                %tx_hash,
                intent = ?intent,
                error = %err,
                "Transaction posted but not recorded, needs reconciliation"
            );
            Err(err)
        }
    }
}

/// Finalizer for kinds with no local state: the ledger is the record.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatelessFinalizer;

impl Finalizer for StatelessFinalizer {
    fn verify(&self, _tables: &Tables, _companion: &CompanionData) -> Result<()> {
        Ok(())
    }

    fn apply(
        &self,
        _tables: &mut Tables,
        _companion: &CompanionData,
        _tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        Ok(None)
    }
}
