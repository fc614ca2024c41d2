//! Broadcast dispatcher: the single entry point for signed payloads that
//! were generated through the intent registry.
//!
//! ```text
//!   dispatch(intent_id, signed)
//!     ┌──────────────── store transaction ────────────────┐
//!     │ load intent ─▶ finalizer(kind) ─▶ settle ─▶ delete │
//!     └────────────────────────────────────────────────────┘
//!                           │ commit
//!                           ▼
//!                  notify (best-effort)
//! ```
//!
//! The store holds its lock for the whole transaction, so concurrent
//! broadcasts of the same intent run one after the other and only the
//! first reaches the ledger; the rest see `TX_MISSING`.

use std::sync::Arc;

use coop_types::{CoopError, ErrorCode, IntentId, LedgerHash, Result, SignedPayload};

use crate::context::Context;
use crate::finalizer::{FinalizerRegistry, settle};

#[derive(Clone)]
pub struct BroadcastDispatcher {
    ctx: Context,
    registry: Arc<dyn FinalizerRegistry>,
}

impl BroadcastDispatcher {
    pub fn new(ctx: Context, registry: Arc<dyn FinalizerRegistry>) -> Self {
        Self { ctx, registry }
    }

    /// Post `signed` for the given intent and run its finalizer.
    ///
    /// # Errors
    /// - `TX_MISSING` if the intent does not exist (or was already used)
    /// - whatever the finalizer or the ledger rejects with; the intent is
    ///   kept in that case
    pub fn dispatch(&self, intent_id: IntentId, signed: &SignedPayload) -> Result<LedgerHash> {
        let result = self.ctx.store.transaction(|tables| {
            let intent = tables
                .intent(intent_id)
                .filter(|intent| intent.coop == self.ctx.coop())
                .cloned()
                .ok_or_else(|| {
                    CoopError::not_found(
                        ErrorCode::TxMissing,
                        format!("no transaction intent {intent_id}"),
                    )
                })?;
            let finalizer = self.registry.finalizer(intent.kind);
            let settled = settle(
                tables,
                self.ctx.ledger.as_ref(),
                finalizer,
                intent.kind,
                &intent.companion,
                signed,
                Some(intent_id),
            )?;
            tables.delete_intent(intent_id);
            Ok((intent, settled))
        });

        match result {
            Ok((intent, settled)) => {
                tracing::info!(
                    intent = %intent_id,
                    kind = %intent.kind,
                    requester = %intent.requester,
                    tx_hash = %settled.tx_hash,
                    "Intent broadcast"
                );
                Ok(self.ctx.deliver(settled))
            }
            Err(err) => {
                tracing::warn!(intent = %intent_id, error = %err, "Broadcast rejected");
                Err(err)
            }
        }
    }
}
