//! Transaction intent registry.
//!
//! Generate calls record an intent next to the unsigned payload they hand
//! out. The intent id is the only handle a client needs to broadcast the
//! signed payload later.

use std::sync::Arc;

use coop_store::{Store, Tables};
use coop_types::{
    CompanionData, GeneratedTransaction, IntentId, IntentKind, Result, TransactionIntent,
    UnsignedPayload, UserId,
};

#[derive(Debug, Clone)]
pub struct TransactionIntentRegistry {
    store: Arc<Store>,
    coop: String,
}

impl TransactionIntentRegistry {
    pub fn new(store: Arc<Store>, coop: impl Into<String>) -> Self {
        Self {
            store,
            coop: coop.into(),
        }
    }

    /// Persist a new intent in its own transaction.
    pub fn create(
        &self,
        kind: IntentKind,
        description: impl Into<String>,
        requester: UserId,
        companion: CompanionData,
    ) -> Result<IntentId> {
        let description = description.into();
        self.store
            .transaction(|tables| self.create_in(tables, kind, description, requester, companion))
    }

    /// Persist a new intent as part of a caller's transaction.
    pub fn create_in(
        &self,
        tables: &mut Tables,
        kind: IntentKind,
        description: impl Into<String>,
        requester: UserId,
        companion: CompanionData,
    ) -> Result<IntentId> {
        let intent = TransactionIntent::new(kind, description, requester, companion, &self.coop);
        let id = intent.id;
        tables.insert_intent(intent)?;
        tracing::debug!(intent = %id, %kind, %requester, "Transaction intent created");
        Ok(id)
    }

    /// Record the intent and pair it with the payload it belongs to.
    pub fn issue(
        &self,
        unsigned: UnsignedPayload,
        kind: IntentKind,
        description: impl Into<String>,
        requester: UserId,
        companion: CompanionData,
    ) -> Result<GeneratedTransaction> {
        let description = description.into();
        let intent_id = self.create(kind, description.clone(), requester, companion)?;
        Ok(GeneratedTransaction {
            unsigned,
            intent_id,
            description,
        })
    }

    pub fn find(&self, id: IntentId) -> Result<Option<TransactionIntent>> {
        self.store.read(|tables| Ok(tables.intent(id).cloned()))
    }

    /// Drop an intent without broadcasting it. Returns whether it existed.
    pub fn delete(&self, id: IntentId) -> Result<bool> {
        let removed = self
            .store
            .transaction(|tables| Ok(tables.delete_intent(id).is_some()))?;
        if removed {
            tracing::info!(intent = %id, "Transaction intent discarded");
        }
        Ok(removed)
    }

    /// Intents of this coop still waiting for a signed payload, oldest
    /// first.
    pub fn outstanding(&self) -> Result<Vec<TransactionIntent>> {
        self.store.read(|tables| {
            let mut intents: Vec<_> = tables.intents(&self.coop).cloned().collect();
            intents.sort_by_key(|intent| (intent.created_at, intent.id));
            Ok(intents)
        })
    }
}
