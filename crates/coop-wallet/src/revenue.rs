//! Revenue payouts: a project owner distributes revenue to the project's
//! investors through the project contract.

use chrono::Utc;
use coop_store::Tables;
use coop_types::{
    Amount, CompanionData, CoopError, ErrorCode, GeneratedTransaction, IntentKind, LedgerHash,
    Notification, ProjectId, Result, RevenuePayout, RevenuePayoutId, UserId,
};

use crate::context::Context;
use crate::finalizer::Finalizer;
use crate::intent::TransactionIntentRegistry;

#[derive(Clone)]
pub struct RevenuePayoutManager {
    ctx: Context,
    intents: TransactionIntentRegistry,
}

impl RevenuePayoutManager {
    pub fn new(ctx: Context, intents: TransactionIntentRegistry) -> Self {
        Self { ctx, intents }
    }

    /// Record a payout and the intent that completes it.
    ///
    /// # Errors
    /// - `REVENUE_PAYOUT_AMOUNT` unless `amount` is positive
    /// - `PRJ_MISSING`, `PRJ_MISSING_PRIVILEGE` unless `requester` owns the project
    /// - `WALLET_MISSING` / `WALLET_NOT_ACTIVATED` for the requester or project
    pub fn generate_revenue_payout(
        &self,
        project: ProjectId,
        amount: Amount,
        requester: UserId,
    ) -> Result<GeneratedTransaction> {
        if amount <= 0 {
            return Err(CoopError::invalid(
                ErrorCode::RevenuePayoutAmount,
                format!("payout amount must be positive, got {amount}"),
            ));
        }
        let info = self.ctx.projects.project(project)?;
        if info.owner != requester {
            return Err(CoopError::invalid(
                ErrorCode::PrjMissingPrivilege,
                format!("{requester} does not own {project}"),
            ));
        }
        let (user_hash, project_hash) = self.ctx.store.read(|tables| {
            Ok((
                self.ctx.activated_hash(tables, requester.into())?,
                self.ctx.activated_hash(tables, project.into())?,
            ))
        })?;
        let unsigned = self
            .ctx
            .ledger
            .build_revenue_payout(&user_hash, &project_hash, amount)?;
        let description = format!("Revenue payout of {amount} for project {}", info.name);
        let (payout, intent_id) = self.ctx.store.transaction(|tables| {
            let payout = tables.insert_payout(project, amount, requester, self.ctx.coop());
            let intent_id = self.intents.create_in(
                tables,
                IntentKind::RevenuePayout,
                description.clone(),
                requester,
                CompanionData::IntegerId(payout.id.0),
            )?;
            Ok((payout, intent_id))
        })?;
        tracing::info!(
            payout = %payout.id,
            %project,
            amount,
            intent = %intent_id,
            "Revenue payout generated"
        );
        Ok(GeneratedTransaction {
            unsigned,
            intent_id,
            description,
        })
    }

    pub fn find(&self, id: RevenuePayoutId) -> Result<RevenuePayout> {
        self.ctx
            .store
            .read(|tables| load(tables, id, self.ctx.coop()).cloned())
    }

    /// Payouts of one project, oldest first.
    pub fn find_by_project(&self, project: ProjectId) -> Result<Vec<RevenuePayout>> {
        self.ctx.store.read(|tables| {
            let mut payouts: Vec<_> = tables
                .payouts(self.ctx.coop())
                .filter(|p| p.project == project)
                .cloned()
                .collect();
            payouts.sort_by_key(|p| p.id);
            Ok(payouts)
        })
    }
}

fn load<'t>(tables: &'t Tables, id: RevenuePayoutId, coop: &str) -> Result<&'t RevenuePayout> {
    tables
        .payout(id)
        .filter(|p| p.coop == coop)
        .ok_or_else(|| CoopError::not_found(ErrorCode::RevenuePayoutMissing, format!("{id}")))
}

/// REVENUE_PAYOUT: mark the payout completed.
#[derive(Debug, Clone)]
pub struct RevenuePayoutFinalizer {
    coop: String,
}

impl RevenuePayoutFinalizer {
    pub fn new(coop: impl Into<String>) -> Self {
        Self { coop: coop.into() }
    }
}

impl Finalizer for RevenuePayoutFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let id = RevenuePayoutId(companion.integer_id()?);
        let payout = load(tables, id, &self.coop)?;
        match &payout.tx_hash {
            Some(tx_hash) => Err(CoopError::already_exists(
                ErrorCode::RevenuePayoutCompleted,
                format!("{id} already completed in {tx_hash}"),
            )),
            None => Ok(()),
        }
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let id = RevenuePayoutId(companion.integer_id()?);
        let mut payout = load(tables, id, &self.coop)?.clone();
        payout.tx_hash = Some(tx_hash.clone());
        payout.completed_at = Some(Utc::now());
        let notification = Notification::RevenuePayoutCompleted {
            project: payout.project,
            payout: id,
            amount: payout.amount,
        };
        tables.update_payout(payout)?;
        tracing::info!(payout = %id, %tx_hash, "Revenue payout completed");
        Ok(Some(notification))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use coop_gateway::memory::{MemoryLedger, sign};

    use crate::testkit::Kit;

    fn manager(kit: &Kit) -> RevenuePayoutManager {
        let intents = TransactionIntentRegistry::new(Arc::clone(&kit.ctx.store), kit.ctx.coop());
        RevenuePayoutManager::new(kit.ctx.clone(), intents)
    }

    #[test]
    fn rejects_non_positive_amount() {
        let kit = Kit::new();
        let err = manager(&kit)
            .generate_revenue_payout(ProjectId::new(), 0, UserId::new())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RevenuePayoutAmount);
    }

    #[test]
    fn only_project_owner_may_pay_out() {
        let kit = Kit::new();
        let (owner, _) = kit.user();
        let (project, _) = kit.project(owner);
        let (stranger, _) = kit.user();

        let err = manager(&kit)
            .generate_revenue_payout(project.id, 1_000, stranger)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrjMissingPrivilege);
    }

    #[test]
    fn generate_persists_payout_and_intent_together() {
        let kit = Kit::new();
        let payouts = manager(&kit);
        let (owner, owner_hash) = kit.user();
        let (project, project_hash) = kit.project(owner);

        let generated = payouts
            .generate_revenue_payout(project.id, 2_500, owner)
            .unwrap();

        assert_eq!(
            generated.unsigned.0,
            format!("revenue_payout:{owner_hash}:{project_hash}:2500")
        );
        let rows = payouts.find_by_project(project.id).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_completed());
        let intent = payouts.intents.find(generated.intent_id).unwrap().unwrap();
        assert_eq!(intent.companion, CompanionData::IntegerId(rows[0].id.0));
    }

    #[test]
    fn failed_build_records_no_payout() {
        let kit = Kit::new();
        let payouts = manager(&kit);
        let (owner, _) = kit.user();
        let (project, _) = kit.project(owner);
        kit.ledger.fail_builds(true);

        assert!(payouts.generate_revenue_payout(project.id, 2_500, owner).is_err());
        assert!(payouts.find_by_project(project.id).unwrap().is_empty());
    }

    #[test]
    fn finalizer_completes_once() {
        let kit = Kit::new();
        let payouts = manager(&kit);
        let (owner, _) = kit.user();
        let (project, _) = kit.project(owner);
        let generated = payouts
            .generate_revenue_payout(project.id, 2_500, owner)
            .unwrap();
        let id = payouts.find_by_project(project.id).unwrap()[0].id;
        let finalizer = RevenuePayoutFinalizer::new(kit.ctx.coop());
        let companion = CompanionData::IntegerId(id.0);
        let hash = MemoryLedger::tx_hash_for(&sign(&generated.unsigned));

        kit.ctx
            .store
            .transaction(|t| {
                finalizer.verify(t, &companion)?;
                finalizer.apply(t, &companion, &hash)
            })
            .unwrap();

        let completed = payouts.find(id).unwrap();
        assert_eq!(completed.tx_hash, Some(hash));
        let err = kit
            .ctx
            .store
            .read(|t| finalizer.verify(t, &companion))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RevenuePayoutCompleted);
    }
}
