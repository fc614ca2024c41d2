//! Investment admission.
//!
//! Gate in front of every invest transaction. Checks run in a fixed order
//! and stop at the first failure:
//!
//! 1. project active                       `PRJ_NOT_ACTIVE`
//! 2. now <= end date                      `PRJ_DATE_EXPIRED`
//! 3. amount <= max per user               `PRJ_MAX_PER_USER`
//! 4. amount >= min per user               `PRJ_MIN_PER_USER`
//! 5. investor balance >= amount           `WALLET_FUNDS`
//! 6. project balance != expected funding  `PRJ_MAX_FUNDS`
//!
//! Rule 6 is an exact comparison: a project already above its target still
//! admits investments.
//!
//! Invest and cancel-investment intents carry no companion data; the
//! ledger contract is the only record of an investment.

use chrono::{DateTime, Utc};
use coop_types::{
    Amount, CompanionData, CoopError, ErrorCode, GeneratedTransaction, IntentKind, LedgerHash,
    ProjectId, ProjectInfo, Result, UserId,
};

use crate::context::Context;
use crate::intent::TransactionIntentRegistry;

#[derive(Clone)]
pub struct InvestmentAdmission {
    ctx: Context,
    intents: TransactionIntentRegistry,
}

impl InvestmentAdmission {
    pub fn new(ctx: Context, intents: TransactionIntentRegistry) -> Self {
        Self { ctx, intents }
    }

    /// Run the admission checks and, if they pass, build the invest
    /// transaction.
    ///
    /// # Errors
    /// `PRJ_MISSING`, the admission codes listed in the module docs, and
    /// `WALLET_MISSING` / `WALLET_NOT_ACTIVATED` for either wallet.
    pub fn generate_invest_in_project_transaction(
        &self,
        project: ProjectId,
        investor: UserId,
        amount: Amount,
    ) -> Result<GeneratedTransaction> {
        let info = self.ctx.projects.project(project)?;
        check_project_rules(&info, amount, Utc::now())?;
        let (investor_hash, project_hash) = self.wallets(investor, project)?;
        let investor_balance = self.ctx.ledger.balance_or_zero(&investor_hash)?;
        let project_balance = self.ctx.ledger.balance_or_zero(&project_hash)?;
        check_funds(amount, investor_balance, project_balance, info.expected_funding)?;
        tracing::debug!(%project, %investor, amount, project_balance, "Investment admitted");

        let unsigned = self
            .ctx
            .ledger
            .build_invest(&investor_hash, &project_hash, amount)?;
        self.intents.issue(
            unsigned,
            IntentKind::Invest,
            format!("Invest {amount} in project {}", info.name),
            investor,
            CompanionData::None,
        )
    }

    /// Build the transaction that returns the investor's stake.
    pub fn generate_cancel_investment(
        &self,
        project: ProjectId,
        investor: UserId,
    ) -> Result<GeneratedTransaction> {
        let info = self.ctx.projects.project(project)?;
        let (investor_hash, project_hash) = self.wallets(investor, project)?;
        let unsigned = self
            .ctx
            .ledger
            .build_cancel_investment(&investor_hash, &project_hash)?;
        self.intents.issue(
            unsigned,
            IntentKind::CancelInvestment,
            format!("Cancel investment in project {}", info.name),
            investor,
            CompanionData::None,
        )
    }

    fn wallets(&self, investor: UserId, project: ProjectId) -> Result<(LedgerHash, LedgerHash)> {
        self.ctx.store.read(|tables| {
            Ok((
                self.ctx.activated_hash(tables, investor.into())?,
                self.ctx.activated_hash(tables, project.into())?,
            ))
        })
    }
}

/// Rules 1 to 4: everything decided by project metadata alone.
pub fn check_project_rules(
    project: &ProjectInfo,
    amount: Amount,
    now: DateTime<Utc>,
) -> Result<()> {
    if !project.active {
        return Err(CoopError::invalid(
            ErrorCode::PrjNotActive,
            format!("{} is not active", project.id),
        ));
    }
    if now > project.end_date {
        return Err(CoopError::invalid(
            ErrorCode::PrjDateExpired,
            format!("{} ended at {}", project.id, project.end_date),
        ));
    }
    if amount > project.max_per_user {
        return Err(CoopError::invalid(
            ErrorCode::PrjMaxPerUser,
            format!("{amount} exceeds the per-user maximum {}", project.max_per_user),
        ));
    }
    if amount < project.min_per_user {
        return Err(CoopError::invalid(
            ErrorCode::PrjMinPerUser,
            format!("{amount} is below the per-user minimum {}", project.min_per_user),
        ));
    }
    Ok(())
}

/// Rules 5 and 6: ledger balances.
pub fn check_funds(
    amount: Amount,
    investor_balance: Amount,
    project_balance: Amount,
    expected_funding: Amount,
) -> Result<()> {
    if investor_balance < amount {
        return Err(CoopError::invalid(
            ErrorCode::WalletFunds,
            format!("balance {investor_balance} is below investment {amount}"),
        ));
    }
    if project_balance == expected_funding {
        return Err(CoopError::invalid(
            ErrorCode::PrjMaxFunds,
            format!("project already holds its expected funding {expected_funding}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration;
    use coop_types::{OrganizationId, WalletKind};

    use crate::testkit::Kit;

    fn project() -> ProjectInfo {
        ProjectInfo::dummy(OrganizationId::new(), UserId::new())
    }

    fn admission(kit: &Kit) -> InvestmentAdmission {
        let intents = TransactionIntentRegistry::new(Arc::clone(&kit.ctx.store), kit.ctx.coop());
        InvestmentAdmission::new(kit.ctx.clone(), intents)
    }

    #[test]
    fn inactive_project_fails_first() {
        let mut p = project();
        p.active = false;
        p.end_date = Utc::now() - Duration::days(1);
        let err = check_project_rules(&p, 0, Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrjNotActive);
    }

    #[test]
    fn end_date_is_inclusive() {
        let p = project();
        assert!(check_project_rules(&p, 500, p.end_date).is_ok());
        let err = check_project_rules(&p, 500, p.end_date + Duration::milliseconds(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrjDateExpired);
    }

    #[test]
    fn per_user_limits_are_inclusive() {
        let p = project();
        let now = Utc::now();
        assert!(check_project_rules(&p, p.max_per_user, now).is_ok());
        assert!(check_project_rules(&p, p.min_per_user, now).is_ok());
        assert_eq!(
            check_project_rules(&p, p.max_per_user + 1, now).unwrap_err().code(),
            ErrorCode::PrjMaxPerUser
        );
        assert_eq!(
            check_project_rules(&p, p.min_per_user - 1, now).unwrap_err().code(),
            ErrorCode::PrjMinPerUser
        );
    }

    #[test]
    fn max_checked_before_min() {
        let mut p = project();
        p.min_per_user = 5_000;
        p.max_per_user = 1_000;
        let err = check_project_rules(&p, 2_000, Utc::now()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrjMaxPerUser);
    }

    #[test]
    fn investor_funds_boundary() {
        assert!(check_funds(500, 500, 0, 100_000).is_ok());
        assert_eq!(
            check_funds(500, 499, 0, 100_000).unwrap_err().code(),
            ErrorCode::WalletFunds
        );
    }

    #[test]
    fn max_funds_is_exact_equality() {
        assert_eq!(
            check_funds(100, 1_000, 100_000, 100_000).unwrap_err().code(),
            ErrorCode::PrjMaxFunds
        );
        assert!(check_funds(100, 1_000, 99_999, 100_000).is_ok());
        assert!(check_funds(100, 1_000, 100_001, 100_000).is_ok());
    }

    #[test]
    fn funds_checked_before_project_balance() {
        let err = check_funds(500, 0, 100_000, 100_000).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WalletFunds);
    }

    #[test]
    fn generate_invest_builds_payload_without_companion() {
        let kit = Kit::new();
        let (investor, investor_hash) = kit.user();
        let (owner, _) = kit.user();
        let (project, project_hash) = kit.project(owner);
        kit.ledger.set_balance(&investor_hash, 5_000);

        let generated = admission(&kit)
            .generate_invest_in_project_transaction(project.id, investor, 1_000)
            .unwrap();

        assert_eq!(
            generated.unsigned.0,
            format!("invest:{investor_hash}:{project_hash}:1000")
        );
        let intent = kit
            .ctx
            .store
            .read(|t| Ok(t.intent(generated.intent_id).cloned()))
            .unwrap()
            .unwrap();
        assert_eq!(intent.kind, IntentKind::Invest);
        assert_eq!(intent.companion, CompanionData::None);
        assert_eq!(intent.requester, investor);
    }

    #[test]
    fn rejected_admission_builds_nothing() {
        let kit = Kit::new();
        let (investor, _) = kit.user();
        let (owner, _) = kit.user();
        let (project, _) = kit.project(owner);
        kit.ledger.fail_builds(true);

        let err = admission(&kit)
            .generate_invest_in_project_transaction(project.id, investor, 1_000)
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::WalletFunds);
    }

    #[test]
    fn unknown_project_is_missing() {
        let kit = Kit::new();
        let (investor, _) = kit.user();
        let err = admission(&kit)
            .generate_invest_in_project_transaction(ProjectId::new(), investor, 1_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrjMissing);
    }

    #[test]
    fn cancel_investment_needs_activated_project_wallet() {
        let kit = Kit::new();
        let (investor, investor_hash) = kit.user();
        let (owner, _) = kit.user();
        let (project, project_hash) = kit.project(owner);
        let admission = admission(&kit);

        let generated = admission
            .generate_cancel_investment(project.id, investor)
            .unwrap();
        assert_eq!(
            generated.unsigned.0,
            format!("cancel_investment:{investor_hash}:{project_hash}")
        );

        let stranger = UserId::new();
        kit.ctx
            .store
            .transaction(|t| {
                t.insert_wallet(coop_types::Wallet::new(
                    stranger.into(),
                    WalletKind::User,
                    "pk_stranger",
                    coop_types::Currency::Eur,
                    kit.ctx.coop(),
                ))
            })
            .unwrap();
        let err = admission
            .generate_cancel_investment(project.id, stranger)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::WalletNotActivated);
    }
}
