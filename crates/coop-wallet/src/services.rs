//! Composition root: wires one coop's managers, the intent registry and
//! the dispatcher around a shared [`Context`].

use std::sync::Arc;

use coop_types::IntentKind;

use crate::context::Context;
use crate::deposit::{DepositManager, MintFinalizer};
use crate::dispatcher::BroadcastDispatcher;
use crate::finalizer::{Finalizer, FinalizerRegistry, StatelessFinalizer};
use crate::intent::TransactionIntentRegistry;
use crate::investment::InvestmentAdmission;
use crate::revenue::{RevenuePayoutFinalizer, RevenuePayoutManager};
use crate::wallet::{ActivationFinalizer, CreatedWalletFinalizer, WalletManager};
use crate::withdraw::{BurnApprovalFinalizer, BurnFinalizer, WithdrawManager};

/// One finalizer per [`IntentKind`].
#[derive(Debug, Clone)]
pub struct Finalizers {
    activation: ActivationFinalizer,
    organization: CreatedWalletFinalizer,
    project: CreatedWalletFinalizer,
    stateless: StatelessFinalizer,
    mint: MintFinalizer,
    burn_approval: BurnApprovalFinalizer,
    burn: BurnFinalizer,
    revenue_payout: RevenuePayoutFinalizer,
}

impl Finalizers {
    pub fn new(ctx: &Context) -> Self {
        let coop = ctx.coop();
        Self {
            activation: ActivationFinalizer::new(coop),
            organization: CreatedWalletFinalizer::organization(ctx),
            project: CreatedWalletFinalizer::project(ctx),
            stateless: StatelessFinalizer,
            mint: MintFinalizer::new(coop),
            burn_approval: BurnApprovalFinalizer::new(coop),
            burn: BurnFinalizer::new(coop),
            revenue_payout: RevenuePayoutFinalizer::new(coop),
        }
    }
}

impl FinalizerRegistry for Finalizers {
    fn finalizer(&self, kind: IntentKind) -> &dyn Finalizer {
        match kind {
            IntentKind::Activate => &self.activation,
            IntentKind::CreateOrg => &self.organization,
            IntentKind::CreateProject => &self.project,
            IntentKind::Invest | IntentKind::CancelInvestment => &self.stateless,
            IntentKind::Mint => &self.mint,
            IntentKind::BurnApproval => &self.burn_approval,
            IntentKind::Burn => &self.burn,
            IntentKind::RevenuePayout => &self.revenue_payout,
        }
    }
}

/// Every public operation of one coop.
#[derive(Clone)]
pub struct CoopServices {
    pub intents: TransactionIntentRegistry,
    pub dispatcher: BroadcastDispatcher,
    pub wallets: WalletManager,
    pub deposits: DepositManager,
    pub withdraws: WithdrawManager,
    pub investments: InvestmentAdmission,
    pub payouts: RevenuePayoutManager,
}

impl CoopServices {
    pub fn new(ctx: Context) -> Self {
        let intents = TransactionIntentRegistry::new(Arc::clone(&ctx.store), ctx.coop());
        let registry = Arc::new(Finalizers::new(&ctx));
        tracing::info!(coop = ctx.coop(), "Coop services ready");
        Self {
            dispatcher: BroadcastDispatcher::new(ctx.clone(), registry),
            wallets: WalletManager::new(ctx.clone(), intents.clone()),
            deposits: DepositManager::new(ctx.clone(), intents.clone()),
            withdraws: WithdrawManager::new(ctx.clone(), intents.clone()),
            investments: InvestmentAdmission::new(ctx.clone(), intents.clone()),
            payouts: RevenuePayoutManager::new(ctx, intents.clone()),
            intents,
        }
    }
}
