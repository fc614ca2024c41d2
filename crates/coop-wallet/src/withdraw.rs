//! Withdraw lifecycle: the owner asks for funds back, signs a burn
//! approval, and the coop burns the tokens before wiring the money.
//!
//! ```text
//!   create ─▶ REQUESTED ─approval posted─▶ APPROVED ─burn posted─▶ BURNED
//!                 │                            │                     │
//!                 └────────── delete ──────────┘              attach_document
//! ```
//!
//! BURNED is terminal apart from attaching the bank-transfer proof.

use chrono::Utc;
use coop_gateway::notify_best_effort;
use coop_store::Tables;
use coop_types::{
    Amount, BankAccount, CompanionData, CoopError, ErrorCode, GeneratedTransaction, IntentKind,
    LedgerHash, NewDocument, NewWithdraw, Notification, Result, SignedPayload, UserId, Withdraw,
    WithdrawId,
};

use crate::context::Context;
use crate::finalizer::Finalizer;
use crate::intent::TransactionIntentRegistry;

#[derive(Clone)]
pub struct WithdrawManager {
    ctx: Context,
    intents: TransactionIntentRegistry,
    approval: BurnApprovalFinalizer,
    burn: BurnFinalizer,
}

impl WithdrawManager {
    pub fn new(ctx: Context, intents: TransactionIntentRegistry) -> Self {
        let approval = BurnApprovalFinalizer::new(ctx.coop());
        let burn = BurnFinalizer::new(ctx.coop());
        Self {
            ctx,
            intents,
            approval,
            burn,
        }
    }

    /// Request a withdraw of `amount` to `bank_account`.
    ///
    /// # Errors
    /// - `WALLET_WITHDRAW_AMOUNT` unless `amount` is positive
    /// - `WALLET_WITHDRAW_EXISTS` if the owner has an unburned withdraw
    /// - `WALLET_MISSING` / `WALLET_NOT_ACTIVATED`
    /// - `WALLET_FUNDS` if the ledger balance is below `amount`
    pub fn create(
        &self,
        owner: UserId,
        amount: Amount,
        bank_account: BankAccount,
    ) -> Result<Withdraw> {
        if amount <= 0 {
            return Err(CoopError::invalid(
                ErrorCode::WalletWithdrawAmount,
                format!("withdraw amount must be positive, got {amount}"),
            ));
        }
        let coop = self.ctx.coop();
        let hash = self.ctx.store.read(|tables| {
            ensure_no_open_withdraw(tables, owner, coop)?;
            self.ctx.activated_hash(tables, owner.into())
        })?;
        let balance = self.ctx.ledger.balance_or_zero(&hash)?;
        if balance < amount {
            return Err(CoopError::invalid(
                ErrorCode::WalletFunds,
                format!("balance {balance} is below withdraw amount {amount}"),
            ));
        }
        let withdraw = self.ctx.store.transaction(|tables| {
            tables.insert_withdraw(NewWithdraw {
                owner,
                amount,
                bank_account,
                coop: coop.to_string(),
            })
        })?;
        tracing::info!(withdraw = %withdraw.id, %owner, amount, "Withdraw requested");
        self.notify(Notification::WithdrawRequested {
            user: owner,
            withdraw: withdraw.id,
            amount,
        });
        Ok(withdraw)
    }

    /// Cancel a withdraw that has not been burned.
    ///
    /// # Errors
    /// `WALLET_WITHDRAW_MISSING`, `WALLET_WITHDRAW_BURNED`.
    pub fn delete(&self, id: WithdrawId) -> Result<()> {
        let withdraw = self.ctx.store.transaction(|tables| {
            load(tables, id, self.ctx.coop())?;
            tables.delete_withdraw(id)
        })?;
        tracing::info!(withdraw = %id, owner = %withdraw.owner, "Withdraw cancelled");
        self.notify(Notification::WithdrawCancelled {
            user: withdraw.owner,
            withdraw: id,
            amount: withdraw.amount,
        });
        Ok(())
    }

    /// Attach proof of the bank transfer to a burned withdraw. A second
    /// upload replaces the first.
    ///
    /// # Errors
    /// `WALLET_WITHDRAW_MISSING`, `WALLET_WITHDRAW_NOT_BURNED`.
    pub fn attach_document(
        &self,
        id: WithdrawId,
        document: NewDocument,
        uploader: UserId,
    ) -> Result<Withdraw> {
        let withdraw = self.ctx.store.transaction(|tables| {
            let mut withdraw = load(tables, id, self.ctx.coop())?.clone();
            if !withdraw.is_burned() {
                return Err(CoopError::invalid(
                    ErrorCode::WalletWithdrawNotBurned,
                    format!("{id} has not been burned"),
                ));
            }
            let document = tables.insert_document(document, uploader);
            withdraw.document = Some(document.id);
            tables.update_withdraw(withdraw.clone())?;
            Ok(withdraw)
        })?;
        tracing::info!(withdraw = %id, %uploader, "Withdraw document attached");
        Ok(withdraw)
    }

    // -------------------------------------------------------------------------
    // Burn approval (signed by the owner)
    // -------------------------------------------------------------------------

    /// # Errors
    /// - `WALLET_WITHDRAW_MISSING`
    /// - `WALLET_WITHDRAW_MISSING_PRIVILEGE` unless `requester` owns it
    /// - `WALLET_WITHDRAW_APPROVED` if already approved
    pub fn generate_approval(
        &self,
        id: WithdrawId,
        requester: UserId,
    ) -> Result<GeneratedTransaction> {
        let (withdraw, from) = self.ctx.store.read(|tables| {
            let withdraw = load(tables, id, self.ctx.coop())?;
            if withdraw.owner != requester {
                return Err(CoopError::invalid(
                    ErrorCode::WalletWithdrawMissingPrivilege,
                    format!("{requester} does not own {id}"),
                ));
            }
            ensure_unapproved(withdraw)?;
            let from = self.ctx.activated_hash(tables, withdraw.owner.into())?;
            Ok((withdraw.clone(), from))
        })?;
        let unsigned = self.ctx.ledger.build_approve_burn(&from, withdraw.amount)?;
        self.intents.issue(
            unsigned,
            IntentKind::BurnApproval,
            format!("Approve burn of {} for {id}", withdraw.amount),
            requester,
            CompanionData::IntegerId(id.0),
        )
    }

    pub fn confirm_approval(&self, id: WithdrawId, signed: &SignedPayload) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::BurnApproval,
            &self.approval,
            CompanionData::IntegerId(id.0),
            signed,
        )
    }

    // -------------------------------------------------------------------------
    // Burn (signed by the coop)
    // -------------------------------------------------------------------------

    /// Build the burn and stamp `requester` as the burner in the same
    /// transaction that records the intent.
    ///
    /// # Errors
    /// - `WALLET_WITHDRAW_MISSING`
    /// - `WALLET_WITHDRAW_NOT_APPROVED`, `WALLET_WITHDRAW_BURNED`
    pub fn generate_burn(&self, id: WithdrawId, requester: UserId) -> Result<GeneratedTransaction> {
        let coop = self.ctx.coop();
        let (withdraw, from) = self.ctx.store.read(|tables| {
            let withdraw = load(tables, id, coop)?;
            ensure_burnable(withdraw)?;
            let from = self.ctx.activated_hash(tables, withdraw.owner.into())?;
            Ok((withdraw.clone(), from))
        })?;
        let unsigned = self.ctx.ledger.build_burn(&from)?;
        let description = format!("Burn {} for {id}", withdraw.amount);
        let intent_id = self.ctx.store.transaction(|tables| {
            let mut withdraw = load(tables, id, coop)?.clone();
            ensure_burnable(&withdraw)?;
            withdraw.burned_by = Some(requester);
            tables.update_withdraw(withdraw)?;
            self.intents.create_in(
                tables,
                IntentKind::Burn,
                description.clone(),
                requester,
                CompanionData::IntegerId(id.0),
            )
        })?;
        tracing::info!(withdraw = %id, %requester, intent = %intent_id, "Withdraw burn generated");
        Ok(GeneratedTransaction {
            unsigned,
            intent_id,
            description,
        })
    }

    pub fn confirm_burn(&self, id: WithdrawId, signed: &SignedPayload) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::Burn,
            &self.burn,
            CompanionData::IntegerId(id.0),
            signed,
        )
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn find(&self, id: WithdrawId) -> Result<Withdraw> {
        self.ctx
            .store
            .read(|tables| load(tables, id, self.ctx.coop()).cloned())
    }

    pub fn find_by_owner(&self, owner: UserId) -> Result<Vec<Withdraw>> {
        self.select(|w| w.owner == owner)
    }

    /// Approved by the owner, waiting for the coop to burn.
    pub fn approved_unburned(&self) -> Result<Vec<Withdraw>> {
        self.select(|w| w.approved_tx_hash.is_some() && !w.is_burned())
    }

    pub fn burned(&self) -> Result<Vec<Withdraw>> {
        self.select(Withdraw::is_burned)
    }

    fn select(&self, keep: impl Fn(&Withdraw) -> bool) -> Result<Vec<Withdraw>> {
        self.ctx.store.read(|tables| {
            let mut rows: Vec<_> = tables
                .withdraws(self.ctx.coop())
                .filter(|w| keep(w))
                .cloned()
                .collect();
            rows.sort_by_key(|w| w.id);
            Ok(rows)
        })
    }

    fn notify(&self, notification: Notification) {
        notify_best_effort(self.ctx.notifier.as_ref(), &notification);
    }
}

fn load<'t>(tables: &'t Tables, id: WithdrawId, coop: &str) -> Result<&'t Withdraw> {
    tables
        .withdraw(id)
        .filter(|w| w.coop == coop)
        .ok_or_else(|| CoopError::not_found(ErrorCode::WalletWithdrawMissing, format!("{id}")))
}

fn ensure_no_open_withdraw(tables: &Tables, owner: UserId, coop: &str) -> Result<()> {
    match tables.open_withdraw(owner, coop) {
        Some(open) => Err(CoopError::already_exists(
            ErrorCode::WalletWithdrawExists,
            format!("{owner} already has open {}", open.id),
        )),
        None => Ok(()),
    }
}

fn ensure_unapproved(withdraw: &Withdraw) -> Result<()> {
    match &withdraw.approved_tx_hash {
        Some(tx_hash) => Err(CoopError::already_exists(
            ErrorCode::WalletWithdrawApproved,
            format!("{} already approved in {tx_hash}", withdraw.id),
        )),
        None => Ok(()),
    }
}

fn ensure_burnable(withdraw: &Withdraw) -> Result<()> {
    if withdraw.approved_tx_hash.is_none() {
        return Err(CoopError::invalid(
            ErrorCode::WalletWithdrawNotApproved,
            format!("{} is not approved for burning", withdraw.id),
        ));
    }
    match &withdraw.burned_tx_hash {
        Some(tx_hash) => Err(CoopError::already_exists(
            ErrorCode::WalletWithdrawBurned,
            format!("{} already burned in {tx_hash}", withdraw.id),
        )),
        None => Ok(()),
    }
}

// =============================================================================
// Finalizers
// =============================================================================

/// BURN_APPROVAL: record the owner's approval hash.
#[derive(Debug, Clone)]
pub struct BurnApprovalFinalizer {
    coop: String,
}

impl BurnApprovalFinalizer {
    pub fn new(coop: impl Into<String>) -> Self {
        Self { coop: coop.into() }
    }
}

impl Finalizer for BurnApprovalFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let id = WithdrawId(companion.integer_id()?);
        ensure_unapproved(load(tables, id, &self.coop)?)
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let id = WithdrawId(companion.integer_id()?);
        let mut withdraw = load(tables, id, &self.coop)?.clone();
        withdraw.approved_tx_hash = Some(tx_hash.clone());
        withdraw.approved_at = Some(Utc::now());
        let notification = Notification::WithdrawApproved {
            user: withdraw.owner,
            withdraw: id,
            amount: withdraw.amount,
        };
        tables.update_withdraw(withdraw)?;
        tracing::info!(withdraw = %id, %tx_hash, "Withdraw approved");
        Ok(Some(notification))
    }
}

/// BURN: record the burn hash on an approved withdraw.
#[derive(Debug, Clone)]
pub struct BurnFinalizer {
    coop: String,
}

impl BurnFinalizer {
    pub fn new(coop: impl Into<String>) -> Self {
        Self { coop: coop.into() }
    }
}

impl Finalizer for BurnFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let id = WithdrawId(companion.integer_id()?);
        ensure_burnable(load(tables, id, &self.coop)?)
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let id = WithdrawId(companion.integer_id()?);
        let mut withdraw = load(tables, id, &self.coop)?.clone();
        withdraw.burned_tx_hash = Some(tx_hash.clone());
        withdraw.burned_at = Some(Utc::now());
        let notification = Notification::WithdrawBurned {
            user: withdraw.owner,
            withdraw: id,
            amount: withdraw.amount,
        };
        tables.update_withdraw(withdraw)?;
        tracing::info!(withdraw = %id, %tx_hash, "Withdraw burned");
        Ok(Some(notification))
    }
}
