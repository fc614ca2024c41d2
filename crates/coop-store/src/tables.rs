//! Record tables and their constraints.
//!
//! Each table enforces the uniqueness and terminal-state rules of its
//! record type, so a manager bug cannot persist a state the domain forbids:
//!
//! - wallets: one per (owner, coop), activation data unique per coop, hash
//!   never cleared
//! - deposits: one pending per owner, hash only on approved rows, minted rows
//!   frozen
//! - withdraws: one open per owner, burn only after approval, burned rows
//!   frozen except for the attached document
//! - payouts: completed rows frozen
//!
//! Integer keys come from per-table sequences starting at 1.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use coop_types::{
    Amount, CoopError, Declined, DeclinedId, Deposit, DepositId, Document, DocumentId, ErrorCode,
    IntentId, NewDeposit, NewDocument, NewWithdraw, OwnerId, ProjectId, Result, RevenuePayout,
    RevenuePayoutId, TransactionIntent, UserId, Wallet, WalletId, Withdraw, WithdrawId,
};

#[derive(Debug, Clone, Default)]
struct Sequences {
    deposit: i64,
    withdraw: i64,
    payout: i64,
    declined: i64,
    document: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// All persisted records. Only reachable through [`crate::Store`], which
/// hands out a working copy per transaction.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    wallets: HashMap<WalletId, Wallet>,
    deposits: BTreeMap<DepositId, Deposit>,
    withdraws: BTreeMap<WithdrawId, Withdraw>,
    intents: HashMap<IntentId, TransactionIntent>,
    payouts: BTreeMap<RevenuePayoutId, RevenuePayout>,
    declined: BTreeMap<DeclinedId, Declined>,
    documents: BTreeMap<DocumentId, Document>,
    sequences: Sequences,
}

impl Tables {
    // =================================================================
    // Wallets
    // =================================================================

    /// Insert a new wallet.
    ///
    /// # Errors
    /// - `WALLET_EXISTS` if the owner already has a wallet in this coop
    /// - `WALLET_HASH_EXISTS` if the activation data is already bound
    pub fn insert_wallet(&mut self, wallet: Wallet) -> Result<()> {
        if self.wallet_by_owner(wallet.owner, &wallet.coop).is_some() {
            return Err(CoopError::already_exists(
                ErrorCode::WalletExists,
                format!("{} already has a wallet in coop {}", wallet.owner, wallet.coop),
            ));
        }
        if self
            .wallet_by_activation_data(&wallet.activation_data, &wallet.coop)
            .is_some()
        {
            return Err(CoopError::already_exists(
                ErrorCode::WalletHashExists,
                "activation data is already bound to another wallet",
            ));
        }
        self.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    #[must_use]
    pub fn wallet(&self, id: WalletId) -> Option<&Wallet> {
        self.wallets.get(&id)
    }

    #[must_use]
    pub fn wallet_by_owner(&self, owner: OwnerId, coop: &str) -> Option<&Wallet> {
        self.wallets
            .values()
            .find(|w| w.owner == owner && w.coop == coop)
    }

    #[must_use]
    pub fn wallet_by_activation_data(&self, activation_data: &str, coop: &str) -> Option<&Wallet> {
        self.wallets
            .values()
            .find(|w| w.activation_data == activation_data && w.coop == coop)
    }

    pub fn wallets<'a>(&'a self, coop: &'a str) -> impl Iterator<Item = &'a Wallet> + 'a {
        self.wallets.values().filter(move |w| w.coop == coop)
    }

    /// Replace a wallet row. Identity columns are immutable and a recorded
    /// hash can be replaced but never cleared.
    pub fn update_wallet(&mut self, wallet: Wallet) -> Result<()> {
        let existing = self.wallets.get(&wallet.id).ok_or_else(|| {
            CoopError::not_found(ErrorCode::WalletMissing, format!("{}", wallet.id))
        })?;
        if existing.owner != wallet.owner
            || existing.coop != wallet.coop
            || existing.activation_data != wallet.activation_data
        {
            return Err(CoopError::internal(
                ErrorCode::IntStore,
                format!("{}: owner, coop and activation data are immutable", wallet.id),
            ));
        }
        if existing.hash.is_some() && wallet.hash.is_none() {
            return Err(CoopError::internal(
                ErrorCode::IntStore,
                format!("{}: ledger hash cannot be cleared", wallet.id),
            ));
        }
        self.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    // =================================================================
    // Deposits
    // =================================================================

    /// Insert a pending deposit.
    ///
    /// # Errors
    /// `WALLET_DEPOSIT_EXISTS` if the owner already has an unapproved deposit.
    pub fn insert_deposit(&mut self, new: NewDeposit) -> Result<Deposit> {
        if let Some(open) = self.unapproved_deposit(new.owner, &new.coop) {
            return Err(CoopError::already_exists(
                ErrorCode::WalletDepositExists,
                format!("{} already has unapproved {}", new.owner, open.id),
            ));
        }
        let deposit = Deposit {
            id: DepositId(next(&mut self.sequences.deposit)),
            owner: new.owner,
            reference: new.reference,
            amount: new.amount,
            approved: false,
            approved_by: None,
            approved_at: None,
            tx_hash: None,
            declined: None,
            document: None,
            created_by: new.created_by,
            created_at: Utc::now(),
            coop: new.coop,
        };
        self.deposits.insert(deposit.id, deposit.clone());
        Ok(deposit)
    }

    #[must_use]
    pub fn deposit(&self, id: DepositId) -> Option<&Deposit> {
        self.deposits.get(&id)
    }

    #[must_use]
    pub fn unapproved_deposit(&self, owner: UserId, coop: &str) -> Option<&Deposit> {
        self.deposits
            .values()
            .find(|d| d.owner == owner && d.coop == coop && d.is_unapproved())
    }

    #[must_use]
    pub fn deposit_by_reference(&self, reference: &str, coop: &str) -> Option<&Deposit> {
        self.deposits
            .values()
            .find(|d| d.reference == reference && d.coop == coop)
    }

    pub fn deposits<'a>(&'a self, coop: &'a str) -> impl Iterator<Item = &'a Deposit> + 'a {
        self.deposits.values().filter(move |d| d.coop == coop)
    }

    /// Replace a deposit row.
    ///
    /// # Errors
    /// - `WALLET_DEPOSIT_MISSING` if the row does not exist
    /// - `WALLET_DEPOSIT_MINTED` if the stored row is already minted
    /// - `WALLET_DEPOSIT_NOT_APPROVED` if a hash is set on an unapproved row
    /// - `WALLET_DEPOSIT_EXISTS` if the update would leave the owner with a
    ///   second unapproved row
    pub fn update_deposit(&mut self, deposit: Deposit) -> Result<()> {
        let existing = self.deposits.get(&deposit.id).ok_or_else(|| {
            CoopError::not_found(ErrorCode::WalletDepositMissing, format!("{}", deposit.id))
        })?;
        if existing.is_minted() {
            return Err(CoopError::already_exists(
                ErrorCode::WalletDepositMinted,
                format!("{} is already minted", deposit.id),
            ));
        }
        if deposit.tx_hash.is_some() && !deposit.approved {
            return Err(CoopError::invalid(
                ErrorCode::WalletDepositNotApproved,
                format!("{} cannot carry a mint hash before approval", deposit.id),
            ));
        }
        if deposit.is_unapproved() {
            if let Some(other) = self.unapproved_deposit(deposit.owner, &deposit.coop) {
                if other.id != deposit.id {
                    return Err(CoopError::already_exists(
                        ErrorCode::WalletDepositExists,
                        format!("{} already has unapproved {}", deposit.owner, other.id),
                    ));
                }
            }
        }
        self.deposits.insert(deposit.id, deposit);
        Ok(())
    }

    /// Remove a deposit that has not been minted.
    pub fn delete_deposit(&mut self, id: DepositId) -> Result<Deposit> {
        let existing = self
            .deposits
            .get(&id)
            .ok_or_else(|| CoopError::not_found(ErrorCode::WalletDepositMissing, format!("{id}")))?;
        if existing.is_minted() {
            return Err(CoopError::already_exists(
                ErrorCode::WalletDepositMinted,
                format!("{id} is minted and cannot be deleted"),
            ));
        }
        self.deposits
            .remove(&id)
            .ok_or_else(|| CoopError::not_found(ErrorCode::WalletDepositMissing, format!("{id}")))
    }

    // =================================================================
    // Withdraws
    // =================================================================

    /// Insert a requested withdraw.
    ///
    /// # Errors
    /// `WALLET_WITHDRAW_EXISTS` if the owner already has an open withdraw.
    pub fn insert_withdraw(&mut self, new: NewWithdraw) -> Result<Withdraw> {
        if let Some(open) = self.open_withdraw(new.owner, &new.coop) {
            return Err(CoopError::already_exists(
                ErrorCode::WalletWithdrawExists,
                format!("{} already has open {}", new.owner, open.id),
            ));
        }
        let withdraw = Withdraw {
            id: WithdrawId(next(&mut self.sequences.withdraw)),
            owner: new.owner,
            amount: new.amount,
            bank_account: new.bank_account,
            approved_tx_hash: None,
            approved_at: None,
            burned_tx_hash: None,
            burned_at: None,
            burned_by: None,
            document: None,
            created_at: Utc::now(),
            coop: new.coop,
        };
        self.withdraws.insert(withdraw.id, withdraw.clone());
        Ok(withdraw)
    }

    #[must_use]
    pub fn withdraw(&self, id: WithdrawId) -> Option<&Withdraw> {
        self.withdraws.get(&id)
    }

    #[must_use]
    pub fn open_withdraw(&self, owner: UserId, coop: &str) -> Option<&Withdraw> {
        self.withdraws
            .values()
            .find(|w| w.owner == owner && w.coop == coop && w.is_open())
    }

    pub fn withdraws<'a>(&'a self, coop: &'a str) -> impl Iterator<Item = &'a Withdraw> + 'a {
        self.withdraws.values().filter(move |w| w.coop == coop)
    }

    /// Replace a withdraw row.
    ///
    /// # Errors
    /// - `WALLET_WITHDRAW_MISSING` if the row does not exist
    /// - `WALLET_WITHDRAW_NOT_APPROVED` if a burn hash is set without approval
    /// - `WALLET_WITHDRAW_BURNED` if a burned row changes anything but its document
    pub fn update_withdraw(&mut self, withdraw: Withdraw) -> Result<()> {
        let existing = self.withdraws.get(&withdraw.id).ok_or_else(|| {
            CoopError::not_found(ErrorCode::WalletWithdrawMissing, format!("{}", withdraw.id))
        })?;
        if withdraw.burned_tx_hash.is_some() && withdraw.approved_tx_hash.is_none() {
            return Err(CoopError::invalid(
                ErrorCode::WalletWithdrawNotApproved,
                format!("{} cannot be burned before approval", withdraw.id),
            ));
        }
        if existing.is_burned() {
            let mut allowed = existing.clone();
            allowed.document = withdraw.document;
            if allowed != withdraw {
                return Err(CoopError::already_exists(
                    ErrorCode::WalletWithdrawBurned,
                    format!("{} is already burned", withdraw.id),
                ));
            }
        }
        self.withdraws.insert(withdraw.id, withdraw);
        Ok(())
    }

    /// Remove a withdraw that has not been burned.
    pub fn delete_withdraw(&mut self, id: WithdrawId) -> Result<Withdraw> {
        let existing = self.withdraws.get(&id).ok_or_else(|| {
            CoopError::not_found(ErrorCode::WalletWithdrawMissing, format!("{id}"))
        })?;
        if existing.is_burned() {
            return Err(CoopError::already_exists(
                ErrorCode::WalletWithdrawBurned,
                format!("{id} is burned and cannot be deleted"),
            ));
        }
        self.withdraws
            .remove(&id)
            .ok_or_else(|| CoopError::not_found(ErrorCode::WalletWithdrawMissing, format!("{id}")))
    }

    // =================================================================
    // Transaction intents
    // =================================================================

    pub fn insert_intent(&mut self, intent: TransactionIntent) -> Result<()> {
        if self.intents.contains_key(&intent.id) {
            return Err(CoopError::internal(
                ErrorCode::IntStore,
                format!("duplicate intent id {}", intent.id),
            ));
        }
        self.intents.insert(intent.id, intent);
        Ok(())
    }

    #[must_use]
    pub fn intent(&self, id: IntentId) -> Option<&TransactionIntent> {
        self.intents.get(&id)
    }

    /// Remove an intent, returning it if it was present.
    pub fn delete_intent(&mut self, id: IntentId) -> Option<TransactionIntent> {
        self.intents.remove(&id)
    }

    pub fn intents<'a>(
        &'a self,
        coop: &'a str,
    ) -> impl Iterator<Item = &'a TransactionIntent> + 'a {
        self.intents.values().filter(move |i| i.coop == coop)
    }

    // =================================================================
    // Revenue payouts
    // =================================================================

    pub fn insert_payout(
        &mut self,
        project: ProjectId,
        amount: Amount,
        created_by: UserId,
        coop: &str,
    ) -> RevenuePayout {
        let payout = RevenuePayout {
            id: RevenuePayoutId(next(&mut self.sequences.payout)),
            project,
            amount,
            created_by,
            created_at: Utc::now(),
            tx_hash: None,
            completed_at: None,
            coop: coop.to_string(),
        };
        self.payouts.insert(payout.id, payout.clone());
        payout
    }

    #[must_use]
    pub fn payout(&self, id: RevenuePayoutId) -> Option<&RevenuePayout> {
        self.payouts.get(&id)
    }

    pub fn payouts<'a>(&'a self, coop: &'a str) -> impl Iterator<Item = &'a RevenuePayout> + 'a {
        self.payouts.values().filter(move |p| p.coop == coop)
    }

    /// Replace a payout row.
    ///
    /// # Errors
    /// - `REVENUE_PAYOUT_MISSING` if the row does not exist
    /// - `REVENUE_PAYOUT_COMPLETED` if the stored row is already completed
    pub fn update_payout(&mut self, payout: RevenuePayout) -> Result<()> {
        let existing = self.payouts.get(&payout.id).ok_or_else(|| {
            CoopError::not_found(ErrorCode::RevenuePayoutMissing, format!("{}", payout.id))
        })?;
        if existing.is_completed() {
            return Err(CoopError::already_exists(
                ErrorCode::RevenuePayoutCompleted,
                format!("{} is already completed", payout.id),
            ));
        }
        self.payouts.insert(payout.id, payout);
        Ok(())
    }

    // =================================================================
    // Declines & documents
    // =================================================================

    pub fn insert_declined(&mut self, comment: impl Into<String>, created_by: UserId) -> Declined {
        let declined = Declined {
            id: DeclinedId(next(&mut self.sequences.declined)),
            comment: comment.into(),
            created_by,
            created_at: Utc::now(),
        };
        self.declined.insert(declined.id, declined.clone());
        declined
    }

    #[must_use]
    pub fn declined(&self, id: DeclinedId) -> Option<&Declined> {
        self.declined.get(&id)
    }

    pub fn insert_document(&mut self, new: NewDocument, created_by: UserId) -> Document {
        let document = Document {
            id: DocumentId(next(&mut self.sequences.document)),
            link: new.link,
            name: new.name,
            content_type: new.content_type,
            size: new.size,
            created_by,
            created_at: Utc::now(),
        };
        self.documents.insert(document.id, document.clone());
        document
    }

    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }
}
