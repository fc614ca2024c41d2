//! Deposit lifecycle: a user announces a bank transfer, an admin matches
//! and approves it, and the approved amount is minted onto the user's
//! wallet.
//!
//! ```text
//!   create ─▶ PENDING ─approve─▶ APPROVED ─generate_mint/[sign]/confirm_mint─▶ MINTED
//!                │                  │
//!                └──── decline ─────┴──▶ DECLINED
//! ```

use chrono::Utc;
use coop_gateway::notify_best_effort;
use coop_store::Tables;
use coop_types::{
    Amount, CompanionData, CoopError, Deposit, DepositId, ErrorCode, GeneratedTransaction,
    IntentKind, LedgerHash, NewDeposit, NewDocument, Notification, Result, SignedPayload, UserId,
    UserInfo,
};
use serde::Serialize;

use crate::context::Context;
use crate::finalizer::Finalizer;
use crate::intent::TransactionIntentRegistry;
use crate::reference::generate_reference;

/// A pending deposit joined with its owner's directory entry. `user` is
/// `None` when the directory no longer knows the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositWithUser {
    pub deposit: Deposit,
    pub user: Option<UserInfo>,
}

#[derive(Clone)]
pub struct DepositManager {
    ctx: Context,
    intents: TransactionIntentRegistry,
    mint: MintFinalizer,
}

impl DepositManager {
    pub fn new(ctx: Context, intents: TransactionIntentRegistry) -> Self {
        let mint = MintFinalizer::new(ctx.coop());
        Self { ctx, intents, mint }
    }

    /// Open a deposit and hand the owner a bank-transfer reference code.
    ///
    /// # Errors
    /// - `WALLET_DEPOSIT_AMOUNT` unless `amount` is positive
    /// - `WALLET_MISSING` if the owner has no wallet
    /// - `WALLET_DEPOSIT_EXISTS` if the owner already has an unapproved
    ///   deposit, declined ones included
    pub fn create(&self, owner: UserId, amount: Amount) -> Result<Deposit> {
        ensure_positive(amount)?;
        let coop = self.ctx.coop();
        let deposit = self.ctx.store.transaction(|tables| {
            self.ctx.wallet_of(tables, owner.into())?;
            if let Some(open) = tables.unapproved_deposit(owner, coop) {
                return Err(CoopError::already_exists(
                    ErrorCode::WalletDepositExists,
                    format!("{owner} already has unapproved {}", open.id),
                ));
            }
            let reference = generate_reference(self.ctx.config.reference_code_length, |code| {
                tables.deposit_by_reference(code, coop).is_some()
            })?;
            tables.insert_deposit(NewDeposit {
                owner,
                reference,
                amount,
                created_by: owner,
                coop: coop.to_string(),
            })
        })?;
        tracing::info!(
            deposit = %deposit.id,
            %owner,
            amount,
            reference = %deposit.reference,
            "Deposit requested"
        );
        notify_best_effort(
            self.ctx.notifier.as_ref(),
            &Notification::DepositRequested {
                user: owner,
                deposit: deposit.id,
                reference: deposit.reference.clone(),
                amount,
            },
        );
        Ok(deposit)
    }

    /// Confirm the bank transfer arrived, fixing the amount to mint and
    /// attaching the proof. Approving twice before the mint is allowed and
    /// overwrites the first approval.
    ///
    /// # Errors
    /// - `WALLET_DEPOSIT_MISSING`
    /// - `WALLET_DEPOSIT_MINTED` once minted
    /// - `WALLET_DEPOSIT_DECLINED` once declined
    /// - `WALLET_DEPOSIT_AMOUNT` unless `amount` is positive
    pub fn approve(
        &self,
        id: DepositId,
        approver: UserId,
        amount: Amount,
        document: NewDocument,
    ) -> Result<Deposit> {
        ensure_positive(amount)?;
        let deposit = self.ctx.store.transaction(|tables| {
            let mut deposit = load(tables, id, self.ctx.coop())?.clone();
            ensure_not_minted(&deposit)?;
            if let Some(declined) = deposit.declined {
                return Err(CoopError::invalid(
                    ErrorCode::WalletDepositDeclined,
                    format!("{id} was declined ({declined})"),
                ));
            }
            let document = tables.insert_document(document, approver);
            deposit.approved = true;
            deposit.approved_by = Some(approver);
            deposit.approved_at = Some(Utc::now());
            deposit.amount = amount;
            deposit.document = Some(document.id);
            tables.update_deposit(deposit.clone())?;
            Ok(deposit)
        })?;
        tracing::info!(deposit = %id, %approver, amount, "Deposit approved");
        Ok(deposit)
    }

    /// Refuse a deposit that will not be minted.
    ///
    /// # Errors
    /// - `WALLET_DEPOSIT_MISSING`, `WALLET_DEPOSIT_MINTED`
    /// - `WALLET_DEPOSIT_EXISTS` when declining an approved deposit while the
    ///   owner already has another unapproved one
    pub fn decline(&self, id: DepositId, approver: UserId, comment: &str) -> Result<Deposit> {
        let deposit = self.ctx.store.transaction(|tables| {
            let mut deposit = load(tables, id, self.ctx.coop())?.clone();
            ensure_not_minted(&deposit)?;
            let declined = tables.insert_declined(comment, approver);
            deposit.declined = Some(declined.id);
            deposit.approved = false;
            tables.update_deposit(deposit.clone())?;
            Ok(deposit)
        })?;
        tracing::info!(deposit = %id, %approver, "Deposit declined");
        notify_best_effort(
            self.ctx.notifier.as_ref(),
            &Notification::DepositDeclined {
                user: deposit.owner,
                deposit: id,
                comment: comment.to_string(),
            },
        );
        Ok(deposit)
    }

    /// # Errors
    /// `WALLET_DEPOSIT_MISSING`, `WALLET_DEPOSIT_MINTED`.
    pub fn delete(&self, id: DepositId) -> Result<()> {
        self.ctx.store.transaction(|tables| {
            load(tables, id, self.ctx.coop())?;
            tables.delete_deposit(id).map(|_| ())
        })?;
        tracing::info!(deposit = %id, "Deposit deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Mint
    // -------------------------------------------------------------------------

    /// # Errors
    /// - `WALLET_DEPOSIT_MISSING`
    /// - `WALLET_DEPOSIT_NOT_APPROVED`, `WALLET_DEPOSIT_MINTED`
    /// - `WALLET_MISSING` / `WALLET_NOT_ACTIVATED` for the owner's wallet
    pub fn generate_mint(&self, id: DepositId, requester: UserId) -> Result<GeneratedTransaction> {
        let (deposit, to) = self.ctx.store.read(|tables| {
            let deposit = load(tables, id, self.ctx.coop())?;
            ensure_mintable(deposit)?;
            let to = self.ctx.activated_hash(tables, deposit.owner.into())?;
            Ok((deposit.clone(), to))
        })?;
        let unsigned = self.ctx.ledger.build_mint(&to, deposit.amount)?;
        self.intents.issue(
            unsigned,
            IntentKind::Mint,
            format!("Mint {} for deposit {}", deposit.amount, deposit.reference),
            requester,
            CompanionData::IntegerId(id.0),
        )
    }

    pub fn confirm_mint(&self, id: DepositId, signed: &SignedPayload) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::Mint,
            &self.mint,
            CompanionData::IntegerId(id.0),
            signed,
        )
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn find(&self, id: DepositId) -> Result<Deposit> {
        self.ctx
            .store
            .read(|tables| load(tables, id, self.ctx.coop()).cloned())
    }

    pub fn find_by_owner(&self, owner: UserId) -> Result<Vec<Deposit>> {
        self.select(|d| d.owner == owner)
    }

    pub fn find_by_reference(&self, reference: &str) -> Result<Option<Deposit>> {
        self.ctx.store.read(|tables| {
            Ok(tables
                .deposit_by_reference(reference, self.ctx.coop())
                .cloned())
        })
    }

    /// Deposits waiting for an admin decision.
    pub fn pending(&self) -> Result<Vec<Deposit>> {
        self.select(Deposit::is_pending)
    }

    pub fn approved_unminted(&self) -> Result<Vec<Deposit>> {
        self.select(|d| d.approved && !d.is_minted())
    }

    /// [`Self::pending`] joined with the user directory in one lookup.
    pub fn pending_with_users(&self) -> Result<Vec<DepositWithUser>> {
        let deposits = self.pending()?;
        let mut owners: Vec<UserId> = deposits.iter().map(|d| d.owner).collect();
        owners.sort_unstable();
        owners.dedup();
        let users = self.ctx.users.users(&owners)?;
        tracing::debug!(
            deposits = deposits.len(),
            users = users.len(),
            "Pending deposits resolved"
        );
        Ok(deposits
            .into_iter()
            .map(|deposit| {
                let user = users.iter().find(|u| u.id == deposit.owner).cloned();
                DepositWithUser { deposit, user }
            })
            .collect())
    }

    fn select(&self, keep: impl Fn(&Deposit) -> bool) -> Result<Vec<Deposit>> {
        self.ctx.store.read(|tables| {
            Ok(tables
                .deposits(self.ctx.coop())
                .filter(|d| keep(d))
                .cloned()
                .collect())
        })
    }
}

fn load<'t>(tables: &'t Tables, id: DepositId, coop: &str) -> Result<&'t Deposit> {
    tables
        .deposit(id)
        .filter(|d| d.coop == coop)
        .ok_or_else(|| CoopError::not_found(ErrorCode::WalletDepositMissing, format!("{id}")))
}

fn ensure_positive(amount: Amount) -> Result<()> {
    if amount <= 0 {
        return Err(CoopError::invalid(
            ErrorCode::WalletDepositAmount,
            format!("deposit amount must be positive, got {amount}"),
        ));
    }
    Ok(())
}

fn ensure_not_minted(deposit: &Deposit) -> Result<()> {
    match &deposit.tx_hash {
        Some(tx_hash) => Err(CoopError::already_exists(
            ErrorCode::WalletDepositMinted,
            format!("{} already minted in {tx_hash}", deposit.id),
        )),
        None => Ok(()),
    }
}

fn ensure_mintable(deposit: &Deposit) -> Result<()> {
    if !deposit.approved {
        return Err(CoopError::invalid(
            ErrorCode::WalletDepositNotApproved,
            format!("{} is not approved", deposit.id),
        ));
    }
    ensure_not_minted(deposit)
}

// =============================================================================
// MintFinalizer
// =============================================================================

/// MINT: record the mint hash on an approved deposit.
#[derive(Debug, Clone)]
pub struct MintFinalizer {
    coop: String,
}

impl MintFinalizer {
    pub fn new(coop: impl Into<String>) -> Self {
        Self { coop: coop.into() }
    }
}

impl Finalizer for MintFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let id = DepositId(companion.integer_id()?);
        ensure_mintable(load(tables, id, &self.coop)?)
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let id = DepositId(companion.integer_id()?);
        let mut deposit = load(tables, id, &self.coop)?.clone();
        deposit.tx_hash = Some(tx_hash.clone());
        let notification = Notification::DepositMinted {
            user: deposit.owner,
            deposit: id,
            amount: deposit.amount,
        };
        tables.update_deposit(deposit)?;
        tracing::info!(deposit = %id, %tx_hash, "Deposit minted");
        Ok(Some(notification))
    }
}
