//! Wallet lifecycle: creation, activation, and the organization/project
//! wallets that come into existence when their contract is deployed.
//!
//! ```text
//!   user:     create_wallet ─▶ generate_activation ─▶ [sign] ─▶ confirm ─▶ ACTIVATED
//!   org:      generate_create_organization_wallet ──▶ [sign] ─▶ confirm ─▶ ACTIVATED
//!   project:  generate_create_project_wallet ───────▶ [sign] ─▶ confirm ─▶ ACTIVATED
//! ```
//!
//! Organization and project wallets have no separate activation step: the
//! contract deployment hash doubles as activation data and ledger address.

use chrono::Utc;
use coop_store::Tables;
use coop_types::{
    Amount, CompanionData, CoopError, CreateProjectParams, Currency, ErrorCode,
    GeneratedTransaction, IntentKind, LedgerHash, Notification, OrganizationId, OwnerId,
    ProjectId, Result, SignedPayload, UserId, Wallet, WalletId, WalletKind,
};

use crate::context::Context;
use crate::finalizer::Finalizer;
use crate::intent::TransactionIntentRegistry;

// =============================================================================
// WalletManager
// =============================================================================

#[derive(Clone)]
pub struct WalletManager {
    ctx: Context,
    intents: TransactionIntentRegistry,
    activation: ActivationFinalizer,
    organization: CreatedWalletFinalizer,
    project: CreatedWalletFinalizer,
}

impl WalletManager {
    pub fn new(ctx: Context, intents: TransactionIntentRegistry) -> Self {
        let activation = ActivationFinalizer::new(ctx.coop());
        let organization = CreatedWalletFinalizer::organization(&ctx);
        let project = CreatedWalletFinalizer::project(&ctx);
        Self {
            ctx,
            intents,
            activation,
            organization,
            project,
        }
    }

    /// Register an unactivated wallet for `owner`.
    ///
    /// # Errors
    /// - `WALLET_EXISTS` if the owner already has a wallet in this coop
    /// - `WALLET_HASH_EXISTS` if the activation data belongs to another wallet
    pub fn create_wallet(
        &self,
        owner: impl Into<OwnerId>,
        activation_data: &str,
        kind: WalletKind,
    ) -> Result<Wallet> {
        let wallet = Wallet::new(
            owner.into(),
            kind,
            activation_data,
            self.ctx.config.currency,
            self.ctx.coop(),
        );
        self.ctx
            .store
            .transaction(|tables| tables.insert_wallet(wallet.clone()))?;
        tracing::info!(wallet = %wallet.id, owner = ?wallet.owner, %kind, "Wallet created");
        Ok(wallet)
    }

    pub fn find(&self, id: WalletId) -> Result<Wallet> {
        self.ctx
            .store
            .read(|tables| load(tables, id, self.ctx.coop()).cloned())
    }

    pub fn find_by_owner(&self, owner: impl Into<OwnerId>) -> Result<Option<Wallet>> {
        let owner = owner.into();
        self.ctx
            .store
            .read(|tables| Ok(tables.wallet_by_owner(owner, self.ctx.coop()).cloned()))
    }

    /// Wallets of `kind` still waiting for activation, oldest first.
    pub fn unactivated(&self, kind: WalletKind) -> Result<Vec<Wallet>> {
        self.ctx.store.read(|tables| {
            let mut wallets: Vec<_> = tables
                .wallets(self.ctx.coop())
                .filter(|w| w.kind == kind && !w.is_activated())
                .cloned()
                .collect();
            wallets.sort_by_key(|w| (w.created_at, w.id));
            Ok(wallets)
        })
    }

    /// Ledger balance of the owner's activated wallet; an address the ledger
    /// has never seen holds zero.
    pub fn balance(&self, owner: impl Into<OwnerId>) -> Result<Amount> {
        let owner = owner.into();
        let hash = self
            .ctx
            .store
            .read(|tables| self.ctx.activated_hash(tables, owner))?;
        self.ctx.ledger.balance_or_zero(&hash)
    }

    // -------------------------------------------------------------------------
    // Activation
    // -------------------------------------------------------------------------

    pub fn generate_activation(
        &self,
        wallet: WalletId,
        requester: UserId,
    ) -> Result<GeneratedTransaction> {
        let found = self.find(wallet)?;
        let unsigned = self.ctx.ledger.build_activation(&found.activation_data)?;
        self.intents.issue(
            unsigned,
            IntentKind::Activate,
            format!("Activate {} wallet", found.kind),
            requester,
            CompanionData::StructuredId(wallet.as_uuid()),
        )
    }

    pub fn confirm_activation(
        &self,
        wallet: WalletId,
        signed: &SignedPayload,
    ) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::Activate,
            &self.activation,
            CompanionData::StructuredId(wallet.as_uuid()),
            signed,
        )
    }

    // -------------------------------------------------------------------------
    // Organization wallet
    // -------------------------------------------------------------------------

    /// # Errors
    /// - `ORG_MISSING`, `ORG_MISSING_PRIVILEGE` unless `requester` owns it
    /// - `WALLET_EXISTS` if the organization already has a wallet
    /// - `WALLET_MISSING` / `WALLET_NOT_ACTIVATED` for the requester's wallet
    pub fn generate_create_organization_wallet(
        &self,
        organization: OrganizationId,
        requester: UserId,
    ) -> Result<GeneratedTransaction> {
        let info = self.ctx.projects.organization(organization)?;
        if info.owner != requester {
            return Err(CoopError::invalid(
                ErrorCode::OrgMissingPrivilege,
                format!("{requester} does not own {organization}"),
            ));
        }
        let user_hash = self.ctx.store.read(|tables| {
            ensure_no_wallet(tables, organization.into(), self.ctx.coop())?;
            self.ctx.activated_hash(tables, requester.into())
        })?;
        let unsigned = self.ctx.ledger.build_create_organization(&user_hash)?;
        self.intents.issue(
            unsigned,
            IntentKind::CreateOrg,
            format!("Create wallet for organization {}", info.name),
            requester,
            CompanionData::StructuredId(organization.as_uuid()),
        )
    }

    pub fn confirm_create_organization_wallet(
        &self,
        organization: OrganizationId,
        signed: &SignedPayload,
    ) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::CreateOrg,
            &self.organization,
            CompanionData::StructuredId(organization.as_uuid()),
            signed,
        )
    }

    // -------------------------------------------------------------------------
    // Project wallet
    // -------------------------------------------------------------------------

    /// # Errors
    /// - `PRJ_MISSING`, `PRJ_MISSING_PRIVILEGE` unless `requester` owns it
    /// - `WALLET_EXISTS` if the project already has a wallet
    /// - `WALLET_MISSING` / `WALLET_NOT_ACTIVATED` for the requester's or
    ///   the organization's wallet
    pub fn generate_create_project_wallet(
        &self,
        project: ProjectId,
        requester: UserId,
    ) -> Result<GeneratedTransaction> {
        let info = self.ctx.projects.project(project)?;
        if info.owner != requester {
            return Err(CoopError::invalid(
                ErrorCode::PrjMissingPrivilege,
                format!("{requester} does not own {project}"),
            ));
        }
        let (user_hash, organization_hash) = self.ctx.store.read(|tables| {
            ensure_no_wallet(tables, project.into(), self.ctx.coop())?;
            Ok((
                self.ctx.activated_hash(tables, requester.into())?,
                self.ctx.activated_hash(tables, info.organization.into())?,
            ))
        })?;
        let params = CreateProjectParams {
            user: user_hash,
            organization: organization_hash,
            min_per_user: info.min_per_user,
            max_per_user: info.max_per_user,
            expected_funding: info.expected_funding,
            end_date: info.end_date,
        };
        let unsigned = self.ctx.ledger.build_create_project(&params)?;
        self.intents.issue(
            unsigned,
            IntentKind::CreateProject,
            format!("Create wallet for project {}", info.name),
            requester,
            CompanionData::StructuredId(project.as_uuid()),
        )
    }

    pub fn confirm_create_project_wallet(
        &self,
        project: ProjectId,
        signed: &SignedPayload,
    ) -> Result<LedgerHash> {
        self.ctx.confirm_direct(
            IntentKind::CreateProject,
            &self.project,
            CompanionData::StructuredId(project.as_uuid()),
            signed,
        )
    }
}

fn load<'t>(tables: &'t Tables, id: WalletId, coop: &str) -> Result<&'t Wallet> {
    tables
        .wallet(id)
        .filter(|w| w.coop == coop)
        .ok_or_else(|| CoopError::not_found(ErrorCode::WalletMissing, format!("{id}")))
}

fn ensure_no_wallet(tables: &Tables, owner: OwnerId, coop: &str) -> Result<()> {
    match tables.wallet_by_owner(owner, coop) {
        Some(existing) => Err(CoopError::already_exists(
            ErrorCode::WalletExists,
            format!("{} wallet {} already exists", existing.kind, existing.id),
        )),
        None => Ok(()),
    }
}

// =============================================================================
// Finalizers
// =============================================================================

/// ACTIVATE: record the ledger address on an existing wallet.
#[derive(Debug, Clone)]
pub struct ActivationFinalizer {
    coop: String,
}

impl ActivationFinalizer {
    pub fn new(coop: impl Into<String>) -> Self {
        Self { coop: coop.into() }
    }
}

impl Finalizer for ActivationFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let id = WalletId::from(companion.structured_id()?);
        load(tables, id, &self.coop).map(|_| ())
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let id = WalletId::from(companion.structured_id()?);
        let mut wallet = load(tables, id, &self.coop)?.clone();
        if let Some(previous) = &wallet.hash {
            // Not rejected: the ledger already accepted the transaction.
            tracing::warn!(wallet = %id, %previous, %tx_hash, "Wallet re-activated");
        }
        wallet.activate(tx_hash.clone(), Utc::now());
        let notification = Notification::WalletActivated {
            owner: wallet.owner,
            kind: wallet.kind,
        };
        tables.update_wallet(wallet)?;
        tracing::info!(wallet = %id, %tx_hash, "Wallet activated");
        Ok(Some(notification))
    }
}

/// CREATE_ORG / CREATE_PROJECT: insert an activated wallet whose address is
/// the deployment transaction hash.
#[derive(Debug, Clone)]
pub struct CreatedWalletFinalizer {
    kind: WalletKind,
    currency: Currency,
    coop: String,
}

impl CreatedWalletFinalizer {
    pub fn organization(ctx: &Context) -> Self {
        Self::new(WalletKind::Org, ctx)
    }

    pub fn project(ctx: &Context) -> Self {
        Self::new(WalletKind::Project, ctx)
    }

    fn new(kind: WalletKind, ctx: &Context) -> Self {
        Self {
            kind,
            currency: ctx.config.currency,
            coop: ctx.coop().to_string(),
        }
    }
}

impl Finalizer for CreatedWalletFinalizer {
    fn verify(&self, tables: &Tables, companion: &CompanionData) -> Result<()> {
        let owner = OwnerId(companion.structured_id()?);
        ensure_no_wallet(tables, owner, &self.coop)
    }

    fn apply(
        &self,
        tables: &mut Tables,
        companion: &CompanionData,
        tx_hash: &LedgerHash,
    ) -> Result<Option<Notification>> {
        let owner = OwnerId(companion.structured_id()?);
        let mut wallet = Wallet::new(owner, self.kind, tx_hash.as_str(), self.currency, &self.coop);
        wallet.activate(tx_hash.clone(), Utc::now());
        let id = wallet.id;
        tables.insert_wallet(wallet)?;
        tracing::info!(wallet = %id, ?owner, kind = %self.kind, %tx_hash, "Wallet deployed");
        Ok(Some(Notification::WalletActivated {
            owner,
            kind: self.kind,
        }))
    }
}
