//! Shared fixtures for unit tests.

use std::sync::Arc;

use coop_gateway::memory::{MemoryDirectory, MemoryLedger, RecordingNotifier};
use coop_store::Store;
use coop_types::{
    CoopConfig, Currency, LedgerHash, OrganizationInfo, OwnerId, ProjectInfo, UserId, UserInfo,
    Wallet, WalletKind,
};

use crate::context::Context;

pub(crate) struct Kit {
    pub ctx: Context,
    pub ledger: Arc<MemoryLedger>,
    pub directory: Arc<MemoryDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Kit {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let directory = Arc::new(MemoryDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = Context {
            store: Arc::new(Store::new()),
            ledger: ledger.clone(),
            projects: directory.clone(),
            users: directory.clone(),
            notifier: notifier.clone(),
            config: Arc::new(CoopConfig::for_coop("test-coop")),
        };
        Self {
            ctx,
            ledger,
            directory,
            notifier,
        }
    }

    /// Insert an already activated wallet and return its ledger address.
    pub fn activated_wallet(&self, owner: OwnerId, kind: WalletKind) -> LedgerHash {
        let hash = LedgerHash::new(format!("wh_{}", owner.0.simple()));
        let mut wallet = Wallet::new(
            owner,
            kind,
            format!("pk_{}", owner.0.simple()),
            Currency::Eur,
            self.ctx.coop(),
        );
        wallet.activate(hash.clone(), chrono::Utc::now());
        self.ctx
            .store
            .transaction(|tables| tables.insert_wallet(wallet))
            .unwrap();
        hash
    }

    /// A directory user with an activated wallet.
    pub fn user(&self) -> (UserId, LedgerHash) {
        let user = UserId::new();
        self.directory.insert_user(UserInfo::dummy(user));
        (user, self.activated_wallet(user.into(), WalletKind::User))
    }

    /// A project owned by `owner`, with activated organization and project
    /// wallets.
    pub fn project(&self, owner: UserId) -> (ProjectInfo, LedgerHash) {
        let organization = OrganizationInfo::dummy(owner);
        let project = ProjectInfo::dummy(organization.id, owner);
        self.activated_wallet(organization.id.into(), WalletKind::Org);
        let hash = self.activated_wallet(project.id.into(), WalletKind::Project);
        self.directory.insert_organization(organization);
        self.directory.insert_project(project.clone());
        (project, hash)
    }
}
