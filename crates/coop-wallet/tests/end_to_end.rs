//! End-to-end tests through the public surface: every ledger operation
//! goes generate -> sign -> dispatch, against the in-memory gateways.

use std::sync::Arc;
use std::thread;

use coop_gateway::memory::{MemoryDirectory, MemoryLedger, RecordingNotifier, sign};
use coop_store::Store;
use coop_types::*;
use coop_wallet::{Context, CoopServices};

/// One coop wired to in-memory gateways.
struct Coop {
    services: CoopServices,
    store: Arc<Store>,
    ledger: Arc<MemoryLedger>,
    directory: Arc<MemoryDirectory>,
    notifier: Arc<RecordingNotifier>,
}

impl Coop {
    fn new() -> Self {
        Self::with_config(CoopConfig::for_coop("e2e"))
    }

    fn with_config(config: CoopConfig) -> Self {
        let store = Arc::new(Store::new());
        let ledger = Arc::new(MemoryLedger::new());
        let directory = Arc::new(MemoryDirectory::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = Context {
            store: Arc::clone(&store),
            ledger: ledger.clone(),
            projects: directory.clone(),
            users: directory.clone(),
            notifier: notifier.clone(),
            config: Arc::new(config),
        };
        Self {
            services: CoopServices::new(ctx),
            store,
            ledger,
            directory,
            notifier,
        }
    }

    /// Sign and dispatch a generated transaction.
    fn dispatch(&self, generated: &GeneratedTransaction) -> Result<LedgerHash> {
        self.services
            .dispatcher
            .dispatch(generated.intent_id, &sign(&generated.unsigned))
    }

    fn outstanding_intents(&self) -> usize {
        self.services.intents.outstanding().unwrap().len()
    }

    /// A user with a wallet activated through the full intent flow.
    fn activated_user(&self, name: &str) -> (UserId, LedgerHash) {
        let user = UserId::new();
        self.directory.insert_user(UserInfo::dummy(user));
        let wallet = self
            .services
            .wallets
            .create_wallet(user, &format!("pk_{name}"), WalletKind::User)
            .expect("wallet should be created");
        let generated = self
            .services
            .wallets
            .generate_activation(wallet.id, user)
            .expect("activation should generate");
        let hash = self.dispatch(&generated).expect("activation should dispatch");
        (user, hash)
    }

    /// An organization and project owned by `owner`, both with deployed
    /// wallets.
    fn funded_project(&self, owner: UserId) -> (ProjectInfo, LedgerHash) {
        let organization = OrganizationInfo::dummy(owner);
        self.directory.insert_organization(organization.clone());
        let generated = self
            .services
            .wallets
            .generate_create_organization_wallet(organization.id, owner)
            .expect("organization wallet should generate");
        self.dispatch(&generated).expect("organization wallet should deploy");

        let project = ProjectInfo::dummy(organization.id, owner);
        self.directory.insert_project(project.clone());
        let generated = self
            .services
            .wallets
            .generate_create_project_wallet(project.id, owner)
            .expect("project wallet should generate");
        let hash = self.dispatch(&generated).expect("project wallet should deploy");
        (project, hash)
    }

    /// Create, approve and mint a deposit.
    fn minted_deposit(&self, user: UserId, amount: Amount) -> Deposit {
        let deposits = &self.services.deposits;
        let deposit = deposits.create(user, amount).unwrap();
        deposits
            .approve(deposit.id, UserId::new(), amount, NewDocument::dummy("statement.pdf"))
            .unwrap();
        let generated = deposits.generate_mint(deposit.id, UserId::new()).unwrap();
        self.dispatch(&generated).unwrap();
        deposits.find(deposit.id).unwrap()
    }
}

// =============================================================================
// Wallets
// =============================================================================

#[test]
fn e2e_wallet_activation_sets_hash_and_consumes_intent() {
    let coop = Coop::new();
    let (user, hash) = coop.activated_user("alice");

    let wallet = coop.services.wallets.find_by_owner(user).unwrap().unwrap();
    assert_eq!(wallet.hash, Some(hash));
    assert!(wallet.activated_at.is_some());
    assert_eq!(coop.outstanding_intents(), 0);
    assert_eq!(coop.notifier.events(), vec!["wallet_activated"]);
}

#[test]
fn e2e_reactivation_is_not_blocked() {
    let coop = Coop::new();
    let user = UserId::new();
    let wallet = coop
        .services
        .wallets
        .create_wallet(user, "pk_bob", WalletKind::User)
        .unwrap();
    let first = coop
        .services
        .wallets
        .generate_activation(wallet.id, user)
        .unwrap();
    let second = coop
        .services
        .wallets
        .generate_activation(wallet.id, user)
        .unwrap();

    let first_hash = coop.dispatch(&first).unwrap();
    let second_hash = coop
        .services
        .dispatcher
        .dispatch(second.intent_id, &SignedPayload::new("signed(activate:pk_bob:again)"))
        .unwrap();

    assert_ne!(first_hash, second_hash);
    let stored = coop.services.wallets.find(wallet.id).unwrap();
    assert_eq!(stored.hash, Some(second_hash));
}

#[test]
fn e2e_organization_and_project_wallets() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, project_hash) = coop.funded_project(owner);

    let wallet = coop.services.wallets.find_by_owner(project.id).unwrap().unwrap();
    assert_eq!(wallet.kind, WalletKind::Project);
    assert_eq!(wallet.hash, Some(project_hash));
    let organization = coop
        .services
        .wallets
        .find_by_owner(project.organization)
        .unwrap()
        .unwrap();
    assert_eq!(organization.kind, WalletKind::Org);
    assert!(coop.services.wallets.unactivated(WalletKind::User).unwrap().is_empty());
}

// =============================================================================
// Dispatcher
// =============================================================================

#[test]
fn e2e_dispatch_is_single_use() {
    let coop = Coop::new();
    let (user, _) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();
    coop.services
        .deposits
        .approve(deposit.id, UserId::new(), 1_000, NewDocument::dummy("a.pdf"))
        .unwrap();
    let generated = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap();
    coop.dispatch(&generated).unwrap();
    let posts = coop.ledger.post_count();

    let err = coop.dispatch(&generated).unwrap_err();

    assert_eq!(err.code(), ErrorCode::TxMissing);
    assert_eq!(coop.ledger.post_count(), posts);
}

#[test]
fn e2e_unknown_intent_changes_nothing() {
    let coop = Coop::new();
    let (user, _) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();
    let posts = coop.ledger.post_count();

    let err = coop
        .services
        .dispatcher
        .dispatch(IntentId::new(), &SignedPayload::new("signed(mint:x:1)"))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::TxMissing);
    assert_eq!(coop.ledger.post_count(), posts);
    assert_eq!(coop.services.deposits.find(deposit.id).unwrap(), deposit);
}

#[test]
fn e2e_concurrent_dispatch_posts_exactly_once() {
    let coop = Coop::new();
    let (user, _) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();
    coop.services
        .deposits
        .approve(deposit.id, UserId::new(), 1_000, NewDocument::dummy("a.pdf"))
        .unwrap();
    let generated = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap();
    let signed = sign(&generated.unsigned);
    let posts_before = coop.ledger.post_count();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let dispatcher = coop.services.dispatcher.clone();
            let signed = signed.clone();
            let id = generated.intent_id;
            thread::spawn(move || dispatcher.dispatch(id, &signed))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::TxMissing);
    }
    assert_eq!(coop.ledger.post_count(), posts_before + 1);
    assert!(coop.services.deposits.find(deposit.id).unwrap().is_minted());
}

// =============================================================================
// Deposits
// =============================================================================

#[test]
fn e2e_mint_round_trip() {
    let coop = Coop::new();
    let (user, wallet_hash) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 2_000).unwrap();
    assert_eq!(
        coop.services.deposits.pending().unwrap(),
        vec![deposit.clone()]
    );
    coop.services
        .deposits
        .approve(deposit.id, UserId::new(), 1_900, NewDocument::dummy("a.pdf"))
        .unwrap();

    let generated = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap();
    assert_eq!(generated.unsigned.0, format!("mint:{wallet_hash}:1900"));
    let hash = coop.dispatch(&generated).unwrap();

    let minted = coop.services.deposits.find(deposit.id).unwrap();
    assert_eq!(minted.tx_hash, Some(hash));
    assert_eq!(minted.state(), DepositState::Minted);
    assert!(coop.services.intents.find(generated.intent_id).unwrap().is_none());
    assert_eq!(
        coop.notifier.events(),
        vec!["wallet_activated", "deposit_requested", "deposit_minted"]
    );
}

#[test]
fn e2e_stale_mint_intent_is_rejected_before_posting() {
    let coop = Coop::new();
    let (user, _) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();
    coop.services
        .deposits
        .approve(deposit.id, UserId::new(), 1_000, NewDocument::dummy("a.pdf"))
        .unwrap();
    let first = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap();
    let second = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap();
    coop.dispatch(&first).unwrap();
    let posts = coop.ledger.post_count();

    let err = coop
        .services
        .dispatcher
        .dispatch(second.intent_id, &SignedPayload::new("signed(mint:other)"))
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::WalletDepositMinted);
    assert!(matches!(err, CoopError::AlreadyExists { .. }));
    assert_eq!(coop.ledger.post_count(), posts);
    assert!(coop.services.intents.find(second.intent_id).unwrap().is_some());
    assert_eq!(
        coop.services
            .deposits
            .generate_mint(deposit.id, UserId::new())
            .unwrap_err()
            .code(),
        ErrorCode::WalletDepositMinted
    );
}

#[test]
fn e2e_at_most_one_unapproved_deposit() {
    let coop = Coop::new();
    let deposits = &coop.services.deposits;
    let (user, _) = coop.activated_user("alice");
    let unapproved = || {
        deposits
            .find_by_owner(user)
            .unwrap()
            .into_iter()
            .filter(|d| !d.approved)
            .count()
    };

    let first = deposits.create(user, 1_000).unwrap();
    let err = deposits.create(user, 500).unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletDepositExists);

    deposits.decline(first.id, UserId::new(), "wrong amount").unwrap();
    let err = deposits.create(user, 500).unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletDepositExists);
    assert_eq!(unapproved(), 1);

    deposits.delete(first.id).unwrap();
    let second = deposits.create(user, 500).unwrap();
    deposits
        .approve(second.id, UserId::new(), 500, NewDocument::dummy("a.pdf"))
        .unwrap();
    assert!(deposits.create(user, 700).is_ok());
    assert_eq!(unapproved(), 1);
}

#[test]
fn e2e_mint_requires_activated_wallet() {
    let coop = Coop::new();
    let user = UserId::new();
    coop.services
        .wallets
        .create_wallet(user, "pk_late", WalletKind::User)
        .unwrap();
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();
    coop.services
        .deposits
        .approve(deposit.id, UserId::new(), 1_000, NewDocument::dummy("a.pdf"))
        .unwrap();

    let err = coop
        .services
        .deposits
        .generate_mint(deposit.id, UserId::new())
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::WalletNotActivated);
    assert_eq!(coop.outstanding_intents(), 0);
}

// =============================================================================
// Withdraws
// =============================================================================

#[test]
fn e2e_withdraw_funds_boundary() {
    let coop = Coop::new();
    let (user, hash) = coop.activated_user("alice");
    coop.ledger.set_balance(&hash, 5_000);
    let account = BankAccount::new("DE02120300000000202051", None, user);

    let err = coop
        .services
        .withdraws
        .create(user, 5_001, account.clone())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletFunds);
    assert!(coop.services.withdraws.create(user, 5_000, account).is_ok());
}

#[test]
fn e2e_withdraw_full_cycle() {
    let coop = Coop::new();
    let (user, hash) = coop.activated_user("alice");
    coop.ledger.set_balance(&hash, 5_000);
    let withdraws = &coop.services.withdraws;
    let withdraw = withdraws
        .create(user, 3_000, BankAccount::new("DE02120300000000202051", None, user))
        .unwrap();

    let admin = UserId::new();
    let err = withdraws.generate_burn(withdraw.id, admin).unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletWithdrawNotApproved);

    let approval = withdraws.generate_approval(withdraw.id, user).unwrap();
    assert_eq!(approval.unsigned.0, format!("approve_burn:{hash}:3000"));
    coop.dispatch(&approval).unwrap();

    let burn = withdraws.generate_burn(withdraw.id, admin).unwrap();
    assert_eq!(withdraws.find(withdraw.id).unwrap().burned_by, Some(admin));
    let burn_hash = coop.dispatch(&burn).unwrap();

    let burned = withdraws.find(withdraw.id).unwrap();
    assert_eq!(burned.state(), WithdrawState::Burned);
    assert_eq!(burned.burned_tx_hash, Some(burn_hash));
    withdraws
        .attach_document(withdraw.id, NewDocument::dummy("wire.pdf"), admin)
        .unwrap();
    assert_eq!(
        coop.notifier.events(),
        vec![
            "wallet_activated",
            "withdraw_requested",
            "withdraw_approved",
            "withdraw_burned"
        ]
    );
}

#[test]
fn e2e_burn_dispatch_before_approval_lands_is_rejected() {
    let coop = Coop::new();
    let (user, hash) = coop.activated_user("alice");
    coop.ledger.set_balance(&hash, 5_000);
    let withdraws = &coop.services.withdraws;
    let withdraw = withdraws
        .create(user, 1_000, BankAccount::new("DE02120300000000202051", None, user))
        .unwrap();
    let approval = withdraws.generate_approval(withdraw.id, user).unwrap();
    coop.dispatch(&approval).unwrap();
    let burn = withdraws.generate_burn(withdraw.id, UserId::new()).unwrap();
    coop.dispatch(&burn).unwrap();

    let err = withdraws
        .confirm_burn(withdraw.id, &SignedPayload::new("signed(burn:again)"))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletWithdrawBurned);
}

// =============================================================================
// Investments
// =============================================================================

#[test]
fn e2e_invest_dispatch_is_stateless() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, _) = coop.funded_project(owner);
    let (investor, investor_hash) = coop.activated_user("investor");
    coop.ledger.set_balance(&investor_hash, 10_000);

    let generated = coop
        .services
        .investments
        .generate_invest_in_project_transaction(project.id, investor, 2_500)
        .unwrap();
    let hash = coop.dispatch(&generated).unwrap();

    assert_eq!(hash, MemoryLedger::tx_hash_for(&sign(&generated.unsigned)));
    assert_eq!(coop.outstanding_intents(), 0);

    let cancel = coop
        .services
        .investments
        .generate_cancel_investment(project.id, investor)
        .unwrap();
    assert!(coop.dispatch(&cancel).is_ok());
}

#[test]
fn e2e_max_funds_boundary() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, project_hash) = coop.funded_project(owner);
    coop.directory.update_project(project.id, |p| {
        p.max_per_user = p.expected_funding;
    });
    let (investor, investor_hash) = coop.activated_user("investor");
    coop.ledger.set_balance(&investor_hash, project.expected_funding);
    let investments = &coop.services.investments;

    coop.ledger.set_balance(&project_hash, project.expected_funding);
    let err = investments
        .generate_invest_in_project_transaction(project.id, investor, project.expected_funding)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrjMaxFunds);

    coop.ledger.set_balance(&project_hash, project.expected_funding - 1);
    assert!(
        investments
            .generate_invest_in_project_transaction(project.id, investor, project.expected_funding)
            .is_ok()
    );
}

#[test]
fn e2e_investor_funds_boundary() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, _) = coop.funded_project(owner);
    let (investor, investor_hash) = coop.activated_user("investor");
    coop.ledger.set_balance(&investor_hash, 999);
    let investments = &coop.services.investments;

    let err = investments
        .generate_invest_in_project_transaction(project.id, investor, 1_000)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::WalletFunds);

    coop.ledger.set_balance(&investor_hash, 1_000);
    assert!(
        investments
            .generate_invest_in_project_transaction(project.id, investor, 1_000)
            .is_ok()
    );
}

#[test]
fn e2e_inactive_project_rejected_first() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, _) = coop.funded_project(owner);
    coop.directory.update_project(project.id, |p| p.active = false);
    let (investor, _) = coop.activated_user("investor");

    let err = coop
        .services
        .investments
        .generate_invest_in_project_transaction(project.id, investor, 0)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::PrjNotActive);
}

// =============================================================================
// Revenue payouts
// =============================================================================

#[test]
fn e2e_revenue_payout_completes_through_dispatch() {
    let coop = Coop::new();
    let (owner, _) = coop.activated_user("owner");
    let (project, _) = coop.funded_project(owner);

    let generated = coop
        .services
        .payouts
        .generate_revenue_payout(project.id, 4_000, owner)
        .unwrap();
    let hash = coop.dispatch(&generated).unwrap();

    let payouts = coop.services.payouts.find_by_project(project.id).unwrap();
    assert_eq!(payouts.len(), 1);
    assert_eq!(payouts[0].tx_hash, Some(hash));
    assert!(payouts[0].completed_at.is_some());
    assert_eq!(
        coop.notifier.events().last().copied(),
        Some("revenue_payout_completed")
    );
}

// =============================================================================
// Configuration & tenancy
// =============================================================================

#[test]
fn e2e_config_drives_coop_and_reference_length() {
    let config = CoopConfig::from_json_str(r#"{"coop":"green-energy","reference_code_length":12}"#)
        .unwrap();
    let coop = Coop::with_config(config);
    let (user, _) = coop.activated_user("alice");

    let deposit = coop.services.deposits.create(user, 1_000).unwrap();

    assert_eq!(deposit.coop, "green-energy");
    assert_eq!(deposit.reference.len(), 12);
}

#[test]
fn e2e_coops_sharing_a_store_are_isolated() {
    let coop = Coop::new();
    let (user, _) = coop.activated_user("alice");
    let deposit = coop.services.deposits.create(user, 1_000).unwrap();

    let other = Context {
        store: Arc::clone(&coop.store),
        ledger: coop.ledger.clone(),
        projects: coop.directory.clone(),
        users: coop.directory.clone(),
        notifier: coop.notifier.clone(),
        config: Arc::new(CoopConfig::for_coop("other")),
    };
    let other = CoopServices::new(other);

    assert_eq!(
        other.deposits.find(deposit.id).unwrap_err().code(),
        ErrorCode::WalletDepositMissing
    );
    assert!(other.wallets.find_by_owner(user).unwrap().is_none());
    assert_eq!(
        other.deposits.create(user, 100).unwrap_err().code(),
        ErrorCode::WalletMissing
    );
}
