//! In-memory gateway doubles for tests and local runs.
//!
//! [`MemoryLedger`] builds human-readable payloads, derives transaction
//! hashes from the signed bytes (`th_` + hex SHA-256 prefix) and rejects a
//! payload posted twice, as a real ledger rejects a replayed transaction.
//! Every double can be switched into a failing mode to exercise the
//! gateway-failure paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use coop_types::{
    Amount, CoopError, CreateProjectParams, ErrorCode, LedgerHash, Notification, OrganizationId,
    OrganizationInfo, ProjectId, ProjectInfo, Result, SignedPayload, UnsignedPayload, UserId,
    UserInfo,
};
use sha2::{Digest, Sha256};

use crate::{LedgerGateway, Notifier, ProjectDirectory, UserDirectory};

/// Stand-in for the external signing client.
#[must_use]
pub fn sign(unsigned: &UnsignedPayload) -> SignedPayload {
    SignedPayload(format!("signed({})", unsigned.0))
}

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<LedgerHash, Amount>,
    posted: Vec<SignedPayload>,
    seen: HashSet<LedgerHash>,
    fail_builds: bool,
    fail_posts: bool,
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, wallet: &LedgerHash, amount: Amount) {
        self.state().balances.insert(wallet.clone(), amount);
    }

    pub fn fail_builds(&self, fail: bool) {
        self.state().fail_builds = fail;
    }

    pub fn fail_posts(&self, fail: bool) {
        self.state().fail_posts = fail;
    }

    /// Every payload accepted by `post`, oldest first.
    #[must_use]
    pub fn posted(&self) -> Vec<SignedPayload> {
        self.state().posted.clone()
    }

    #[must_use]
    pub fn post_count(&self) -> usize {
        self.state().posted.len()
    }

    /// The hash `post` returns for a payload.
    #[must_use]
    pub fn tx_hash_for(signed: &SignedPayload) -> LedgerHash {
        let digest = Sha256::digest(signed.0.as_bytes());
        LedgerHash(format!("th_{}", hex::encode(&digest[..16])))
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().expect("ledger state poisoned")
    }

    fn build(&self, body: String) -> Result<UnsignedPayload> {
        if self.state().fail_builds {
            return Err(unavailable());
        }
        Ok(UnsignedPayload(body))
    }
}

fn unavailable() -> CoopError {
    CoopError::gateway(ErrorCode::IntGatewayLedger, "UNAVAILABLE", "ledger node unreachable")
}

impl LedgerGateway for MemoryLedger {
    fn balance(&self, wallet: &LedgerHash) -> Result<Option<Amount>> {
        Ok(self.state().balances.get(wallet).copied())
    }

    fn build_activation(&self, activation_data: &str) -> Result<UnsignedPayload> {
        self.build(format!("activate:{activation_data}"))
    }

    fn build_create_organization(&self, user: &LedgerHash) -> Result<UnsignedPayload> {
        self.build(format!("create_org:{user}"))
    }

    fn build_create_project(&self, params: &CreateProjectParams) -> Result<UnsignedPayload> {
        self.build(format!(
            "create_project:{}:{}:{}:{}:{}:{}",
            params.user,
            params.organization,
            params.min_per_user,
            params.max_per_user,
            params.expected_funding,
            params.end_epoch_millis(),
        ))
    }

    fn build_invest(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
        amount: Amount,
    ) -> Result<UnsignedPayload> {
        self.build(format!("invest:{user}:{project}:{amount}"))
    }

    fn build_cancel_investment(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
    ) -> Result<UnsignedPayload> {
        self.build(format!("cancel_investment:{user}:{project}"))
    }

    fn build_mint(&self, to: &LedgerHash, amount: Amount) -> Result<UnsignedPayload> {
        self.build(format!("mint:{to}:{amount}"))
    }

    fn build_approve_burn(&self, from: &LedgerHash, amount: Amount) -> Result<UnsignedPayload> {
        self.build(format!("approve_burn:{from}:{amount}"))
    }

    fn build_burn(&self, from: &LedgerHash) -> Result<UnsignedPayload> {
        self.build(format!("burn:{from}"))
    }

    fn build_revenue_payout(
        &self,
        user: &LedgerHash,
        project: &LedgerHash,
        amount: Amount,
    ) -> Result<UnsignedPayload> {
        self.build(format!("revenue_payout:{user}:{project}:{amount}"))
    }

    fn post(&self, signed: &SignedPayload) -> Result<LedgerHash> {
        let mut state = self.state();
        if state.fail_posts {
            return Err(unavailable());
        }
        let hash = Self::tx_hash_for(signed);
        if !state.seen.insert(hash.clone()) {
            return Err(CoopError::gateway(
                ErrorCode::IntGatewayLedger,
                "DUPLICATE_TX",
                format!("transaction {hash} already posted"),
            ));
        }
        state.posted.push(signed.clone());
        Ok(hash)
    }
}

// ---------------------------------------------------------------------------
// MemoryDirectory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DirectoryState {
    projects: HashMap<ProjectId, ProjectInfo>,
    organizations: HashMap<OrganizationId, OrganizationInfo>,
    users: HashMap<UserId, UserInfo>,
    failing: bool,
}

/// Serves both [`ProjectDirectory`] and [`UserDirectory`].
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_project(&self, project: ProjectInfo) {
        self.state().projects.insert(project.id, project);
    }

    /// Mutate a stored project in place. No-op for unknown ids.
    pub fn update_project(&self, id: ProjectId, f: impl FnOnce(&mut ProjectInfo)) {
        if let Some(project) = self.state().projects.get_mut(&id) {
            f(project);
        }
    }

    pub fn insert_organization(&self, organization: OrganizationInfo) {
        self.state().organizations.insert(organization.id, organization);
    }

    pub fn insert_user(&self, user: UserInfo) {
        self.state().users.insert(user.id, user);
    }

    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    fn state(&self) -> std::sync::MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("directory state poisoned")
    }
}

fn directory_down(code: ErrorCode) -> CoopError {
    CoopError::gateway(code, "UNAVAILABLE", "directory service unreachable")
}

impl ProjectDirectory for MemoryDirectory {
    fn project(&self, id: ProjectId) -> Result<ProjectInfo> {
        let state = self.state();
        if state.failing {
            return Err(directory_down(ErrorCode::IntGatewayProject));
        }
        state
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| CoopError::not_found(ErrorCode::PrjMissing, format!("{id}")))
    }

    fn projects(&self, ids: &[ProjectId]) -> Result<Vec<ProjectInfo>> {
        let state = self.state();
        if state.failing {
            return Err(directory_down(ErrorCode::IntGatewayProject));
        }
        Ok(ids.iter().filter_map(|id| state.projects.get(id).cloned()).collect())
    }

    fn organization(&self, id: OrganizationId) -> Result<OrganizationInfo> {
        let state = self.state();
        if state.failing {
            return Err(directory_down(ErrorCode::IntGatewayProject));
        }
        state
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| CoopError::not_found(ErrorCode::OrgMissing, format!("{id}")))
    }

    fn organizations(&self, ids: &[OrganizationId]) -> Result<Vec<OrganizationInfo>> {
        let state = self.state();
        if state.failing {
            return Err(directory_down(ErrorCode::IntGatewayProject));
        }
        Ok(ids
            .iter()
            .filter_map(|id| state.organizations.get(id).cloned())
            .collect())
    }
}

impl UserDirectory for MemoryDirectory {
    fn users(&self, ids: &[UserId]) -> Result<Vec<UserInfo>> {
        let state = self.state();
        if state.failing {
            return Err(directory_down(ErrorCode::IntGatewayUser));
        }
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every send from now on. Refused notifications are not recorded.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().expect("notifier state poisoned") = failing;
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier state poisoned").clone()
    }

    /// Event names of every delivered notification, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<&'static str> {
        self.sent().iter().map(Notification::event).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        if *self.failing.lock().expect("notifier state poisoned") {
            return Err(CoopError::gateway(
                ErrorCode::IntGatewayMail,
                "UNAVAILABLE",
                "mail service unreachable",
            ));
        }
        self.sent
            .lock()
            .expect("notifier state poisoned")
            .push(notification.clone());
        Ok(())
    }
}
