//! In-memory [`BackupApi`] for tests
//!
//! State lives behind a mutex so the mock can be shared through an `Arc`
//! the same way the real client is. Every trait call is counted.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::client::BackupApi;
use crate::error::{ApiError, Result};
use crate::types::*;

/// A restore submission as received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRestore {
    pub resource_id: String,
    pub snapshot_id: String,
    pub request: RestoreRequest,
}

#[derive(Default)]
struct MockState {
    source_accounts: BTreeMap<String, Account>,
    restore_accounts: BTreeMap<String, Account>,
    policies: BTreeMap<String, BackupPolicy>,
    snapshots: BTreeMap<String, Snapshot>,
    resources: BTreeMap<String, InventoryResource>,
    jobs: BTreeMap<String, VecDeque<RestoreJob>>,
    job_scripts: VecDeque<Vec<(String, Option<String>)>>,
    restores: Vec<RecordedRestore>,
    policy_requests: Vec<CreateBackupPolicyRequest>,
    calls: BTreeMap<&'static str, usize>,
    failure: Option<(u16, String)>,
    omit_timestamps: bool,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and return the injected failure, if any.
    fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_default() += 1;
        if let Some((status, body)) = state.failure.clone() {
            return Err(ApiError::Status { status, body });
        }
        Ok(state)
    }

    // ---- seeding ----

    pub fn add_source_account(&self, account: Account) {
        self.lock()
            .source_accounts
            .insert(account.id.clone(), account);
    }

    pub fn add_restore_account(&self, account: Account) {
        self.lock()
            .restore_accounts
            .insert(account.id.clone(), account);
    }

    pub fn add_policy(&self, policy: BackupPolicy) {
        self.lock().policies.insert(policy.id.clone(), policy);
    }

    /// Drop a policy behind the provider's back.
    pub fn remove_policy(&self, id: &str) -> Option<BackupPolicy> {
        self.lock().policies.remove(id)
    }

    pub fn add_snapshot(&self, snapshot: Snapshot) {
        self.lock().snapshots.insert(snapshot.id.clone(), snapshot);
    }

    pub fn add_resource(&self, resource: InventoryResource) {
        self.lock().resources.insert(resource.id.clone(), resource);
    }

    /// Status progression for the next submitted restore job.
    ///
    /// Each poll returns the next step; the last step repeats. Jobs without a
    /// script complete immediately.
    pub fn script_next_job(&self, steps: &[(&str, Option<&str>)]) {
        self.lock().job_scripts.push_back(
            steps
                .iter()
                .map(|(status, message)| (status.to_string(), message.map(str::to_string)))
                .collect(),
        );
    }

    /// Make every subsequent call fail with `status`.
    pub fn fail_with(&self, status: u16, body: &str) {
        self.lock().failure = Some((status, body.to_string()));
    }

    pub fn clear_failure(&self) {
        self.lock().failure = None;
    }

    /// Stop reporting created/updated timestamps on policies and accounts.
    pub fn omit_timestamps(&self) {
        self.lock().omit_timestamps = true;
    }

    // ---- inspection ----

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or_default()
    }

    pub fn restores(&self) -> Vec<RecordedRestore> {
        self.lock().restores.clone()
    }

    pub fn policy_requests(&self) -> Vec<CreateBackupPolicyRequest> {
        self.lock().policy_requests.clone()
    }

    pub fn policy(&self, id: &str) -> Option<BackupPolicy> {
        self.lock().policies.get(id).cloned()
    }

    fn connect(
        state: &mut MockState,
        prefix: &str,
        request: &ConnectAccountRequest,
    ) -> Account {
        let id = state.next_id(prefix);
        let provider_account_id = request
            .account_attributes
            .aws
            .as_ref()
            .and_then(|aws| aws.role_arn.split(':').nth(4))
            .unwrap_or_default()
            .to_string();
        let now = (!state.omit_timestamps).then(Utc::now);
        Account {
            id,
            name: request.name.clone(),
            provider_account_id,
            status: "CONNECTED".to_string(),
            account_attributes: request.account_attributes.clone(),
            created_time: now,
            updated_time: now,
        }
    }
}

fn not_found(what: String) -> ApiError {
    ApiError::NotFound {
        what,
        body: "{\"message\":\"not found\"}".to_string(),
    }
}

#[async_trait]
impl BackupApi for MockApi {
    async fn list_source_accounts(&self) -> Result<Vec<Account>> {
        let state = self.enter("list_source_accounts")?;
        Ok(state.source_accounts.values().cloned().collect())
    }

    async fn connect_source_account(&self, request: &ConnectAccountRequest) -> Result<Account> {
        let mut state = self.enter("connect_source_account")?;
        let account = Self::connect(&mut state, "src", request);
        state
            .source_accounts
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn disconnect_source_account(&self, id: &str) -> Result<()> {
        let mut state = self.enter("disconnect_source_account")?;
        state
            .source_accounts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("source-accounts {id}")))
    }

    async fn list_restore_accounts(&self) -> Result<Vec<Account>> {
        let state = self.enter("list_restore_accounts")?;
        Ok(state.restore_accounts.values().cloned().collect())
    }

    async fn connect_restore_account(&self, request: &ConnectAccountRequest) -> Result<Account> {
        let mut state = self.enter("connect_restore_account")?;
        let account = Self::connect(&mut state, "rst", request);
        state
            .restore_accounts
            .insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn disconnect_restore_account(&self, id: &str) -> Result<()> {
        let mut state = self.enter("disconnect_restore_account")?;
        state
            .restore_accounts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("restore-accounts {id}")))
    }

    async fn list_backup_policies(&self) -> Result<Vec<BackupPolicy>> {
        let state = self.enter("list_backup_policies")?;
        Ok(state.policies.values().cloned().collect())
    }

    async fn get_backup_policy(&self, id: &str) -> Result<BackupPolicy> {
        let state = self.enter("get_backup_policy")?;
        state
            .policies
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("backup policy {id}")))
    }

    async fn create_backup_policy(
        &self,
        request: &CreateBackupPolicyRequest,
    ) -> Result<BackupPolicy> {
        let mut state = self.enter("create_backup_policy")?;
        state.policy_requests.push(request.clone());
        let now = (!state.omit_timestamps).then(Utc::now);
        let policy = BackupPolicy {
            id: state.next_id("policy"),
            name: request.name.clone(),
            enabled: request.enabled,
            resource_selector: request.resource_selector.clone(),
            backup_plan: request.backup_plan.clone(),
            created_time: now,
            updated_time: now,
        };
        state.policies.insert(policy.id.clone(), policy.clone());
        Ok(policy)
    }

    async fn update_backup_policy(
        &self,
        request: &UpdateBackupPolicyRequest,
    ) -> Result<BackupPolicy> {
        let mut state = self.enter("update_backup_policy")?;
        state.policy_requests.push(request.body.clone());
        let omit_timestamps = state.omit_timestamps;
        let existing = state
            .policies
            .get_mut(&request.id)
            .ok_or_else(|| not_found(format!("backup policy {}", request.id)))?;
        existing.name = request.body.name.clone();
        existing.enabled = request.body.enabled;
        existing.resource_selector = request.body.resource_selector.clone();
        existing.backup_plan = request.body.backup_plan.clone();
        if !omit_timestamps {
            existing.updated_time = Some(Utc::now());
        }
        Ok(existing.clone())
    }

    async fn delete_backup_policy(&self, id: &str) -> Result<()> {
        let mut state = self.enter("delete_backup_policy")?;
        state
            .policies
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("backup policy {id}")))
    }

    async fn get_snapshot(&self, id: &str) -> Result<Snapshot> {
        let state = self.enter("get_snapshot")?;
        state
            .snapshots
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("snapshot {id}")))
    }

    async fn get_resource(&self, id: &str) -> Result<InventoryResource> {
        let state = self.enter("get_resource")?;
        state
            .resources
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(format!("resource {id}")))
    }

    async fn start_restore(
        &self,
        resource_id: &str,
        snapshot_id: &str,
        request: &RestoreRequest,
    ) -> Result<String> {
        let mut state = self.enter("start_restore")?;
        if !state.snapshots.contains_key(snapshot_id) {
            return Err(not_found(format!("snapshot {snapshot_id}")));
        }
        state.restores.push(RecordedRestore {
            resource_id: resource_id.to_string(),
            snapshot_id: snapshot_id.to_string(),
            request: request.clone(),
        });

        let job_id = state.next_id("job");
        let script = state
            .job_scripts
            .pop_front()
            .unwrap_or_else(|| vec![("JOB_COMPLETED".to_string(), None)]);
        let created = Utc::now();
        let steps = script
            .into_iter()
            .map(|(status, status_message)| {
                let finished = matches!(
                    status.as_str(),
                    "JOB_COMPLETED" | "JOB_FAILED" | "JOB_PARTIAL" | "JOB_CANCELLED"
                );
                RestoreJob {
                    id: job_id.clone(),
                    start_time: (status != "JOB_PENDING").then_some(created),
                    end_time: finished.then_some(created),
                    duration_seconds: finished.then_some(0),
                    status,
                    status_message,
                    created_time: Some(created),
                }
            })
            .collect();
        state.jobs.insert(job_id.clone(), steps);
        Ok(job_id)
    }

    async fn get_restore_job(&self, id: &str) -> Result<RestoreJob> {
        let mut state = self.enter("get_restore_job")?;
        let steps = state
            .jobs
            .get_mut(id)
            .ok_or_else(|| not_found(format!("restore job {id}")))?;
        let job = if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        };
        job.ok_or_else(|| not_found(format!("restore job {id}")))
    }
}
