//! Read-only data sources

use std::sync::Arc;

use async_trait::async_trait;
use backstop_api::BackupApi;
use backstop_model::SnapshotDocument;
use schemars::{JsonSchema, Schema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::account::{AccountRole, account_document};
use crate::error::{ProviderError, Result};
use crate::resource::{DataSource, decode, encode, rfc3339};

pub const SOURCE_ACCOUNTS: &str = "backstop_source_accounts";
pub const RESTORE_ACCOUNTS: &str = "backstop_restore_accounts";
pub const SNAPSHOT: &str = "backstop_snapshot";
pub const BACKUP_POLICIES: &str = "backstop_backup_policies";

// ============ Documents ============

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub cloud_provider: String,
    pub provider_account_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccountsDocument {
    #[serde(default)]
    pub accounts: Vec<AccountSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub backup_policy_type: String,
    pub resource_selection_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_inclusion_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_exclusion_override: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PoliciesDocument {
    #[serde(default)]
    pub policies: Vec<PolicySummary>,
}

/// Lookup key of the snapshot data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotQuery {
    pub id: String,
}

// ============ Data sources ============

pub struct AccountsDataSource {
    api: Arc<dyn BackupApi>,
    role: AccountRole,
}

impl AccountsDataSource {
    pub fn new(api: Arc<dyn BackupApi>, role: AccountRole) -> Self {
        Self { api, role }
    }
}

#[async_trait]
impl DataSource for AccountsDataSource {
    fn type_name(&self) -> &'static str {
        match self.role {
            AccountRole::Source => SOURCE_ACCOUNTS,
            AccountRole::Restore => RESTORE_ACCOUNTS,
        }
    }

    fn schema(&self) -> Schema {
        schema_for!(AccountsDocument)
    }

    async fn read(&self, _config: Value) -> Result<Value> {
        let accounts = match self.role {
            AccountRole::Source => self.api.list_source_accounts().await?,
            AccountRole::Restore => self.api.list_restore_accounts().await?,
        };
        debug!(count = accounts.len(), source = self.type_name(), "Listed accounts");

        let document = AccountsDocument {
            accounts: accounts
                .iter()
                .map(|account| {
                    let doc = account_document(account);
                    AccountSummary {
                        id: account.id.clone(),
                        name: doc.name,
                        cloud_provider: doc.cloud_provider,
                        provider_account_id: doc.provider_account_id,
                        status: account.status.clone(),
                    }
                })
                .collect(),
        };
        encode(self.type_name(), &document)
    }
}

pub struct SnapshotDataSource {
    api: Arc<dyn BackupApi>,
}

impl SnapshotDataSource {
    pub fn new(api: Arc<dyn BackupApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for SnapshotDataSource {
    fn type_name(&self) -> &'static str {
        SNAPSHOT
    }

    fn schema(&self) -> Schema {
        schema_for!(SnapshotDocument)
    }

    async fn read(&self, config: Value) -> Result<Value> {
        let query: SnapshotQuery = decode(SNAPSHOT, config)?;
        let snapshot = self.api.get_snapshot(&query.id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound {
                    resource: SNAPSHOT,
                    id: query.id.clone(),
                }
            } else {
                e.into()
            }
        })?;

        let document = SnapshotDocument {
            id: snapshot.id,
            project_id: snapshot.project_id,
            resource_id: snapshot.resource_id,
            vault_id: snapshot.vault_id,
            created_at: snapshot.created_time.map(rfc3339),
            expiration_date: snapshot.expiration_time.map(rfc3339),
            point_in_time: snapshot.point_in_time.map(rfc3339),
        };
        encode(SNAPSHOT, &document)
    }
}

pub struct BackupPoliciesDataSource {
    api: Arc<dyn BackupApi>,
}

impl BackupPoliciesDataSource {
    pub fn new(api: Arc<dyn BackupApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for BackupPoliciesDataSource {
    fn type_name(&self) -> &'static str {
        BACKUP_POLICIES
    }

    fn schema(&self) -> Schema {
        schema_for!(PoliciesDocument)
    }

    async fn read(&self, _config: Value) -> Result<Value> {
        let policies = self.api.list_backup_policies().await?;
        debug!(count = policies.len(), "Listed backup policies");

        let document = PoliciesDocument {
            policies: policies
                .into_iter()
                .map(|p| PolicySummary {
                    id: p.id,
                    name: p.name,
                    enabled: p.enabled,
                    backup_policy_type: p.backup_plan.backup_policy_type,
                    resource_selection_mode: p.resource_selector.resource_selection_mode,
                    resource_inclusion_override: p.resource_selector.resource_inclusion_override,
                    resource_exclusion_override: p.resource_selector.resource_exclusion_override,
                })
                .collect(),
        };
        encode(BACKUP_POLICIES, &document)
    }
}
