//! `backstop_source_account` and `backstop_restore_account` resources
//!
//! The service has no get-by-id for accounts, so reads list and filter.
//! Connected accounts cannot be changed in place: identifying changes force
//! replacement and anything else is kept locally with a warning.

use std::sync::Arc;

use async_trait::async_trait;
use backstop_api::{self as api, BackupApi};
use backstop_model::{AccountAttributes, AccountDocument, CloudProvider, ValidationError};
use schemars::{Schema, schema_for};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::resource::{Resource, ResourceOutcome, decode, encode, rfc3339};

pub const SOURCE_TYPE_NAME: &str = "backstop_source_account";
pub const RESTORE_TYPE_NAME: &str = "backstop_restore_account";

/// Which side of a backup an account is connected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Restore,
}

impl AccountRole {
    pub fn type_name(self) -> &'static str {
        match self {
            AccountRole::Source => SOURCE_TYPE_NAME,
            AccountRole::Restore => RESTORE_TYPE_NAME,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AccountRole::Source => "source account",
            AccountRole::Restore => "restore account",
        }
    }
}

pub struct AccountResource {
    api: Arc<dyn BackupApi>,
    role: AccountRole,
}

impl AccountResource {
    pub fn new(api: Arc<dyn BackupApi>, role: AccountRole) -> Self {
        Self { api, role }
    }

    async fn list(&self) -> Result<Vec<api::Account>> {
        let accounts = match self.role {
            AccountRole::Source => self.api.list_source_accounts().await?,
            AccountRole::Restore => self.api.list_restore_accounts().await?,
        };
        Ok(accounts)
    }

    async fn find(&self, id: &str) -> Result<Option<api::Account>> {
        Ok(self.list().await?.into_iter().find(|a| a.id == id))
    }

    fn id_of(&self, doc: &AccountDocument) -> Result<String> {
        doc.id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingId {
                resource: self.role.type_name(),
            })
    }
}

/// Typed attributes of a remote account, when the service reports any.
pub fn remote_attributes(wire: &api::AccountAttributes) -> Option<AccountAttributes> {
    if let Some(aws) = &wire.aws {
        return Some(AccountAttributes::Aws {
            role_arn: aws.role_arn.clone(),
        });
    }
    if let Some(azure) = &wire.azure {
        return Some(AccountAttributes::Azure {
            tenant_id: azure.tenant_id.clone(),
            subscription_id: azure.subscription_id.clone(),
        });
    }
    wire.gcp.as_ref().map(|gcp| AccountAttributes::Gcp {
        project_id: gcp.project_id.clone(),
    })
}

/// Document of a remote account.
///
/// `role` is only known for AWS accounts.
pub fn account_document(account: &api::Account) -> AccountDocument {
    let role = match remote_attributes(&account.account_attributes) {
        Some(AccountAttributes::Aws { role_arn }) => Some(role_arn),
        _ => None,
    };
    AccountDocument {
        id: Some(account.id.clone()),
        name: account.name.clone(),
        provider_account_id: account.provider_account_id.clone(),
        cloud_provider: account.account_attributes.cloud_provider.clone(),
        role,
        status: Some(account.status.clone()),
        created_at: account.created_time.map(rfc3339),
        updated_at: account.updated_time.map(rfc3339),
    }
}

fn connect_request(doc: &AccountDocument) -> Result<api::ConnectAccountRequest> {
    let role_arn = match AccountAttributes::for_connect(doc)? {
        AccountAttributes::Aws { role_arn } => role_arn,
        other => {
            let provider = other.cloud_provider().to_string();
            return Err(ValidationError::UnsupportedProvider(provider).into());
        }
    };
    Ok(api::ConnectAccountRequest {
        name: doc.name.clone(),
        account_attributes: api::AccountAttributes {
            cloud_provider: CloudProvider::Aws.to_string(),
            aws: Some(api::AwsAccountAttributes { role_arn }),
            azure: None,
            gcp: None,
        },
    })
}

/// Keep the planned document but refresh what the service computes.
fn with_remote_fields(planned: AccountDocument, remote: &AccountDocument) -> AccountDocument {
    AccountDocument {
        id: remote.id.clone(),
        status: remote.status.clone(),
        created_at: remote.created_at.clone(),
        updated_at: remote.updated_at.clone(),
        ..planned
    }
}

#[async_trait]
impl Resource for AccountResource {
    fn type_name(&self) -> &'static str {
        self.role.type_name()
    }

    fn schema(&self) -> Schema {
        schema_for!(AccountDocument)
    }

    fn replace_on_change(&self) -> &'static [&'static str] {
        &AccountDocument::IDENTIFYING_FIELDS
    }

    async fn create(&self, planned: Value) -> Result<ResourceOutcome> {
        let planned: AccountDocument = decode(self.type_name(), planned)?;
        let request = connect_request(&planned)?;

        debug!(name = %request.name, kind = self.role.label(), "Connecting account");
        let account = match self.role {
            AccountRole::Source => self.api.connect_source_account(&request).await?,
            AccountRole::Restore => self.api.connect_restore_account(&request).await?,
        };
        info!(id = %account.id, kind = self.role.label(), "Connected account");

        let state = with_remote_fields(planned, &account_document(&account));
        Ok(ResourceOutcome::present(encode(self.type_name(), &state)?))
    }

    async fn read(&self, prior: Value) -> Result<ResourceOutcome> {
        let prior: AccountDocument = decode(self.type_name(), prior)?;
        let id = self.id_of(&prior)?;

        let Some(account) = self.find(&id).await? else {
            info!(
                id = %id,
                kind = self.role.label(),
                "Account no longer connected, removing from state"
            );
            return Ok(ResourceOutcome::gone());
        };

        let remote = account_document(&account);
        let state = AccountDocument {
            name: remote.name.clone(),
            provider_account_id: remote.provider_account_id.clone(),
            cloud_provider: remote.cloud_provider.clone(),
            role: remote.role.clone().or(prior.role.clone()),
            ..with_remote_fields(prior, &remote)
        };
        Ok(ResourceOutcome::present(encode(self.type_name(), &state)?))
    }

    async fn update(&self, prior: Value, planned: Value) -> Result<ResourceOutcome> {
        let prior: AccountDocument = decode(self.type_name(), prior)?;
        let planned: AccountDocument = decode(self.type_name(), planned)?;

        let changed = prior.identity_changes(&planned);
        if !changed.is_empty() {
            return Err(ProviderError::RequiresReplacement {
                resource: self.type_name(),
                fields: changed,
            });
        }

        let message = match self.role {
            AccountRole::Source => "Most source account changes require replacement",
            AccountRole::Restore => "Most restore account changes require replacement",
        };
        warn!(id = ?prior.id, "{message}; keeping the change locally only");
        let state = with_remote_fields(planned, &prior);
        Ok(ResourceOutcome::present(encode(self.type_name(), &state)?).with_warning(message))
    }

    async fn delete(&self, prior: Value) -> Result<()> {
        let prior: AccountDocument = decode(self.type_name(), prior)?;
        let id = self.id_of(&prior)?;

        let result = match self.role {
            AccountRole::Source => self.api.disconnect_source_account(&id).await,
            AccountRole::Restore => self.api.disconnect_restore_account(&id).await,
        };
        match result {
            Ok(()) => {
                info!(id = %id, kind = self.role.label(), "Disconnected account");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(id = %id, kind = self.role.label(), "Account was already disconnected");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn import(&self, id: &str) -> Result<ResourceOutcome> {
        let account = self.find(id).await?.ok_or_else(|| ProviderError::NotFound {
            resource: self.type_name(),
            id: id.to_string(),
        })?;
        let state = account_document(&account);
        Ok(ResourceOutcome::present(encode(self.type_name(), &state)?))
    }
}
