//! `backstop_backup_policy` resource

use std::sync::Arc;

use async_trait::async_trait;
use backstop_api::BackupApi;
use backstop_model::BackupPolicyDocument;
use chrono::Utc;
use schemars::{Schema, schema_for};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::resource::{Resource, ResourceOutcome, decode, encode, rfc3339};
use crate::translator;

pub const TYPE_NAME: &str = "backstop_backup_policy";

/// Backup policies, reconciled through create/get/update/delete calls.
pub struct BackupPolicyResource {
    api: Arc<dyn BackupApi>,
}

impl BackupPolicyResource {
    pub fn new(api: Arc<dyn BackupApi>) -> Self {
        Self { api }
    }

    fn id_of(doc: &BackupPolicyDocument) -> Result<&str> {
        doc.id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingId { resource: TYPE_NAME })
    }

    /// Keep the caller's document when the service holds the same policy.
    fn reconcile(
        local: &BackupPolicyDocument,
        remote: BackupPolicyDocument,
    ) -> BackupPolicyDocument {
        if translator::same_policy(local, &remote) {
            BackupPolicyDocument {
                id: remote.id,
                created_at: remote.created_at.or_else(|| local.created_at.clone()),
                updated_at: remote.updated_at.or_else(|| local.updated_at.clone()),
                ..local.clone()
            }
        } else {
            remote
        }
    }
}

#[async_trait]
impl Resource for BackupPolicyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        schema_for!(BackupPolicyDocument)
    }

    async fn create(&self, planned: Value) -> Result<ResourceOutcome> {
        let planned: BackupPolicyDocument = decode(TYPE_NAME, planned)?;
        let request = translator::to_create_request(&planned)?;

        debug!(name = %request.name, "Creating backup policy");
        let created = self.api.create_backup_policy(&request).await?;
        info!(id = %created.id, name = %created.name, "Created backup policy");

        let now = rfc3339(Utc::now());
        let state = BackupPolicyDocument {
            id: Some(created.id),
            created_at: Some(created.created_time.map(rfc3339).unwrap_or_else(|| now.clone())),
            updated_at: Some(created.updated_time.map(rfc3339).unwrap_or(now)),
            ..planned
        };
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }

    async fn read(&self, prior: Value) -> Result<ResourceOutcome> {
        let prior: BackupPolicyDocument = decode(TYPE_NAME, prior)?;
        let id = Self::id_of(&prior)?;

        let remote = match self.api.get_backup_policy(id).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                info!(id = id, "Backup policy no longer exists, removing from state");
                return Ok(ResourceOutcome::gone());
            }
            Err(e) => return Err(e.into()),
        };

        let state = Self::reconcile(&prior, translator::from_remote(&remote)?);
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }

    async fn update(&self, prior: Value, planned: Value) -> Result<ResourceOutcome> {
        let prior: BackupPolicyDocument = decode(TYPE_NAME, prior)?;
        let planned: BackupPolicyDocument = decode(TYPE_NAME, planned)?;
        let id = Self::id_of(&prior)?;
        let request = translator::to_update_request(id, &planned)?;

        debug!(id = id, name = %request.body.name, "Updating backup policy");
        let updated = self.api.update_backup_policy(&request).await?;
        info!(id = %updated.id, "Updated backup policy");

        let state = BackupPolicyDocument {
            id: Some(updated.id),
            created_at: updated.created_time.map(rfc3339).or(prior.created_at),
            updated_at: Some(
                updated
                    .updated_time
                    .map(rfc3339)
                    .unwrap_or_else(|| rfc3339(Utc::now())),
            ),
            ..planned
        };
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }

    async fn delete(&self, prior: Value) -> Result<()> {
        let prior: BackupPolicyDocument = decode(TYPE_NAME, prior)?;
        let id = Self::id_of(&prior)?;

        match self.api.delete_backup_policy(id).await {
            Ok(()) => {
                info!(id = id, "Deleted backup policy");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(id = id, "Backup policy was already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn import(&self, id: &str) -> Result<ResourceOutcome> {
        let remote = self.api.get_backup_policy(id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound {
                    resource: TYPE_NAME,
                    id: id.to_string(),
                }
            } else {
                e.into()
            }
        })?;
        let state = translator::from_remote(&remote)?;
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }
}
