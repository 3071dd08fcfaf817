//! Provider entry point
//!
//! Holds the one authenticated API handle shared by every resource and data
//! source, and hands out implementations by type name.

use std::sync::Arc;

use backstop_api::{ApiClient, BackupApi};
use backstop_config::{ProviderConfig, ProviderSettings};
use schemars::{Schema, schema_for};
use tracing::info;

use crate::account::{AccountResource, AccountRole};
use crate::data_sources::{AccountsDataSource, BackupPoliciesDataSource, SnapshotDataSource};
use crate::error::Result;
use crate::policy::BackupPolicyResource;
use crate::resource::{DataSource, Resource};
use crate::restore::RestoreJobResource;

/// Name under which the provider is registered with the host.
pub const PROVIDER_NAME: &str = "backstop";

pub struct Provider {
    api: Arc<dyn BackupApi>,
}

impl Provider {
    /// Resolve settings and authenticate against the service.
    pub async fn configure(settings: &ProviderSettings) -> Result<Self> {
        let config = settings.resolve()?;
        Self::connect(&config).await
    }

    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let client = ApiClient::connect(config).await?;
        info!(project_id = %config.project_id, "Provider configured");
        Ok(Self::with_api(Arc::new(client)))
    }

    /// Use an existing API implementation.
    pub fn with_api(api: Arc<dyn BackupApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> Arc<dyn BackupApi> {
        Arc::clone(&self.api)
    }

    /// Schema of the provider configuration block.
    pub fn settings_schema() -> Schema {
        schema_for!(ProviderSettings)
    }

    pub fn resources(&self) -> Vec<Arc<dyn Resource>> {
        vec![
            Arc::new(AccountResource::new(self.api(), AccountRole::Source)),
            Arc::new(AccountResource::new(self.api(), AccountRole::Restore)),
            Arc::new(BackupPolicyResource::new(self.api())),
            Arc::new(RestoreJobResource::new(self.api())),
        ]
    }

    pub fn data_sources(&self) -> Vec<Arc<dyn DataSource>> {
        vec![
            Arc::new(AccountsDataSource::new(self.api(), AccountRole::Source)),
            Arc::new(AccountsDataSource::new(self.api(), AccountRole::Restore)),
            Arc::new(SnapshotDataSource::new(self.api())),
            Arc::new(BackupPoliciesDataSource::new(self.api())),
        ]
    }

    pub fn resource(&self, type_name: &str) -> Option<Arc<dyn Resource>> {
        self.resources().into_iter().find(|r| r.type_name() == type_name)
    }

    pub fn data_source(&self, type_name: &str) -> Option<Arc<dyn DataSource>> {
        self.data_sources().into_iter().find(|d| d.type_name() == type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backstop_api::MockApi;

    #[test]
    fn test_registry_names() {
        let provider = Provider::with_api(Arc::new(MockApi::new()));
        let resources: Vec<_> = provider.resources().iter().map(|r| r.type_name()).collect();
        assert_eq!(
            resources,
            [
                "backstop_source_account",
                "backstop_restore_account",
                "backstop_backup_policy",
                "backstop_restore_job"
            ]
        );
        let data_sources: Vec<_> = provider.data_sources().iter().map(|d| d.type_name()).collect();
        assert_eq!(
            data_sources,
            [
                "backstop_source_accounts",
                "backstop_restore_accounts",
                "backstop_snapshot",
                "backstop_backup_policies"
            ]
        );
        assert!(provider.resource("backstop_backup_policy").is_some());
        assert!(provider.data_source("backstop_nope").is_none());
    }

    #[test]
    fn test_schemas_describe_documents() {
        let provider = Provider::with_api(Arc::new(MockApi::new()));
        let policy = provider.resource("backstop_backup_policy").unwrap().schema();
        let json = serde_json::to_value(&policy).unwrap();
        assert!(json["properties"].get("resource_selector").is_some());

        let settings = serde_json::to_value(Provider::settings_schema()).unwrap();
        assert!(settings["properties"].get("client_secret").is_some());
    }

    #[tokio::test]
    async fn test_connect_fails_without_service() {
        let config = ProviderConfig {
            endpoint: "http://127.0.0.1:9".into(),
            client_id: "id".into(),
            client_secret: "secret".into(),
            project_id: "project".into(),
        };
        assert!(Provider::connect(&config).await.is_err());
    }
}
