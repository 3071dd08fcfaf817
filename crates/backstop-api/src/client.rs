//! Backup service API client
//!
//! [`BackupApi`] is the seam between resource logic and the network.
//! [`ApiClient`] implements it over HTTPS with client-credential auth:
//! a bearer token is obtained at construction and refreshed whenever it is
//! within [`REFRESH_MARGIN_SECS`](crate::token::REFRESH_MARGIN_SECS) of expiry.

use async_trait::async_trait;
use backstop_config::ProviderConfig;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ApiError, Result};
use crate::token::TokenCache;
use crate::types::*;

/// Operations the provider needs from the backup service.
#[async_trait]
pub trait BackupApi: Send + Sync {
    async fn list_source_accounts(&self) -> Result<Vec<Account>>;
    async fn connect_source_account(&self, request: &ConnectAccountRequest) -> Result<Account>;
    async fn disconnect_source_account(&self, id: &str) -> Result<()>;

    async fn list_restore_accounts(&self) -> Result<Vec<Account>>;
    async fn connect_restore_account(&self, request: &ConnectAccountRequest) -> Result<Account>;
    async fn disconnect_restore_account(&self, id: &str) -> Result<()>;

    async fn list_backup_policies(&self) -> Result<Vec<BackupPolicy>>;
    async fn get_backup_policy(&self, id: &str) -> Result<BackupPolicy>;
    async fn create_backup_policy(&self, request: &CreateBackupPolicyRequest)
    -> Result<BackupPolicy>;
    async fn update_backup_policy(&self, request: &UpdateBackupPolicyRequest)
    -> Result<BackupPolicy>;
    async fn delete_backup_policy(&self, id: &str) -> Result<()>;

    async fn get_snapshot(&self, id: &str) -> Result<Snapshot>;
    async fn get_resource(&self, id: &str) -> Result<InventoryResource>;

    /// Submit a restore of `snapshot_id` of `resource_id`; returns the job id.
    async fn start_restore(
        &self,
        resource_id: &str,
        snapshot_id: &str,
        request: &RestoreRequest,
    ) -> Result<String>;
    async fn get_restore_job(&self, id: &str) -> Result<RestoreJob>;
}

/// HTTPS implementation of [`BackupApi`].
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: String,
    project_id: String,
    client_id: String,
    client_secret: String,
    tokens: TokenCache,
    refresh: Mutex<()>,
}

impl ApiClient {
    /// Create a client and authenticate once, so bad credentials fail here.
    pub async fn connect(config: &ProviderConfig) -> Result<Self> {
        let client = Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tokens: TokenCache::new(),
            refresh: Mutex::new(()),
        };
        client.authenticate().await?;
        info!(
            endpoint = %client.endpoint,
            project_id = %client.project_id,
            "Connected to backup service"
        );
        Ok(client)
    }

    async fn authenticate(&self) -> Result<String> {
        let url = format!("{}/api/v1/token", self.endpoint);
        debug!(url = %url, "Requesting access token");

        let response = self
            .http
            .post(&url)
            .json(&TokenRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Authentication(format!("{}: {}", status.as_u16(), body)));
        }
        let token: TokenResponse = serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            what: "access token".to_string(),
            source,
        })?;

        self.tokens
            .store(token.access_token.clone(), token.expires_in, Utc::now());
        Ok(token.access_token)
    }

    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.tokens.current(Utc::now()) {
            return Ok(token);
        }
        let _guard = self.refresh.lock().await;
        // Another task may have refreshed while we waited.
        if let Some(token) = self.tokens.current(Utc::now()) {
            return Ok(token);
        }
        debug!("Access token expired or missing, refreshing");
        self.authenticate().await
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/projects/{}/{}",
            self.endpoint, self.project_id, path
        )
    }

    async fn send_raw(&self, what: &str, request: RequestBuilder) -> Result<String> {
        let token = self.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;
        self.response_body(what, status, body)
    }

    /// A rejected token is dropped so the next call authenticates again.
    fn response_body(&self, what: &str, status: StatusCode, body: String) -> Result<String> {
        if status == StatusCode::UNAUTHORIZED {
            debug!(what = what, "Access token rejected, discarding it");
            self.tokens.clear();
        }
        check_status(what, status, body)
    }

    async fn send<T: DeserializeOwned>(&self, what: &str, request: RequestBuilder) -> Result<T> {
        let body = self.send_raw(what, request).await?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            what: what.to_string(),
            source,
        })
    }

    async fn list_accounts(&self, kind: &str) -> Result<Vec<Account>> {
        let list: AccountList = self
            .send(kind, self.http.get(self.url(kind)))
            .await?;
        Ok(list.accounts)
    }

    async fn connect_account(
        &self,
        kind: &str,
        request: &ConnectAccountRequest,
    ) -> Result<Account> {
        debug!(kind = kind, name = %request.name, "Connecting account");
        let envelope: AccountEnvelope = self
            .send(kind, self.http.post(self.url(kind)).json(request))
            .await?;
        Ok(envelope.account)
    }

    async fn disconnect_account(&self, kind: &str, id: &str) -> Result<()> {
        debug!(kind = kind, id = id, "Disconnecting account");
        let url = self.url(&format!("{kind}/{id}/disconnect"));
        self.send_raw(&format!("{kind} {id}"), self.http.post(url))
            .await
            .map(|_| ())
    }
}

fn check_status(what: &str, status: StatusCode, body: String) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound {
            what: what.to_string(),
            body,
        });
    }
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl BackupApi for ApiClient {
    async fn list_source_accounts(&self) -> Result<Vec<Account>> {
        self.list_accounts("source-accounts").await
    }

    async fn connect_source_account(&self, request: &ConnectAccountRequest) -> Result<Account> {
        self.connect_account("source-accounts", request).await
    }

    async fn disconnect_source_account(&self, id: &str) -> Result<()> {
        self.disconnect_account("source-accounts", id).await
    }

    async fn list_restore_accounts(&self) -> Result<Vec<Account>> {
        self.list_accounts("restore-accounts").await
    }

    async fn connect_restore_account(&self, request: &ConnectAccountRequest) -> Result<Account> {
        self.connect_account("restore-accounts", request).await
    }

    async fn disconnect_restore_account(&self, id: &str) -> Result<()> {
        self.disconnect_account("restore-accounts", id).await
    }

    async fn list_backup_policies(&self) -> Result<Vec<BackupPolicy>> {
        let list: BackupPolicyList = self
            .send("backup policies", self.http.get(self.url("backup-policies")))
            .await?;
        Ok(list.backup_policies)
    }

    async fn get_backup_policy(&self, id: &str) -> Result<BackupPolicy> {
        let url = self.url(&format!("backup-policies/{id}"));
        let envelope: BackupPolicyEnvelope = self
            .send(&format!("backup policy {id}"), self.http.get(url))
            .await?;
        Ok(envelope.backup_policy)
    }

    async fn create_backup_policy(
        &self,
        request: &CreateBackupPolicyRequest,
    ) -> Result<BackupPolicy> {
        debug!(name = %request.name, "Creating backup policy");
        let envelope: BackupPolicyEnvelope = self
            .send(
                "backup policy",
                self.http.post(self.url("backup-policies")).json(request),
            )
            .await?;
        Ok(envelope.backup_policy)
    }

    async fn update_backup_policy(
        &self,
        request: &UpdateBackupPolicyRequest,
    ) -> Result<BackupPolicy> {
        debug!(id = %request.id, "Updating backup policy");
        let url = self.url(&format!("backup-policies/{}", request.id));
        let envelope: BackupPolicyEnvelope = self
            .send(
                &format!("backup policy {}", request.id),
                self.http.put(url).json(request),
            )
            .await?;
        Ok(envelope.backup_policy)
    }

    async fn delete_backup_policy(&self, id: &str) -> Result<()> {
        debug!(id = id, "Deleting backup policy");
        let url = self.url(&format!("backup-policies/{id}"));
        self.send_raw(&format!("backup policy {id}"), self.http.delete(url))
            .await
            .map(|_| ())
    }

    async fn get_snapshot(&self, id: &str) -> Result<Snapshot> {
        let url = self.url(&format!("snapshots/{id}"));
        let envelope: SnapshotEnvelope = self
            .send(&format!("snapshot {id}"), self.http.get(url))
            .await?;
        Ok(envelope.snapshot)
    }

    async fn get_resource(&self, id: &str) -> Result<InventoryResource> {
        let url = self.url(&format!("resources/{id}"));
        let envelope: ResourceEnvelope = self
            .send(&format!("resource {id}"), self.http.get(url))
            .await?;
        Ok(envelope.resource)
    }

    async fn start_restore(
        &self,
        resource_id: &str,
        snapshot_id: &str,
        request: &RestoreRequest,
    ) -> Result<String> {
        let url = self.url(&format!(
            "resources/{resource_id}/snapshots/{snapshot_id}/{}",
            request.action()
        ));
        debug!(
            resource_id = resource_id,
            snapshot_id = snapshot_id,
            action = request.action(),
            "Starting restore"
        );
        let response: StartRestoreResponse = self
            .send(
                &format!("snapshot {snapshot_id}"),
                self.http.post(url).json(request),
            )
            .await?;
        Ok(response.job_id)
    }

    async fn get_restore_job(&self, id: &str) -> Result<RestoreJob> {
        let url = self.url(&format!("restore-jobs/{id}"));
        let envelope: RestoreJobEnvelope = self
            .send(&format!("restore job {id}"), self.http.get(url))
            .await?;
        Ok(envelope.job)
    }
}
