mod common;

use backstop_api::BackupApi;
use backstop_model::AccountDocument;
use backstop_provider::{AccountResource, AccountRole, ProviderError, Resource};
use common::{mock, state};
use serde_json::{Value, json};

fn aws_account(name: &str) -> Value {
    json!({
        "name": name,
        "provider_account_id": "123456789012",
        "role": "arn:aws:iam::123456789012:role/BackstopAccess"
    })
}

#[tokio::test]
async fn test_connect_source_account() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Source);

    let outcome = accounts.create(aws_account("prod")).await.unwrap();
    let connected: AccountDocument = state(&outcome);
    assert_eq!(connected.id.as_deref(), Some("src-1"));
    assert_eq!(connected.status.as_deref(), Some("CONNECTED"));
    assert_eq!(connected.cloud_provider, "AWS");
    assert_eq!(connected.provider_account_id, "123456789012");
    assert_eq!(api.calls("connect_source_account"), 1);
    assert_eq!(api.calls("connect_restore_account"), 0);
}

#[tokio::test]
async fn test_connect_restore_account() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Restore);

    let connected: AccountDocument = state(&accounts.create(aws_account("dr")).await.unwrap());
    assert_eq!(connected.id.as_deref(), Some("rst-1"));
    assert_eq!(api.calls("connect_restore_account"), 1);
}

#[tokio::test]
async fn test_non_aws_account_is_rejected_locally() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Source);
    let mut planned = aws_account("prod");
    planned["cloud_provider"] = "AZURE".into();

    let err = accounts.create(planned).await.unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_read_follows_remote_and_drops_disconnected() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Source);
    let created = accounts.create(aws_account("prod")).await.unwrap().state.unwrap();

    let read: AccountDocument = state(&accounts.read(created.clone()).await.unwrap());
    assert_eq!(read.name, "prod");
    assert_eq!(read.role.as_deref(), Some("arn:aws:iam::123456789012:role/BackstopAccess"));

    api.disconnect_source_account("src-1").await.unwrap();
    assert!(accounts.read(created).await.unwrap().is_gone());
}

#[tokio::test]
async fn test_update_identity_requires_replacement() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Source);
    let prior = accounts.create(aws_account("prod")).await.unwrap().state.unwrap();
    let calls = api.total_calls();

    let mut planned = aws_account("prod");
    planned["role"] = "arn:aws:iam::123456789012:role/Other".into();
    let err = accounts.update(prior.clone(), planned).await.unwrap_err();
    assert!(matches!(
        err,
        ProviderError::RequiresReplacement { ref fields, .. } if fields == &["role"]
    ));

    let outcome = accounts.update(prior, aws_account("production")).await.unwrap();
    let updated: AccountDocument = state(&outcome);
    assert_eq!(updated.name, "production");
    assert_eq!(updated.id.as_deref(), Some("src-1"));
    assert_eq!(
        outcome.warnings,
        ["Most source account changes require replacement"]
    );
    assert_eq!(api.total_calls(), calls);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Restore);
    let created = accounts.create(aws_account("dr")).await.unwrap().state.unwrap();

    accounts.delete(created.clone()).await.unwrap();
    accounts.delete(created).await.unwrap();
    assert_eq!(api.calls("disconnect_restore_account"), 2);
    assert!(api.list_restore_accounts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_import_finds_connected_accounts_only() {
    let api = mock();
    let accounts = AccountResource::new(api.clone(), AccountRole::Source);
    accounts.create(aws_account("prod")).await.unwrap();

    let imported: AccountDocument = state(&accounts.import("src-1").await.unwrap());
    assert_eq!(imported.name, "prod");
    assert_eq!(imported.provider_account_id, "123456789012");

    let restore_side = AccountResource::new(api.clone(), AccountRole::Restore);
    let err = restore_side.import("src-1").await.unwrap_err();
    assert_eq!(err.to_string(), "backstop_restore_account src-1 does not exist");
}
