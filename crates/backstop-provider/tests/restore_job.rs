mod common;

use std::time::Duration;

use backstop_api::RestoreRequest;
use backstop_model::JobStatus;
use backstop_model::restore::RestoreJobDocument;
use backstop_provider::{ProviderError, Resource, RestoreJobResource};
use common::{mock, seed_snapshot, state};
use serde_json::{Value, json};

fn restore(restore_type: &str, snapshot_id: &str, blocks: Value) -> Value {
    let mut doc = json!({
        "restore_type": restore_type,
        "snapshot_id": snapshot_id,
        "restore_account_id": "rst-1",
        "wait_for_completion": false
    });
    if let (Some(doc), Some(blocks)) = (doc.as_object_mut(), blocks.as_object()) {
        doc.extend(blocks.clone());
    }
    doc
}

fn ebs_config() -> Value {
    json!({
        "provider_volume_id": "vol-0abc",
        "availability_zone": "us-east-1a",
        "volume_type": "gp3",
        "volume_size": 107374182400i64
    })
}

fn ec2_config() -> Value {
    json!({
        "region": "us-east-1",
        "instance_type": "t3.micro",
        "subnet_id": "subnet-1",
        "volume_restore_params": [
            { "provider_volume_id": "vol-0abc", "volume_type": "gp3", "volume_size": 8 }
        ]
    })
}

fn rds_config() -> Value {
    json!({
        "db_instance_identifier": "orders-restored",
        "db_instance_class": "db.t3.medium",
        "engine": "postgres",
        "region": "us-east-1",
        "kms_key_id": "alias/aws/rds"
    })
}

fn s3_bucket_config() -> Value {
    json!({ "bucket_name": "restored-assets" })
}

fn s3_file_config() -> Value {
    json!({
        "bucket_name": "restored-assets",
        "key_prefix": "restore/",
        "files": [{ "path": "reports/2024", "is_directory": true }]
    })
}

#[tokio::test]
async fn test_declared_type_missing_block_makes_no_calls() {
    let api = mock();
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("partial", "snap-1", json!({ "ec2_config": ec2_config() }));
    planned["resource_id"] = "i-0abc".into();
    planned["resource_type"] = "AWS_EC2".into();

    let err = jobs.create(planned).await.unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(err.to_string().contains("ebs_config"), "{err}");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_no_usable_block_makes_no_calls() {
    let api = mock();
    let jobs = RestoreJobResource::new(api.clone());

    let err = jobs.create(restore("full", "snap-1", json!({}))).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        concat!(
            "Invalid configuration: ec2_config or rds_config or s3_bucket_config ",
            "is required for full restores"
        )
    );
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_unsupported_declared_type_makes_no_calls() {
    let api = mock();
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-1", json!({ "ec2_config": ec2_config() }));
    planned["resource_type"] = "AZURE_VM".into();

    let err = jobs.create(planned).await.unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_wrong_block_for_inventory_type_fails_before_submit() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "i-0abc", "AWS_EC2");
    let jobs = RestoreJobResource::new(api.clone());

    let err = jobs
        .create(restore("partial", "snap-1", json!({ "rds_config": rds_config() })))
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("ebs_config is required for partial restores of AWS_EC2"),
        "{err}"
    );
    assert_eq!(api.calls("get_snapshot"), 1);
    assert_eq!(api.calls("get_resource"), 1);
    assert_eq!(api.calls("start_restore"), 0);
}

#[tokio::test]
async fn test_declared_type_must_match_inventory() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "i-0abc", "AWS_EC2");
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["resource_type"] = "AWS_RDS".into();

    let err = jobs.create(planned).await.unwrap_err();
    assert!(err.is_validation(), "{err}");
    assert!(
        err.to_string()
            .contains("resource_type is AWS_RDS but resource i-0abc is AWS_EC2"),
        "{err}"
    );
    assert_eq!(api.calls("get_resource"), 1);
    assert_eq!(api.calls("start_restore"), 0);
    assert!(api.restores().is_empty());
}

#[tokio::test]
async fn test_declared_type_matching_inventory_is_submitted() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-orders", "AWS_RDS");
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["resource_type"] = "AWS_RDS".into();

    let tracked: RestoreJobDocument = state(&jobs.create(planned).await.unwrap());
    assert_eq!(tracked.resource_type.as_deref(), Some("AWS_RDS"));
    assert_eq!(api.calls("get_resource"), 1);
    assert_eq!(api.restores()[0].request.action(), "restore-database");
}

#[tokio::test]
async fn test_dispatch_by_resource_and_restore_type() {
    let cases = [
        ("AWS_EC2", "partial", "ebs_config", ebs_config(), "restore-volume"),
        ("AWS_EC2", "full", "ec2_config", ec2_config(), "restore-instance"),
        ("AWS_RDS", "full", "rds_config", rds_config(), "restore-database"),
        ("AWS_RDS", "partial", "rds_config", rds_config(), "restore-database"),
        ("AWS_S3", "full", "s3_bucket_config", s3_bucket_config(), "restore-bucket"),
        ("AWS_S3", "partial", "s3_file_config", s3_file_config(), "restore-files"),
    ];

    for (resource_type, restore_type, block, config, action) in cases {
        let api = mock();
        seed_snapshot(&api, "snap-1", "res-1", resource_type);
        let jobs = RestoreJobResource::new(api.clone());

        let outcome = jobs
            .create(restore(restore_type, "snap-1", json!({ block: config })))
            .await
            .unwrap();
        let restores = api.restores();
        assert_eq!(restores.len(), 1, "{resource_type}/{restore_type}");
        assert_eq!(restores[0].request.action(), action, "{resource_type}/{restore_type}");
        assert_eq!(restores[0].resource_id, "res-1");
        assert_eq!(restores[0].snapshot_id, "snap-1");

        let tracked: RestoreJobDocument = state(&outcome);
        assert_eq!(tracked.resource_type.as_deref(), Some(resource_type));
        assert_eq!(tracked.status.as_deref(), Some("JOB_PENDING"));
    }
}

#[tokio::test]
async fn test_instance_volume_sizes_are_sent_in_bytes() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "i-0abc", "AWS_EC2");
    let jobs = RestoreJobResource::new(api.clone());

    jobs.create(restore("full", "snap-1", json!({ "ec2_config": ec2_config() })))
        .await
        .unwrap();
    let restores = api.restores();
    let RestoreRequest::Instance(request) = &restores[0].request else {
        panic!("expected an instance restore, got {:?}", restores[0].request);
    };
    let volume = &request.destination.aws_ec2.volume_restore_parameters[0];
    assert_eq!(volume.volume_settings.size_bytes, 8 * 1024 * 1024 * 1024);
    assert_eq!(request.restore_account_id, "rst-1");
}

#[tokio::test]
async fn test_without_wait_makes_no_status_calls() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    let jobs = RestoreJobResource::new(api.clone());

    let outcome = jobs
        .create(restore("full", "snap-1", json!({ "rds_config": rds_config() })))
        .await
        .unwrap();
    let tracked: RestoreJobDocument = state(&outcome);
    assert_eq!(tracked.job_id.as_deref(), Some("job-1"));
    assert_eq!(tracked.id, tracked.job_id);
    assert_eq!(tracked.resource_id.as_deref(), Some("db-1"));
    assert!(tracked.created_at.is_some());
    assert_eq!(api.calls("get_restore_job"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_wait_follows_job_to_completion() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    api.script_next_job(&[
        ("JOB_PENDING", None),
        ("JOB_RUNNING", None),
        ("JOB_COMPLETED", None),
    ]);
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["wait_for_completion"] = true.into();

    let outcome = jobs.create(planned).await.unwrap();
    let tracked: RestoreJobDocument = state(&outcome);
    assert_eq!(tracked.job_status(), Some(JobStatus::Completed));
    assert!(tracked.started_at.is_some());
    assert!(tracked.completed_at.is_some());
    assert_eq!(tracked.duration_seconds, Some(0));
    assert_eq!(api.calls("get_restore_job"), 3);
    assert!(outcome.warnings.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_with_last_known_state() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    api.script_next_job(&[("JOB_RUNNING", None)]);
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["wait_for_completion"] = true.into();
    planned["timeout_minutes"] = 1.into();

    let err = jobs.create(planned).await.unwrap_err();
    assert!(matches!(err, ProviderError::RestoreTimeout { timeout_minutes: 1, .. }), "{err}");
    let tracked = err.restore_state().unwrap();
    assert_eq!(tracked.job_id.as_deref(), Some("job-1"));
    assert_eq!(tracked.status.as_deref(), Some("JOB_RUNNING"));
    assert!(tracked.completed_at.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_reports_remote_message() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    api.script_next_job(&[
        ("JOB_PENDING", None),
        ("JOB_FAILED", Some("subnet group not found")),
    ]);
    let jobs = RestoreJobResource::new(api.clone()).with_poll_interval(Duration::from_secs(1));
    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["wait_for_completion"] = true.into();

    let err = jobs.create(planned).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Restore job job-1 ended with JOB_FAILED: subnet group not found"
    );
    let tracked = err.restore_state().unwrap();
    assert_eq!(tracked.job_status(), Some(JobStatus::Failed));
}

#[tokio::test(start_paused = true)]
async fn test_partial_job_succeeds_with_warning() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "bucket-1", "AWS_S3");
    api.script_next_job(&[("JOB_PARTIAL", Some("2 objects skipped"))]);
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("partial", "snap-1", json!({ "s3_file_config": s3_file_config() }));
    planned["wait_for_completion"] = true.into();

    let outcome = jobs.create(planned).await.unwrap();
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("2 objects skipped"));
}

#[tokio::test]
async fn test_submit_failure_leaves_nothing_to_track() {
    let api = mock();
    let jobs = RestoreJobResource::new(api.clone());
    let mut planned = restore("full", "snap-missing", json!({ "rds_config": rds_config() }));
    planned["resource_id"] = "db-1".into();
    planned["resource_type"] = "AWS_RDS".into();

    let err = jobs.create(planned).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api(ref e) if e.is_not_found()), "{err}");
    assert!(err.restore_state().is_none());
    assert!(api.restores().is_empty());
}

#[tokio::test]
async fn test_read_refreshes_and_drops_unknown_jobs() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    let jobs = RestoreJobResource::new(api.clone());
    let created = jobs
        .create(restore("full", "snap-1", json!({ "rds_config": rds_config() })))
        .await
        .unwrap()
        .state
        .unwrap();

    let refreshed: RestoreJobDocument = state(&jobs.read(created.clone()).await.unwrap());
    assert_eq!(refreshed.job_status(), Some(JobStatus::Completed));

    let mut unknown = created;
    unknown["id"] = "job-404".into();
    unknown["job_id"] = "job-404".into();
    assert!(jobs.read(unknown).await.unwrap().is_gone());
}

#[tokio::test]
async fn test_update_only_changes_wait_settings() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    let jobs = RestoreJobResource::new(api.clone());
    let prior = jobs
        .create(restore("full", "snap-1", json!({ "rds_config": rds_config() })))
        .await
        .unwrap()
        .state
        .unwrap();
    let calls = api.total_calls();

    let mut planned = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    planned["timeout_minutes"] = 120.into();
    let updated: RestoreJobDocument = state(&jobs.update(prior.clone(), planned).await.unwrap());
    assert_eq!(updated.timeout_minutes, 120);
    assert_eq!(updated.job_id.as_deref(), Some("job-1"));
    assert_eq!(api.total_calls(), calls);

    let mut moved = restore("full", "snap-2", json!({ "rds_config": rds_config() }));
    moved["rds_config"]["engine"] = "mysql".into();
    let err = jobs.update(prior, moved).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Changing snapshot_id, rds_config of a backstop_restore_job requires replacing it"
    );
    assert_eq!(api.total_calls(), calls);
}

#[tokio::test]
async fn test_delete_forgets_without_remote_calls() {
    let api = mock();
    let jobs = RestoreJobResource::new(api.clone());
    let mut prior = restore("full", "snap-1", json!({ "rds_config": rds_config() }));
    prior["job_id"] = "job-9".into();

    jobs.delete(prior).await.unwrap();
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn test_import_reads_job_status() {
    let api = mock();
    seed_snapshot(&api, "snap-1", "db-1", "AWS_RDS");
    let jobs = RestoreJobResource::new(api.clone());
    jobs.create(restore("full", "snap-1", json!({ "rds_config": rds_config() })))
        .await
        .unwrap();

    let imported: RestoreJobDocument = state(&jobs.import("job-1").await.unwrap());
    assert_eq!(imported.job_id.as_deref(), Some("job-1"));
    assert_eq!(imported.job_status(), Some(JobStatus::Completed));

    let err = jobs.import("job-404").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { .. }));
}
