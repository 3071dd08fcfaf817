//! `backstop_restore_job` resource
//!
//! Creating the resource submits a restore. The target builder is picked
//! from the restore type and the snapshotted resource's inventory type:
//!
//! | resource type | full               | partial          |
//! |---------------|--------------------|------------------|
//! | `AWS_EC2`     | `ec2_config`       | `ebs_config`     |
//! | `AWS_RDS`     | `rds_config`       | `rds_config`     |
//! | `AWS_S3`      | `s3_bucket_config` | `s3_file_config` |
//!
//! A job that exists remotely is never resubmitted by `update`; restore
//! parameters are replace-only.

mod target;
mod wait;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backstop_api::BackupApi;
use backstop_model::restore::RestoreJobDocument;
use backstop_model::{
    JobStatus, Keyword, ResourceType, RestoreTarget, RestoreType, ValidationError,
};
use chrono::Utc;
use schemars::{Schema, schema_for};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ProviderError, Result};
use crate::resource::{Resource, ResourceOutcome, decode, encode, rfc3339};

pub const TYPE_NAME: &str = "backstop_restore_job";

/// Interval between status polls while waiting for a job.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct RestoreJobResource {
    api: Arc<dyn BackupApi>,
    poll_interval: Duration,
}

/// Everything needed to submit, resolved before the submit call.
struct Submission {
    resource_id: String,
    resource_type: ResourceType,
    request: backstop_api::RestoreRequest,
}

impl RestoreJobResource {
    pub fn new(api: Arc<dyn BackupApi>) -> Self {
        Self {
            api,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn job_id_of(doc: &RestoreJobDocument) -> Result<String> {
        doc.job_id
            .clone()
            .or_else(|| doc.id.clone())
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::MissingId { resource: TYPE_NAME })
    }

    /// Resolve the source resource and build the request.
    ///
    /// A declared `resource_type` lets the target be validated before any
    /// remote call. The inventory is consulted either way, and a declared
    /// type that disagrees with it is rejected.
    async fn prepare(
        &self,
        doc: &RestoreJobDocument,
        restore_type: RestoreType,
    ) -> Result<Submission> {
        let declared = doc.declared_resource_type()?;
        if let Some(resource_type) = declared {
            RestoreTarget::select(restore_type, resource_type, doc)?;
        } else {
            ensure_any_block(doc, restore_type)?;
        }

        let resource_id = match doc.resource_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                debug!(snapshot_id = %doc.snapshot_id, "Looking up snapshot for resource id");
                self.api.get_snapshot(&doc.snapshot_id).await?.resource_id
            }
        };

        debug!(resource_id = %resource_id, "Looking up inventory resource type");
        let resource = self.api.get_resource(&resource_id).await?;
        let resource_type =
            ResourceType::parse_field("resource type of the snapshot", &resource.resource_type)?;
        if let Some(declared) = declared.filter(|d| *d != resource_type) {
            return Err(ValidationError::ResourceTypeMismatch {
                resource_id,
                declared: declared.to_string(),
                actual: resource_type.to_string(),
            }
            .into());
        }

        let target = RestoreTarget::select(restore_type, resource_type, doc)?;
        Ok(Submission {
            resource_id,
            resource_type,
            request: target::to_request(&target, &doc.restore_account_id),
        })
    }
}

/// Fail early when no block that `restore_type` could ever use is present.
fn ensure_any_block(doc: &RestoreJobDocument, restore_type: RestoreType) -> Result<()> {
    let candidates: [(&str, bool); 3] = match restore_type {
        RestoreType::Partial => [
            ("ebs_config", doc.ebs_config.is_some()),
            ("rds_config", doc.rds_config.is_some()),
            ("s3_file_config", doc.s3_file_config.is_some()),
        ],
        RestoreType::Full => [
            ("ec2_config", doc.ec2_config.is_some()),
            ("rds_config", doc.rds_config.is_some()),
            ("s3_bucket_config", doc.s3_bucket_config.is_some()),
        ],
    };
    if candidates.iter().any(|(_, set)| *set) {
        return Ok(());
    }
    let names: Vec<&str> = candidates.iter().map(|(name, _)| *name).collect();
    Err(ValidationError::missing(
        names.join(" or "),
        format!("for {restore_type} restores"),
    )
    .into())
}

#[async_trait]
impl Resource for RestoreJobResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        schema_for!(RestoreJobDocument)
    }

    fn replace_on_change(&self) -> &'static [&'static str] {
        &RestoreJobDocument::IDENTIFYING_FIELDS
    }

    async fn create(&self, planned: Value) -> Result<ResourceOutcome> {
        let planned: RestoreJobDocument = decode(TYPE_NAME, planned)?;
        let restore_type = planned.restore_type()?;
        let timeout_minutes = planned.timeout_minutes()?;

        let submission = self.prepare(&planned, restore_type).await?;
        debug!(
            snapshot_id = %planned.snapshot_id,
            resource_id = %submission.resource_id,
            resource_type = %submission.resource_type,
            action = submission.request.action(),
            "Submitting restore"
        );
        let job_id = self
            .api
            .start_restore(&submission.resource_id, &planned.snapshot_id, &submission.request)
            .await?;
        info!(job_id = %job_id, snapshot_id = %planned.snapshot_id, "Submitted restore job");

        let state = RestoreJobDocument {
            id: Some(job_id.clone()),
            job_id: Some(job_id.clone()),
            resource_id: Some(submission.resource_id),
            resource_type: Some(submission.resource_type.to_string()),
            status: Some(JobStatus::Pending.to_string()),
            created_at: Some(rfc3339(Utc::now())),
            ..planned
        };
        if !state.wait_for_completion {
            return Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?));
        }

        let state = wait::wait_for_job(
            self.api.as_ref(),
            &job_id,
            self.poll_interval,
            timeout_minutes,
            state,
        )
        .await?;
        let mut outcome = ResourceOutcome::present(encode(TYPE_NAME, &state)?);
        if state.job_status() == Some(JobStatus::Partial) {
            let message = state
                .status_message
                .as_deref()
                .unwrap_or("some items were not restored");
            outcome =
                outcome.with_warning(format!("Restore job {job_id} finished partially: {message}"));
        }
        Ok(outcome)
    }

    async fn read(&self, prior: Value) -> Result<ResourceOutcome> {
        let mut state: RestoreJobDocument = decode(TYPE_NAME, prior)?;
        let job_id = Self::job_id_of(&state)?;

        match self.api.get_restore_job(&job_id).await {
            Ok(job) => {
                wait::apply_status(&mut state, &job);
                Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
            }
            Err(e) if e.is_not_found() => {
                info!(job_id = %job_id, "Restore job no longer exists, removing from state");
                Ok(ResourceOutcome::gone())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, prior: Value, planned: Value) -> Result<ResourceOutcome> {
        let prior: RestoreJobDocument = decode(TYPE_NAME, prior)?;
        let planned: RestoreJobDocument = decode(TYPE_NAME, planned)?;
        planned.timeout_minutes()?;

        let changed = prior.identity_changes(&planned);
        if !changed.is_empty() {
            return Err(ProviderError::RequiresReplacement {
                resource: TYPE_NAME,
                fields: changed,
            });
        }

        // Only the local wait settings can change; the job itself is untouched.
        let state = RestoreJobDocument {
            timeout_minutes: planned.timeout_minutes,
            wait_for_completion: planned.wait_for_completion,
            ..prior
        };
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }

    async fn delete(&self, prior: Value) -> Result<()> {
        let prior: RestoreJobDocument = decode(TYPE_NAME, prior)?;
        info!(
            job_id = ?prior.job_id,
            "Forgetting restore job; restored resources are left in place"
        );
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<ResourceOutcome> {
        let job = self.api.get_restore_job(id).await.map_err(|e| {
            if e.is_not_found() {
                ProviderError::NotFound {
                    resource: TYPE_NAME,
                    id: id.to_string(),
                }
            } else {
                e.into()
            }
        })?;
        // The job record does not carry the submission parameters.
        let mut state = RestoreJobDocument {
            id: Some(job.id.clone()),
            job_id: Some(job.id.clone()),
            restore_type: String::new(),
            snapshot_id: String::new(),
            resource_id: None,
            resource_type: None,
            restore_account_id: String::new(),
            ebs_config: None,
            ec2_config: None,
            rds_config: None,
            s3_bucket_config: None,
            s3_file_config: None,
            timeout_minutes: 60,
            wait_for_completion: false,
            status: None,
            status_message: None,
            created_at: None,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
        };
        wait::apply_status(&mut state, &job);
        Ok(ResourceOutcome::present(encode(TYPE_NAME, &state)?))
    }
}
