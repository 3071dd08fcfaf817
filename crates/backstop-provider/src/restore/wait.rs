//! Waiting for a submitted restore job
//!
//! The poll loop runs inside the caller's future. Nothing is spawned, so
//! dropping the future (host cancellation) stops polling immediately.

use std::time::Duration;

use backstop_api::{ApiError, BackupApi, RestoreJob};
use backstop_model::JobStatus;
use backstop_model::restore::RestoreJobDocument;
use tracing::{debug, info, warn};

use crate::error::{ProviderError, Result};
use crate::resource::rfc3339;

/// Copy the remote job status into the tracked document.
pub(crate) fn apply_status(state: &mut RestoreJobDocument, job: &RestoreJob) {
    state.status = Some(JobStatus::from_remote(&job.status).to_string());
    if job.status_message.is_some() {
        state.status_message = job.status_message.clone();
    }
    if let Some(created) = job.created_time {
        state.created_at = Some(rfc3339(created));
    }
    if let Some(started) = job.start_time {
        state.started_at = Some(rfc3339(started));
    }
    if let Some(ended) = job.end_time {
        state.completed_at = Some(rfc3339(ended));
    }
    if job.duration_seconds.is_some() {
        state.duration_seconds = job.duration_seconds;
    }
}

async fn poll_until_terminal(
    api: &dyn BackupApi,
    job_id: &str,
    interval: Duration,
    state: &mut RestoreJobDocument,
) -> std::result::Result<JobStatus, ApiError> {
    loop {
        let job = api.get_restore_job(job_id).await?;
        apply_status(state, &job);
        let status = JobStatus::from_remote(&job.status);
        debug!(job_id = job_id, status = %status, "Polled restore job");
        if status.is_terminal() {
            return Ok(status);
        }
        tokio::time::sleep(interval).await;
    }
}

/// Best-effort refresh after the wait was cut short.
async fn final_fetch(api: &dyn BackupApi, job_id: &str, state: &mut RestoreJobDocument) -> bool {
    match api.get_restore_job(job_id).await {
        Ok(job) => {
            apply_status(state, &job);
            true
        }
        Err(e) => {
            warn!(job_id = job_id, error = %e, "Final status fetch for restore job failed");
            false
        }
    }
}

/// Poll `job_id` every `interval` until it is terminal or `timeout_minutes`
/// have elapsed. The returned document is the final observed state.
pub(crate) async fn wait_for_job(
    api: &dyn BackupApi,
    job_id: &str,
    interval: Duration,
    timeout_minutes: u32,
    mut state: RestoreJobDocument,
) -> Result<RestoreJobDocument> {
    let budget = Duration::from_secs(u64::from(timeout_minutes) * 60);
    info!(job_id = job_id, timeout_minutes = timeout_minutes, "Waiting for restore job");

    let polled =
        tokio::time::timeout(budget, poll_until_terminal(api, job_id, interval, &mut state)).await;
    match polled {
        Ok(Ok(status)) if status.is_failure() => {
            let message = state
                .status_message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.to_string());
            warn!(job_id = job_id, status = %status, message = %message, "Restore job failed");
            Err(ProviderError::RestoreFailed {
                job_id: job_id.to_string(),
                status,
                message,
                state: Box::new(state),
            })
        }
        Ok(Ok(status)) => {
            info!(job_id = job_id, status = %status, "Restore job finished");
            Ok(state)
        }
        Ok(Err(source)) => {
            final_fetch(api, job_id, &mut state).await;
            Err(ProviderError::RestoreTracking {
                job_id: job_id.to_string(),
                source,
                state: Box::new(state),
            })
        }
        Err(_elapsed) => {
            warn!(
                job_id = job_id,
                timeout_minutes = timeout_minutes,
                "Timed out waiting for restore job"
            );
            if !final_fetch(api, job_id, &mut state).await {
                state.status_message = Some(format!(
                    "status unknown after waiting {timeout_minutes} minutes"
                ));
            }
            Err(ProviderError::RestoreTimeout {
                job_id: job_id.to_string(),
                timeout_minutes,
                state: Box::new(state),
            })
        }
    }
}
