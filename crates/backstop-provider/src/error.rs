//! Provider error type

use backstop_api::ApiError;
use backstop_config::ConfigError;
use backstop_model::restore::RestoreJobDocument;
use backstop_model::{JobStatus, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Local pre-flight failure; no remote call was made.
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Malformed {resource} document: {source}")]
    Document {
        resource: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{resource} {id} does not exist")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} has no id in its state")]
    MissingId { resource: &'static str },

    #[error("Changing {} of a {resource} requires replacing it", .fields.join(", "))]
    RequiresReplacement {
        resource: &'static str,
        fields: Vec<&'static str>,
    },

    /// The job did not finish in time. `state` holds whatever the last
    /// status fetch returned.
    #[error("Restore job {job_id} did not finish within {timeout_minutes} minutes")]
    RestoreTimeout {
        job_id: String,
        timeout_minutes: u32,
        state: Box<RestoreJobDocument>,
    },

    #[error("Restore job {job_id} ended with {status}: {message}")]
    RestoreFailed {
        job_id: String,
        status: JobStatus,
        message: String,
        state: Box<RestoreJobDocument>,
    },

    #[error("Lost track of restore job {job_id}: {source}")]
    RestoreTracking {
        job_id: String,
        #[source]
        source: ApiError,
        state: Box<RestoreJobDocument>,
    },
}

impl ProviderError {
    /// The restore job as last observed, for errors raised after submission.
    ///
    /// The job exists remotely at that point, so the host should keep
    /// tracking it even though the operation failed.
    pub fn restore_state(&self) -> Option<&RestoreJobDocument> {
        match self {
            ProviderError::RestoreTimeout { state, .. }
            | ProviderError::RestoreFailed { state, .. }
            | ProviderError::RestoreTracking { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ProviderError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
