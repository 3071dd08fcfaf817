//! # backstop-provider
//!
//! Declarative resources and data sources for the backstop backup service.
//!
//! The host drives each [`Resource`] through create/read/update/delete and
//! import, passing documents as JSON values. Local validation always runs
//! before any remote call, and a remote "not found" on read or delete is a
//! state transition rather than an error.
//!
//! ```no_run
//! use backstop_config::ProviderSettings;
//! use backstop_provider::Provider;
//!
//! # async fn run() -> backstop_provider::Result<()> {
//! let provider = Provider::configure(&ProviderSettings::default()).await?;
//! let policies = provider.resource("backstop_backup_policy");
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod data_sources;
pub mod error;
pub mod policy;
pub mod provider;
pub mod resource;
pub mod restore;
pub mod translator;

pub use account::{AccountResource, AccountRole};
pub use error::{ProviderError, Result};
pub use policy::BackupPolicyResource;
pub use provider::{PROVIDER_NAME, Provider};
pub use resource::{DataSource, Resource, ResourceOutcome};
pub use restore::{POLL_INTERVAL, RestoreJobResource};
