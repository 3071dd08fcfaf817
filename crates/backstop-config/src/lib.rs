//! Provider settings for backstop
//!
//! Each setting is resolved independently, first match wins:
//! 1. the value given explicitly in the provider block
//! 2. the `BACKSTOP_*` environment variable
//! 3. the settings file (`BACKSTOP_SETTINGS_PATH`, or
//!    `~/.config/backstop/provider.yaml`)
//!
//! Empty strings count as unset at every level.

pub mod error;

pub use error::*;

use std::fmt;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENDPOINT_ENV: &str = "BACKSTOP_ENDPOINT";
pub const CLIENT_ID_ENV: &str = "BACKSTOP_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "BACKSTOP_CLIENT_SECRET";
pub const PROJECT_ID_ENV: &str = "BACKSTOP_PROJECT_ID";
pub const SETTINGS_PATH_ENV: &str = "BACKSTOP_SETTINGS_PATH";

pub(crate) const SETTINGS_FILE_HINT: &str = "~/.config/backstop/provider.yaml";

/// Settings as written in the provider block or the settings file.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Base URL of the backup service API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Fully resolved settings. All fields are non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Without a trailing slash.
    pub endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub project_id: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl ProviderSettings {
    /// Resolve against the process environment and the settings file.
    pub fn resolve(&self) -> Result<ProviderConfig> {
        let file = match settings_file_path()? {
            Some(path) => load_settings_file(&path)?,
            None => ProviderSettings::default(),
        };
        self.resolve_with(|name| std::env::var(name).ok(), &file)
    }

    /// Resolve with an explicit environment lookup and file settings.
    pub fn resolve_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
        file: &ProviderSettings,
    ) -> Result<ProviderConfig> {
        let mut missing = Vec::new();
        let mut pick = |field: &'static str,
                        env_var: &'static str,
                        explicit: &Option<String>,
                        from_file: &Option<String>| {
            let value = non_empty(explicit.clone())
                .or_else(|| non_empty(env(env_var)))
                .or_else(|| non_empty(from_file.clone()));
            if value.is_none() {
                missing.push(MissingSetting { field, env_var });
            }
            value.unwrap_or_default()
        };

        let endpoint = pick("endpoint", ENDPOINT_ENV, &self.endpoint, &file.endpoint);
        let client_id = pick("client_id", CLIENT_ID_ENV, &self.client_id, &file.client_id);
        let client_secret = pick(
            "client_secret",
            CLIENT_SECRET_ENV,
            &self.client_secret,
            &file.client_secret,
        );
        let project_id = pick("project_id", PROJECT_ID_ENV, &self.project_id, &file.project_id);

        if !missing.is_empty() {
            return Err(ConfigError::MissingSettings(missing));
        }

        let config = ProviderConfig {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            project_id,
        };
        debug!(
            endpoint = %config.endpoint,
            project_id = %config.project_id,
            "Resolved provider settings"
        );
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Locate the settings file, if any.
///
/// A non-empty `BACKSTOP_SETTINGS_PATH` must name an existing file. Without
/// it the per-user config directory is checked.
pub fn settings_file_path() -> Result<Option<PathBuf>> {
    if let Some(path) = non_empty(std::env::var(SETTINGS_PATH_ENV).ok()) {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(ConfigError::SettingsFileMissing {
                path,
                env_var: SETTINGS_PATH_ENV,
            });
        }
        return Ok(Some(path));
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };
    let global = config_dir.join("backstop").join("provider.yaml");
    Ok(global.exists().then_some(global))
}

pub fn load_settings_file(path: &Path) -> Result<ProviderSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(ProviderSettings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
