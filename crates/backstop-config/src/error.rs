use std::path::PathBuf;

use thiserror::Error;

/// A provider setting that could not be resolved from any source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingSetting {
    pub field: &'static str,
    pub env_var: &'static str,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "Missing provider settings: {}. Set them in the provider block, \
         through the listed environment variables, or in {}",
        format_missing(.0),
        crate::SETTINGS_FILE_HINT
    )]
    MissingSettings(Vec<MissingSetting>),

    #[error("Settings file {path} named by {env_var} does not exist")]
    SettingsFileMissing {
        path: PathBuf,
        env_var: &'static str,
    },

    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

fn format_missing(missing: &[MissingSetting]) -> String {
    missing
        .iter()
        .map(|m| format!("{} ({})", m.field, m.env_var))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ConfigError>;
