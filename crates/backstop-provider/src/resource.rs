//! Lifecycle traits the host drives
//!
//! Documents cross this boundary as `serde_json::Value` and are decoded
//! exactly once into the typed `*Document` structs of `backstop-model`.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use schemars::Schema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ProviderError, Result};

/// Result of a resource lifecycle call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceOutcome {
    /// New tracked state. `None` tells the host to forget the resource.
    pub state: Option<Value>,
    pub warnings: Vec<String>,
}

impl ResourceOutcome {
    pub fn present(state: Value) -> Self {
        Self {
            state: Some(state),
            warnings: Vec::new(),
        }
    }

    pub fn gone() -> Self {
        Self::default()
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn is_gone(&self) -> bool {
        self.state.is_none()
    }
}

/// A managed resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name as used in declarative configuration, e.g. `backstop_backup_policy`.
    fn type_name(&self) -> &'static str;

    /// JSON schema of the resource document.
    fn schema(&self) -> Schema;

    /// Attributes that cannot be changed in place.
    fn replace_on_change(&self) -> &'static [&'static str] {
        &[]
    }

    async fn create(&self, planned: Value) -> Result<ResourceOutcome>;

    async fn read(&self, prior: Value) -> Result<ResourceOutcome>;

    async fn update(&self, prior: Value, planned: Value) -> Result<ResourceOutcome>;

    async fn delete(&self, prior: Value) -> Result<()>;

    /// Build the full state of an existing remote entity.
    async fn import(&self, id: &str) -> Result<ResourceOutcome>;
}

/// A read-only data source.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self, config: Value) -> Result<Value>;
}

pub(crate) fn decode<T: DeserializeOwned>(resource: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|source| ProviderError::Document { resource, source })
}

pub(crate) fn encode<T: Serialize>(resource: &'static str, document: &T) -> Result<Value> {
    serde_json::to_value(document).map_err(|source| ProviderError::Document { resource, source })
}

pub(crate) fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rfc3339_uses_zulu() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        assert_eq!(rfc3339(time), "2024-03-01T02:00:00Z");
    }

    #[test]
    fn test_decode_reports_resource() {
        let err = decode::<backstop_model::AccountDocument>(
            "backstop_source_account",
            serde_json::json!({ "nope": 1 }),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Malformed backstop_source_account document"));
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(ResourceOutcome::gone().is_gone());
        let outcome = ResourceOutcome::present(Value::Null).with_warning("careful");
        assert_eq!(outcome.warnings, vec!["careful"]);
    }
}
