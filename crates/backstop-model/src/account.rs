//! Source and restore account model

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::keyword::Keyword;

keyword_enum! {
    pub enum CloudProvider {
        Aws => "AWS",
        Azure => "AZURE",
        Gcp => "GCP",
    }
}

/// Provider-specific connection attributes of an account.
///
/// Only [`AccountAttributes::Aws`] can be connected. The other variants
/// describe accounts the service lists that were connected elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAttributes {
    Aws { role_arn: String },
    Azure { tenant_id: String, subscription_id: String },
    Gcp { project_id: String },
}

impl AccountAttributes {
    pub fn cloud_provider(&self) -> CloudProvider {
        match self {
            AccountAttributes::Aws { .. } => CloudProvider::Aws,
            AccountAttributes::Azure { .. } => CloudProvider::Azure,
            AccountAttributes::Gcp { .. } => CloudProvider::Gcp,
        }
    }

    /// Build the attributes for connecting a new account.
    pub fn for_connect(doc: &AccountDocument) -> Result<Self> {
        let provider = CloudProvider::from_keyword(&doc.cloud_provider)
            .ok_or_else(|| ValidationError::UnsupportedProvider(doc.cloud_provider.clone()))?;
        if provider != CloudProvider::Aws {
            return Err(ValidationError::UnsupportedProvider(doc.cloud_provider.clone()));
        }
        match doc.role.as_deref() {
            Some(role) if !role.trim().is_empty() => Ok(AccountAttributes::Aws {
                role_arn: role.to_string(),
            }),
            _ => Err(ValidationError::missing("role", "for AWS accounts")),
        }
    }
}

fn default_cloud_provider() -> String {
    CloudProvider::Aws.to_string()
}

/// Declarative shape shared by source and restore accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AccountDocument {
    /// Assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Account identifier at the cloud provider, e.g. the 12-digit AWS account id.
    pub provider_account_id: String,
    #[serde(default = "default_cloud_provider")]
    pub cloud_provider: String,
    /// IAM role the service assumes in the account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl AccountDocument {
    /// Fields whose change cannot be applied to a connected account in place.
    pub const IDENTIFYING_FIELDS: [&'static str; 3] =
        ["provider_account_id", "cloud_provider", "role"];

    /// Names of identifying fields that differ between `self` and `other`.
    pub fn identity_changes(&self, other: &AccountDocument) -> Vec<&'static str> {
        let pairs = [
            self.provider_account_id != other.provider_account_id,
            self.cloud_provider != other.cloud_provider,
            self.role != other.role,
        ];
        Self::IDENTIFYING_FIELDS
            .into_iter()
            .zip(pairs)
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}
