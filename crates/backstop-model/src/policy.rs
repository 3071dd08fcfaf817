//! Backup policy model
//!
//! Typed policy values plus the declarative document users write. Turning a
//! document into a [`BackupPolicy`] and mapping either onto the remote wire
//! shape is done by the provider's translator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::expression::{Expression, ExpressionDocument};
use crate::schedule::{PlanType, Schedule, ScheduleDocument};

keyword_enum! {
    pub enum SelectionMode {
        All => "ALL",
        None => "NONE",
        Conditional => "CONDITIONAL",
    }
}

keyword_enum! {
    /// Resource types a high-frequency plan may target
    pub enum HighFrequencyResourceType {
        AwsS3 => "AWS_S3",
        AwsDynamoDb => "AWS_DYNAMO_DB",
    }
}

/// Which inventory resources a policy applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    None,
    Conditional(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSelector {
    pub selection: Selection,
    /// Resource ids always included, regardless of `selection`.
    pub inclusion_override: Option<Vec<String>>,
    /// Resource ids always excluded, regardless of `selection`.
    pub exclusion_override: Option<Vec<String>>,
}

impl ResourceSelector {
    pub fn mode(&self) -> SelectionMode {
        match self.selection {
            Selection::All => SelectionMode::All,
            Selection::None => SelectionMode::None,
            Selection::Conditional(_) => SelectionMode::Conditional,
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match &self.selection {
            Selection::Conditional(expression) => Some(expression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSchedule {
    pub vault_id: String,
    pub retention_days: i32,
    pub schedule: Schedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupPlan {
    Standard {
        schedules: Vec<BackupSchedule>,
    },
    PointInTime {
        schedules: Vec<BackupSchedule>,
    },
    HighFrequency {
        resource_types: Vec<HighFrequencyResourceType>,
        schedules: Vec<BackupSchedule>,
    },
}

impl BackupPlan {
    pub fn plan_type(&self) -> PlanType {
        match self {
            BackupPlan::Standard { .. } => PlanType::Standard,
            BackupPlan::PointInTime { .. } => PlanType::PointInTime,
            BackupPlan::HighFrequency { .. } => PlanType::HighFrequency,
        }
    }

    pub fn schedules(&self) -> &[BackupSchedule] {
        match self {
            BackupPlan::Standard { schedules }
            | BackupPlan::PointInTime { schedules }
            | BackupPlan::HighFrequency { schedules, .. } => schedules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPolicy {
    pub id: Option<String>,
    pub name: String,
    pub enabled: bool,
    pub selector: ResourceSelector,
    pub plan: BackupPlan,
}

// ============ Document shape ============

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BackupPolicyDocument {
    /// Assigned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub resource_selector: ResourceSelectorDocument,
    pub backup_plan: BackupPlanDocument,
    /// RFC 3339 timestamp, computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 timestamp, computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ResourceSelectorDocument {
    /// One of ALL, NONE or CONDITIONAL.
    pub resource_selection_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_inclusion_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_exclusion_override: Option<Vec<String>>,
    /// Required when the mode is CONDITIONAL, forbidden otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BackupPlanDocument {
    /// One of STANDARD, PITR or HIGH_FREQUENCY; selects which plan block is read.
    pub backup_policy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_plan: Option<PlanDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitr_plan: Option<PlanDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_frequency_plan: Option<HighFrequencyPlanDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PlanDocument {
    #[serde(default)]
    pub backup_schedules: Vec<BackupScheduleDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HighFrequencyPlanDocument {
    #[serde(default)]
    pub resource_types: Vec<String>,
    #[serde(default)]
    pub backup_schedules: Vec<BackupScheduleDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BackupScheduleDocument {
    pub vault_id: String,
    pub retention_days: i64,
    pub schedule_config: ScheduleDocument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_defaults_to_true() {
        let doc: BackupPolicyDocument = serde_json::from_value(serde_json::json!({
            "name": "nightly",
            "resource_selector": { "resource_selection_mode": "ALL" },
            "backup_plan": { "backup_policy_type": "STANDARD" }
        }))
        .unwrap();
        assert!(doc.enabled);
        assert_eq!(doc.backup_plan.standard_plan, None);
    }

    #[test]
    fn test_unknown_plan_fields_are_rejected() {
        let result = serde_json::from_value::<BackupPolicyDocument>(serde_json::json!({
            "name": "nightly",
            "resource_selector": { "resource_selection_mode": "ALL" },
            "backup_plan": { "backup_policy_type": "STANDARD", "hourly_plan": {} }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_selector_mode_follows_selection() {
        let selector = ResourceSelector {
            selection: Selection::None,
            inclusion_override: Some(vec!["r-1".into()]),
            exclusion_override: None,
        };
        assert_eq!(selector.mode(), SelectionMode::None);
        assert_eq!(selector.expression(), None);
    }
}
