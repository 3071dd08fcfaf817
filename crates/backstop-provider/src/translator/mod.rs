//! Policy translator
//!
//! Pure conversion between backup policy documents and the service's wire
//! requests. Every direction goes through the typed [`BackupPolicy`], so
//! documents coming back from the service are held to the same rules as the
//! ones users write.

mod expression;
mod schedule;

use backstop_api as api;
use backstop_model::policy::{
    BackupPlanDocument, BackupScheduleDocument, HighFrequencyPlanDocument, PlanDocument,
    ResourceSelectorDocument,
};
use backstop_model::{
    BackupPlan, BackupPolicy, BackupPolicyDocument, BackupSchedule, Expression,
    HighFrequencyResourceType, Keyword, PlanType, ResourceSelector, Result, Schedule, Selection,
    SelectionMode, ValidationError, in_range,
};

use crate::resource::rfc3339;

/// Validate a policy document into a typed policy.
pub fn parse_policy(doc: &BackupPolicyDocument) -> Result<BackupPolicy> {
    if doc.name.trim().is_empty() {
        return Err(ValidationError::missing("name", "for a backup policy"));
    }
    Ok(BackupPolicy {
        id: doc.id.clone(),
        name: doc.name.clone(),
        enabled: doc.enabled,
        selector: parse_selector(&doc.resource_selector)?,
        plan: parse_plan(&doc.backup_plan)?,
    })
}

pub fn to_create_request(doc: &BackupPolicyDocument) -> Result<api::CreateBackupPolicyRequest> {
    parse_policy(doc).map(|policy| request_body(&policy))
}

pub fn to_update_request(
    id: &str,
    doc: &BackupPolicyDocument,
) -> Result<api::UpdateBackupPolicyRequest> {
    Ok(api::UpdateBackupPolicyRequest {
        id: id.to_string(),
        body: to_create_request(doc)?,
    })
}

/// Canonical document of a remote policy, timestamps included.
pub fn from_remote(remote: &api::BackupPolicy) -> Result<BackupPolicyDocument> {
    let expression = remote
        .resource_selector
        .expression
        .as_ref()
        .map(|e| expression::from_wire(e, "resource_selector.expression"))
        .transpose()?;
    let raw = BackupPolicyDocument {
        id: Some(remote.id.clone()),
        name: remote.name.clone(),
        enabled: remote.enabled,
        resource_selector: ResourceSelectorDocument {
            resource_selection_mode: remote.resource_selector.resource_selection_mode.clone(),
            resource_inclusion_override: remote
                .resource_selector
                .resource_inclusion_override
                .clone(),
            resource_exclusion_override: remote
                .resource_selector
                .resource_exclusion_override
                .clone(),
            expression,
        },
        backup_plan: plan_from_wire(&remote.backup_plan),
        created_at: None,
        updated_at: None,
    };

    let mut doc = to_document(&parse_policy(&raw)?);
    doc.created_at = remote.created_time.map(rfc3339);
    doc.updated_at = remote.updated_time.map(rfc3339);
    Ok(doc)
}

/// Whether two documents would produce the same request.
///
/// Used to keep the user's spelling (e.g. `interval_minutes`) in state when
/// the service reports the canonical form of the same policy.
pub fn same_policy(a: &BackupPolicyDocument, b: &BackupPolicyDocument) -> bool {
    match (to_create_request(a), to_create_request(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Canonical document of a typed policy. Timestamps are left unset.
pub fn to_document(policy: &BackupPolicy) -> BackupPolicyDocument {
    let schedules = |schedules: &[BackupSchedule]| {
        schedules
            .iter()
            .map(|s| BackupScheduleDocument {
                vault_id: s.vault_id.clone(),
                retention_days: i64::from(s.retention_days),
                schedule_config: s.schedule.to_document(),
            })
            .collect()
    };

    let mut plan = BackupPlanDocument {
        backup_policy_type: policy.plan.plan_type().to_string(),
        ..Default::default()
    };
    match &policy.plan {
        BackupPlan::Standard { schedules: s } => {
            plan.standard_plan = Some(PlanDocument {
                backup_schedules: schedules(s),
            })
        }
        BackupPlan::PointInTime { schedules: s } => {
            plan.pitr_plan = Some(PlanDocument {
                backup_schedules: schedules(s),
            })
        }
        BackupPlan::HighFrequency {
            resource_types,
            schedules: s,
        } => {
            plan.high_frequency_plan = Some(HighFrequencyPlanDocument {
                resource_types: resource_types.iter().map(ToString::to_string).collect(),
                backup_schedules: schedules(s),
            })
        }
    }

    BackupPolicyDocument {
        id: policy.id.clone(),
        name: policy.name.clone(),
        enabled: policy.enabled,
        resource_selector: ResourceSelectorDocument {
            resource_selection_mode: policy.selector.mode().to_string(),
            resource_inclusion_override: policy.selector.inclusion_override.clone(),
            resource_exclusion_override: policy.selector.exclusion_override.clone(),
            expression: policy.selector.expression().map(Expression::to_document),
        },
        backup_plan: plan,
        created_at: None,
        updated_at: None,
    }
}

// ============ Document -> typed ============

fn parse_selector(doc: &ResourceSelectorDocument) -> Result<ResourceSelector> {
    let mode = SelectionMode::parse_field("resource_selection_mode", &doc.resource_selection_mode)?;
    let selection = match (mode, &doc.expression) {
        (SelectionMode::Conditional, Some(expression)) => {
            let expression = Expression::parse_at(expression, "resource_selector.expression")?;
            Selection::Conditional(expression)
        }
        (SelectionMode::Conditional, None) => {
            return Err(ValidationError::missing(
                "expression",
                "when resource_selection_mode is CONDITIONAL",
            ));
        }
        (_, Some(_)) => {
            return Err(ValidationError::unexpected(
                "expression",
                format!("when resource_selection_mode is {mode}"),
            ));
        }
        (SelectionMode::All, None) => Selection::All,
        (SelectionMode::None, None) => Selection::None,
    };
    Ok(ResourceSelector {
        selection,
        inclusion_override: doc.resource_inclusion_override.clone(),
        exclusion_override: doc.resource_exclusion_override.clone(),
    })
}

fn parse_plan(doc: &BackupPlanDocument) -> Result<BackupPlan> {
    let plan_type = PlanType::parse_field("backup_policy_type", &doc.backup_policy_type)?;
    let context = format!("when backup_policy_type is {plan_type}");

    let blocks = [
        ("standard_plan", doc.standard_plan.is_some(), PlanType::Standard),
        ("pitr_plan", doc.pitr_plan.is_some(), PlanType::PointInTime),
        ("high_frequency_plan", doc.high_frequency_plan.is_some(), PlanType::HighFrequency),
    ];
    if let Some((block, _, _)) = blocks
        .iter()
        .find(|(_, set, owner)| *set && *owner != plan_type)
    {
        return Err(ValidationError::unexpected(*block, context));
    }

    match plan_type {
        PlanType::Standard => {
            let plan = doc
                .standard_plan
                .as_ref()
                .ok_or_else(|| ValidationError::missing("standard_plan", &context))?;
            Ok(BackupPlan::Standard {
                schedules: parse_schedules("standard_plan", &plan.backup_schedules, plan_type)?,
            })
        }
        PlanType::PointInTime => {
            let plan = doc
                .pitr_plan
                .as_ref()
                .ok_or_else(|| ValidationError::missing("pitr_plan", &context))?;
            Ok(BackupPlan::PointInTime {
                schedules: parse_schedules("pitr_plan", &plan.backup_schedules, plan_type)?,
            })
        }
        PlanType::HighFrequency => {
            let plan = doc
                .high_frequency_plan
                .as_ref()
                .ok_or_else(|| ValidationError::missing("high_frequency_plan", &context))?;
            if plan.resource_types.is_empty() {
                return Err(ValidationError::EmptyList {
                    path: "backup_plan.high_frequency_plan".to_string(),
                    field: "resource_types".to_string(),
                });
            }
            let resource_types = plan
                .resource_types
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    HighFrequencyResourceType::parse_field(
                        &format!("high_frequency_plan.resource_types[{i}]"),
                        t,
                    )
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(BackupPlan::HighFrequency {
                resource_types,
                schedules: parse_schedules(
                    "high_frequency_plan",
                    &plan.backup_schedules,
                    plan_type,
                )?,
            })
        }
    }
}

fn parse_schedules(
    block: &str,
    docs: &[BackupScheduleDocument],
    plan_type: PlanType,
) -> Result<Vec<BackupSchedule>> {
    if docs.is_empty() {
        return Err(ValidationError::EmptyList {
            path: format!("backup_plan.{block}"),
            field: "backup_schedules".to_string(),
        });
    }
    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let path = format!("backup_plan.{block}.backup_schedules[{i}]");
            if doc.vault_id.trim().is_empty() {
                return Err(ValidationError::missing("vault_id", format!("in {path}")));
            }
            Ok(BackupSchedule {
                vault_id: doc.vault_id.clone(),
                retention_days: in_range(
                    &format!("{path}.retention_days"),
                    doc.retention_days,
                    1i32,
                    i32::MAX,
                )?,
                schedule: Schedule::parse(&doc.schedule_config, plan_type)?,
            })
        })
        .collect()
}

// ============ Typed -> wire ============

fn request_body(policy: &BackupPolicy) -> api::CreateBackupPolicyRequest {
    api::CreateBackupPolicyRequest {
        name: policy.name.clone(),
        enabled: policy.enabled,
        resource_selector: api::ResourceSelector {
            resource_selection_mode: policy.selector.mode().to_string(),
            resource_inclusion_override: policy.selector.inclusion_override.clone(),
            resource_exclusion_override: policy.selector.exclusion_override.clone(),
            expression: policy
                .selector
                .expression()
                .map(|e| expression::to_wire(&e.to_document())),
        },
        backup_plan: plan_to_wire(&policy.plan),
    }
}

fn plan_to_wire(plan: &BackupPlan) -> api::BackupPlan {
    let schedules = |schedules: &[BackupSchedule]| {
        schedules
            .iter()
            .map(|s| api::BackupSchedule {
                vault_id: s.vault_id.clone(),
                retention_days: s.retention_days,
                schedule_config: schedule::to_wire(&s.schedule),
            })
            .collect()
    };

    let mut wire = api::BackupPlan {
        backup_policy_type: plan.plan_type().to_string(),
        standard_plan: None,
        pitr_plan: None,
        high_frequency_plan: None,
    };
    match plan {
        BackupPlan::Standard { schedules: s } => {
            wire.standard_plan = Some(api::StandardPlan {
                backup_schedules: schedules(s),
            })
        }
        BackupPlan::PointInTime { schedules: s } => {
            wire.pitr_plan = Some(api::StandardPlan {
                backup_schedules: schedules(s),
            })
        }
        BackupPlan::HighFrequency {
            resource_types,
            schedules: s,
        } => {
            wire.high_frequency_plan = Some(api::HighFrequencyPlan {
                resource_types: resource_types.iter().map(ToString::to_string).collect(),
                backup_schedules: schedules(s),
            })
        }
    }
    wire
}

// ============ Wire -> document ============

fn plan_from_wire(wire: &api::BackupPlan) -> BackupPlanDocument {
    let schedules = |schedules: &[api::BackupSchedule]| {
        schedules
            .iter()
            .map(|s| BackupScheduleDocument {
                vault_id: s.vault_id.clone(),
                retention_days: i64::from(s.retention_days),
                schedule_config: schedule::from_wire(&s.schedule_config),
            })
            .collect()
    };
    BackupPlanDocument {
        backup_policy_type: wire.backup_policy_type.clone(),
        standard_plan: wire.standard_plan.as_ref().map(|p| PlanDocument {
            backup_schedules: schedules(&p.backup_schedules),
        }),
        pitr_plan: wire.pitr_plan.as_ref().map(|p| PlanDocument {
            backup_schedules: schedules(&p.backup_schedules),
        }),
        high_frequency_plan: wire.high_frequency_plan.as_ref().map(|p| HighFrequencyPlanDocument {
            resource_types: p.resource_types.clone(),
            backup_schedules: schedules(&p.backup_schedules),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: serde_json::Value) -> BackupPolicyDocument {
        serde_json::from_value(json).unwrap()
    }

    fn nightly() -> serde_json::Value {
        serde_json::json!({
            "name": "nightly",
            "resource_selector": { "resource_selection_mode": "ALL" },
            "backup_plan": {
                "backup_policy_type": "STANDARD",
                "standard_plan": {
                    "backup_schedules": [{
                        "vault_id": "v1",
                        "retention_days": 30,
                        "schedule_config": {
                            "frequency": "DAILY",
                            "time_of_day": { "hour": 2, "minute": 0 },
                            "start_window_minutes": 240
                        }
                    }]
                }
            }
        })
    }

    #[test]
    fn test_standard_daily_create_request() {
        let request = to_create_request(&document(nightly())).unwrap();
        assert_eq!(request.resource_selector.resource_selection_mode, "ALL");
        assert_eq!(request.backup_plan.backup_policy_type, "STANDARD");
        let schedules = &request.backup_plan.standard_plan.as_ref().unwrap().backup_schedules;
        assert_eq!(schedules.len(), 1);
        assert_eq!(schedules[0].vault_id, "v1");
        assert_eq!(schedules[0].retention_days, 30);
        let daily = schedules[0].schedule_config.daily_config.as_ref().unwrap();
        assert_eq!(daily.time_of_day, api::TimeOfDay { hour: 2, minutes: 0 });
        assert_eq!(daily.start_window_minutes, Some(240));
    }

    #[test]
    fn test_conditional_without_expression_fails() {
        let mut json = nightly();
        json["resource_selector"]["resource_selection_mode"] = "CONDITIONAL".into();
        let err = to_create_request(&document(json)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::missing("expression", "when resource_selection_mode is CONDITIONAL")
        );
    }

    #[test]
    fn test_expression_with_non_conditional_mode_fails() {
        let mut json = nightly();
        json["resource_selector"]["expression"] =
            serde_json::json!({ "environment": { "operator": "IN", "values": ["prod"] } });
        for mode in ["ALL", "NONE"] {
            json["resource_selector"]["resource_selection_mode"] = mode.into();
            let err = to_create_request(&document(json.clone())).unwrap_err();
            assert!(matches!(
                err,
                ValidationError::UnexpectedField { ref field, .. } if field == "expression"
            ));
        }
    }

    #[test]
    fn test_plan_block_must_match_type() {
        let mut json = nightly();
        json["backup_plan"]["backup_policy_type"] = "PITR".into();
        let err = to_create_request(&document(json.clone())).unwrap_err();
        assert_eq!(
            err,
            ValidationError::unexpected("standard_plan", "when backup_policy_type is PITR")
        );

        json["backup_plan"] = serde_json::json!({ "backup_policy_type": "STANDARD" });
        let err = to_create_request(&document(json)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::missing("standard_plan", "when backup_policy_type is STANDARD")
        );
    }

    #[test]
    fn test_high_frequency_resource_types() {
        let mut json = nightly();
        json["backup_plan"] = serde_json::json!({
            "backup_policy_type": "HIGH_FREQUENCY",
            "high_frequency_plan": {
                "resource_types": [],
                "backup_schedules": [{
                    "vault_id": "v1",
                    "retention_days": 7,
                    "schedule_config": { "frequency": "INTERVAL", "interval_minutes": 30 }
                }]
            }
        });
        let err = to_create_request(&document(json.clone())).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::EmptyList { ref field, .. } if field == "resource_types"
        ));

        json["backup_plan"]["high_frequency_plan"]["resource_types"] =
            serde_json::json!(["AWS_EC2"]);
        let err = to_create_request(&document(json.clone())).unwrap_err();
        assert!(err.to_string().contains("AWS_S3, AWS_DYNAMO_DB"));

        json["backup_plan"]["high_frequency_plan"]["resource_types"] =
            serde_json::json!(["AWS_S3"]);
        let request = to_create_request(&document(json)).unwrap();
        let plan = request.backup_plan.high_frequency_plan.unwrap();
        assert_eq!(plan.resource_types, vec!["AWS_S3"]);
        assert_eq!(
            plan.backup_schedules[0].schedule_config.interval_config.unwrap().interval_minutes,
            Some(30)
        );
    }

    #[test]
    fn test_retention_days_must_fit_wire_width() {
        let mut json = nightly();
        json["backup_plan"]["standard_plan"]["backup_schedules"][0]["retention_days"] =
            serde_json::json!(i64::from(i32::MAX) + 1);
        let err = to_create_request(&document(json.clone())).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        json["backup_plan"]["standard_plan"]["backup_schedules"][0]["retention_days"] = 0.into();
        assert!(to_create_request(&document(json)).is_err());
    }

    #[test]
    fn test_empty_schedules_and_blank_names_fail() {
        let mut json = nightly();
        json["backup_plan"]["standard_plan"]["backup_schedules"] = serde_json::json!([]);
        assert!(matches!(
            to_create_request(&document(json)).unwrap_err(),
            ValidationError::EmptyList { ref field, .. } if field == "backup_schedules"
        ));

        let mut json = nightly();
        json["name"] = " ".into();
        assert_eq!(
            to_create_request(&document(json)).unwrap_err(),
            ValidationError::missing("name", "for a backup policy")
        );
    }

    #[test]
    fn test_update_request_carries_id() {
        let request = to_update_request("policy-7", &document(nightly())).unwrap();
        assert_eq!(request.id, "policy-7");
        assert_eq!(request.body.name, "nightly");
    }

    #[test]
    fn test_from_remote_round_trips_conditional_policy() {
        let mut json = nightly();
        json["resource_selector"] = serde_json::json!({
            "resource_selection_mode": "CONDITIONAL",
            "resource_exclusion_override": ["i-123"],
            "expression": {
                "group": {
                    "operator": "AND",
                    "operands": [
                        { "resource_type": { "operator": "IN", "values": ["AWS_EC2", "AWS_RDS"] } },
                        { "data_classes": { "operator": "CONTAINS_NONE_OF", "values": ["PHI"] } }
                    ]
                }
            }
        });
        let doc = document(json);
        let request = to_create_request(&doc).unwrap();
        let remote = api::BackupPolicy {
            id: "policy-1".into(),
            name: request.name.clone(),
            enabled: request.enabled,
            resource_selector: request.resource_selector.clone(),
            backup_plan: request.backup_plan.clone(),
            created_time: None,
            updated_time: None,
        };

        let back = from_remote(&remote).unwrap();
        assert_eq!(back.id.as_deref(), Some("policy-1"));
        assert!(same_policy(&back, &doc));
        assert_eq!(to_create_request(&back).unwrap(), request);
    }

    #[test]
    fn test_same_policy_ignores_interval_spelling() {
        let mut minutes = nightly();
        minutes["backup_plan"]["standard_plan"]["backup_schedules"][0]["schedule_config"] =
            serde_json::json!({ "frequency": "INTERVAL", "interval_minutes": 300 });
        let mut hours = minutes.clone();
        hours["backup_plan"]["standard_plan"]["backup_schedules"][0]["schedule_config"] =
            serde_json::json!({ "frequency": "INTERVAL", "interval_hours": 6 });

        assert!(same_policy(&document(minutes.clone()), &document(hours)));
        let mut twelve = minutes.clone();
        twelve["backup_plan"]["standard_plan"]["backup_schedules"][0]["schedule_config"]
            ["interval_minutes"] = 600.into();
        assert!(!same_policy(&document(minutes), &document(twelve)));
    }
}
