//! Shared fixtures for provider integration tests

#![allow(dead_code)]

use std::sync::Arc;

use backstop_api::{InventoryResource, MockApi, Snapshot};
use backstop_provider::ResourceOutcome;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;

pub fn mock() -> Arc<MockApi> {
    Arc::new(MockApi::new())
}

/// Seed a snapshot of `resource_id` and the inventory entry it belongs to.
pub fn seed_snapshot(api: &MockApi, snapshot_id: &str, resource_id: &str, resource_type: &str) {
    api.add_snapshot(Snapshot {
        id: snapshot_id.to_string(),
        project_id: Some("project-1".to_string()),
        resource_id: resource_id.to_string(),
        vault_id: "vault-1".to_string(),
        created_time: Some(Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap()),
        expiration_time: Some(Utc.with_ymd_and_hms(2024, 3, 31, 2, 0, 0).unwrap()),
        point_in_time: None,
    });
    api.add_resource(InventoryResource {
        id: resource_id.to_string(),
        resource_type: resource_type.to_string(),
        resource_name: None,
    });
}

/// Decode the state of an outcome, panicking if the resource is gone.
pub fn state<T: DeserializeOwned>(outcome: &ResourceOutcome) -> T {
    let value = outcome.state.clone().expect("outcome has no state");
    serde_json::from_value(value).expect("state does not decode")
}

pub fn nightly_policy() -> serde_json::Value {
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
