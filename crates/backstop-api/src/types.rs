//! Wire types of the backup service REST API
//!
//! Field names follow the service's camelCase JSON. Enumerated values stay
//! plain strings here; the provider maps them onto typed values.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============ Authentication ============

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub access_token: String,
    /// Seconds.
    pub expires_in: i64,
}

// ============ Accounts ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub provider_account_id: String,
    pub status: String,
    pub account_attributes: AccountAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAttributes {
    pub cloud_provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsAccountAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureAccountAttributes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp: Option<GcpAccountAttributes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAccountAttributes {
    pub role_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureAccountAttributes {
    pub tenant_id: String,
    pub subscription_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpAccountAttributes {
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAccountRequest {
    pub name: String,
    pub account_attributes: AccountAttributes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountList {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountEnvelope {
    pub account: Account,
}

// ============ Backup policies ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPolicy {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub resource_selector: ResourceSelector,
    pub backup_plan: BackupPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBackupPolicyRequest {
    pub name: String,
    pub enabled: bool,
    pub resource_selector: ResourceSelector,
    pub backup_plan: BackupPlan,
}

/// Same body as a create request; `id` only selects the policy to replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateBackupPolicyRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub body: CreateBackupPolicyRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    pub resource_selection_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_inclusion_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_exclusion_override: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
}

/// One expression node. Keys this client does not know land in
/// `unrecognized` so they can be reported instead of silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expression {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_region: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnets: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_keys: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_key_values: Option<Condition<TagKeyValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_classes: Option<Condition<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apps: Option<Condition<String>>,
    #[serde(flatten)]
    pub unrecognized: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCondition {
    pub operator: String,
    #[serde(default)]
    pub operands: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition<T> {
    pub operator: String,
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagKeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPlan {
    pub backup_policy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_plan: Option<StandardPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitr_plan: Option<StandardPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_frequency_plan: Option<HighFrequencyPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardPlan {
    #[serde(default)]
    pub backup_schedules: Vec<BackupSchedule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighFrequencyPlan {
    #[serde(default)]
    pub resource_types: Vec<String>,
    #[serde(default)]
    pub backup_schedules: Vec<BackupSchedule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSchedule {
    pub vault_id: String,
    pub retention_days: i32,
    pub schedule_config: ScheduleConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_config: Option<DailyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_config: Option<WeeklyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_config: Option<MonthlyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annually_config: Option<AnnuallyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_config: Option<IntervalConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfDay {
    pub hour: i32,
    pub minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyConfig {
    pub time_of_day: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyConfig {
    pub days_of_week: Vec<String>,
    pub time_of_day: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyConfig {
    pub days_of_month: Vec<i32>,
    pub time_of_day: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnuallyConfig {
    pub time_of_year: TimeOfYear,
    pub time_of_day: TimeOfDay,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_window_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOfYear {
    pub month: i32,
    pub day_of_month: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackupPolicyList {
    #[serde(default)]
    pub backup_policies: Vec<BackupPolicy>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackupPolicyEnvelope {
    pub backup_policy: BackupPolicy,
}

// ============ Inventory and snapshots ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub resource_id: String,
    pub vault_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResource {
    pub id: String,
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotEnvelope {
    pub snapshot: Snapshot,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResourceEnvelope {
    pub resource: InventoryResource,
}

// ============ Restore ============

/// Body of one of the five restore endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RestoreRequest {
    Volume(RestoreVolumeRequest),
    Instance(RestoreInstanceRequest),
    Database(RestoreDatabaseRequest),
    Bucket(RestoreBucketRequest),
    Files(RestoreFilesRequest),
}

impl RestoreRequest {
    /// Last path segment of the endpoint this request is sent to.
    pub fn action(&self) -> &'static str {
        match self {
            RestoreRequest::Volume(_) => "restore-volume",
            RestoreRequest::Instance(_) => "restore-instance",
            RestoreRequest::Database(_) => "restore-database",
            RestoreRequest::Bucket(_) => "restore-bucket",
            RestoreRequest::Files(_) => "restore-files",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSettings {
    #[serde(rename = "type")]
    pub volume_type: String,
    pub size_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreVolumeRequest {
    pub provider_volume_id: String,
    pub restore_account_id: String,
    pub destination: VolumeDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDestination {
    pub aws_ebs: EbsDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbsDestination {
    pub availability_zone: String,
    pub volume_settings: VolumeSettings,
    pub volume_encryption_key_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_encryption_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreInstanceRequest {
    pub restore_account_id: String,
    pub destination: InstanceDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDestination {
    pub aws_ec2: Ec2Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ec2Destination {
    pub region: String,
    pub instance_type: String,
    pub subnet_id: String,
    #[serde(default)]
    pub security_group_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    pub volume_restore_parameters: Vec<InstanceVolume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceVolume {
    pub provider_volume_id: String,
    pub volume_settings: VolumeSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_encryption_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreDatabaseRequest {
    pub restore_account_id: String,
    pub destination: DatabaseDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDestination {
    pub aws_rds: RdsDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RdsDestination {
    pub restore_region: String,
    pub restored_name: String,
    pub instance_class: String,
    pub engine: String,
    pub encryption_key_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_group: Option<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_storage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_period: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicly_accessible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_encrypted: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreBucketRequest {
    pub restore_account_id: String,
    pub destination: BucketDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreFilesRequest {
    pub restore_account_id: String,
    pub files: Vec<FilePath>,
    pub destination: BucketDestination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePath {
    pub path: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDestination {
    pub s3_bucket: S3Destination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Destination {
    pub bucket_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartRestoreResponse {
    pub job_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreJob {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RestoreJobEnvelope {
    pub job: RestoreJob,
}
