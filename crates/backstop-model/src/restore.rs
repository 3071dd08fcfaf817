//! Restore jobs and snapshot records
//!
//! A restore target is selected from the restore type and the type of the
//! snapshotted resource, then built from exactly one config block of the
//! [`RestoreJobDocument`]. The builders here only validate and convert; the
//! provider submits the job and tracks it.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, in_range};
use crate::expression::ResourceType;
use crate::keyword::Keyword;

keyword_enum! {
    pub enum RestoreType {
        Full => "full",
        Partial => "partial",
    }
}

keyword_enum! {
    /// Lifecycle of a restore job as reported by the service
    pub enum JobStatus {
        Unspecified => "JOB_UNSPECIFIED",
        Pending => "JOB_PENDING",
        Running => "JOB_RUNNING",
        Completed => "JOB_COMPLETED",
        Failed => "JOB_FAILED",
        Partial => "JOB_PARTIAL",
        Cancelled => "JOB_CANCELLED",
    }
}

impl JobStatus {
    /// Statuses after which the service will not change the job again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Partial | JobStatus::Cancelled
        )
    }

    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Map a remote status string; unknown values are treated as unspecified.
    pub fn from_remote(status: &str) -> Self {
        Self::from_keyword(status).unwrap_or(JobStatus::Unspecified)
    }
}

/// KMS key used for restored EBS volumes when none is given.
pub const DEFAULT_VOLUME_ENCRYPTION_KEY: &str = "alias/aws/ebs";

const GIB: i64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSettings {
    pub volume_type: String,
    pub size_bytes: i64,
    pub iops: Option<i32>,
    pub throughput: Option<i32>,
}

/// Restore of a single EBS volume out of an EC2 snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EbsTarget {
    pub provider_volume_id: String,
    pub availability_zone: String,
    pub settings: VolumeSettings,
    pub description: Option<String>,
    pub volume_encryption_key_id: String,
    pub environment_encryption_key_id: Option<String>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRestore {
    pub provider_volume_id: String,
    pub settings: VolumeSettings,
    pub description: Option<String>,
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2Target {
    pub region: String,
    pub instance_type: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub volumes: Vec<VolumeRestore>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdsTarget {
    pub db_instance_identifier: String,
    pub db_instance_class: String,
    pub engine: String,
    pub region: String,
    pub kms_key_id: String,
    pub subnet_group_name: Option<String>,
    pub vpc_security_group_ids: Vec<String>,
    pub allocated_storage: Option<i32>,
    pub storage_type: Option<String>,
    pub backup_retention_period: Option<i32>,
    pub multi_az: Option<bool>,
    pub publicly_accessible: Option<bool>,
    pub storage_encrypted: Option<bool>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3BucketTarget {
    pub bucket_name: String,
    pub key_prefix: Option<String>,
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreFile {
    pub path: String,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3FilesTarget {
    pub bucket: S3BucketTarget,
    pub files: Vec<RestoreFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    Ebs(EbsTarget),
    Ec2(Ec2Target),
    Rds(RdsTarget),
    S3Bucket(S3BucketTarget),
    S3Files(S3FilesTarget),
}

impl RestoreTarget {
    /// Pick and build the target for `restore_type` of a `source` resource.
    ///
    /// | source  | full               | partial         |
    /// |---------|--------------------|-----------------|
    /// | AWS_EC2 | `ec2_config`       | `ebs_config`    |
    /// | AWS_RDS | `rds_config`       | `rds_config`    |
    /// | AWS_S3  | `s3_bucket_config` | `s3_file_config`|
    pub fn select(
        restore_type: RestoreType,
        source: ResourceType,
        doc: &RestoreJobDocument,
    ) -> Result<Self> {
        match (source, restore_type) {
            (ResourceType::AwsEc2, RestoreType::Partial) => {
                let config = required_block(&doc.ebs_config, "ebs_config", source, restore_type)?;
                EbsTarget::build(config).map(RestoreTarget::Ebs)
            }
            (ResourceType::AwsEc2, RestoreType::Full) => {
                let config = required_block(&doc.ec2_config, "ec2_config", source, restore_type)?;
                Ec2Target::build(config).map(RestoreTarget::Ec2)
            }
            (ResourceType::AwsRds, _) => {
                let config = required_block(&doc.rds_config, "rds_config", source, restore_type)?;
                RdsTarget::build(config).map(RestoreTarget::Rds)
            }
            (ResourceType::AwsS3, RestoreType::Full) => {
                let config = required_block(
                    &doc.s3_bucket_config,
                    "s3_bucket_config",
                    source,
                    restore_type,
                )?;
                S3BucketTarget::build("s3_bucket_config", config).map(RestoreTarget::S3Bucket)
            }
            (ResourceType::AwsS3, RestoreType::Partial) => {
                let config =
                    required_block(&doc.s3_file_config, "s3_file_config", source, restore_type)?;
                S3FilesTarget::build(config).map(RestoreTarget::S3Files)
            }
            (other, _) => Err(ValidationError::UnsupportedValue {
                field: "resource type of the snapshot".to_string(),
                value: other.to_string(),
                supported: "AWS_EC2, AWS_RDS, AWS_S3".to_string(),
            }),
        }
    }
}

fn required_block<'a, T>(
    block: &'a Option<T>,
    field: &str,
    source: ResourceType,
    restore_type: RestoreType,
) -> Result<&'a T> {
    block
        .as_ref()
        .ok_or_else(|| {
            ValidationError::missing(field, format!("for {restore_type} restores of {source}"))
        })
}

fn required_text(value: &Option<String>, field: &str, block: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ValidationError::missing(field, format!("in {block}"))),
    }
}

fn optional_i32(value: Option<i64>, field: &str) -> Result<Option<i32>> {
    value.map(|v| in_range(field, v, 0i32, i32::MAX)).transpose()
}

impl EbsTarget {
    fn build(doc: &EbsConfigDocument) -> Result<Self> {
        let block = "ebs_config";
        let size_bytes = match doc.volume_size {
            Some(size) if size > 0 => size,
            Some(size) => {
                return Err(ValidationError::OutOfRange {
                    field: format!("{block}.volume_size"),
                    value: size,
                    min: 1,
                    max: i64::MAX,
                });
            }
            None => return Err(ValidationError::missing("volume_size", format!("in {block}"))),
        };
        Ok(Self {
            provider_volume_id: required_text(
                &doc.provider_volume_id,
                "provider_volume_id",
                block,
            )?,
            availability_zone: required_text(&doc.availability_zone, "availability_zone", block)?,
            settings: VolumeSettings {
                volume_type: required_text(&doc.volume_type, "volume_type", block)?,
                size_bytes,
                iops: optional_i32(doc.iops, "ebs_config.iops")?,
                throughput: optional_i32(doc.throughput, "ebs_config.throughput")?,
            },
            description: doc.description.clone(),
            volume_encryption_key_id: doc
                .volume_encryption_key_id
                .clone()
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_VOLUME_ENCRYPTION_KEY.to_string()),
            environment_encryption_key_id: doc.environment_encryption_key_id.clone(),
            tags: doc.tags.clone().unwrap_or_default(),
        })
    }
}

impl Ec2Target {
    fn build(doc: &Ec2ConfigDocument) -> Result<Self> {
        let block = "ec2_config";
        let params = doc.volume_restore_params.as_deref().unwrap_or_default();
        if params.is_empty() {
            return Err(ValidationError::EmptyList {
                path: block.to_string(),
                field: "volume_restore_params".to_string(),
            });
        }
        let volumes = params
            .iter()
            .enumerate()
            .map(|(i, p)| VolumeRestore::build(p, &format!("{block}.volume_restore_params[{i}]")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            region: required_text(&doc.region, "region", block)?,
            instance_type: required_text(&doc.instance_type, "instance_type", block)?,
            subnet_id: required_text(&doc.subnet_id, "subnet_id", block)?,
            security_group_ids: doc.security_group_ids.clone().unwrap_or_default(),
            tags: doc.tags.clone().unwrap_or_default(),
            volumes,
        })
    }
}

impl VolumeRestore {
    fn build(doc: &VolumeRestoreDocument, path: &str) -> Result<Self> {
        let size_gib = in_range(
            &format!("{path}.volume_size"),
            doc.volume_size,
            1i64,
            i64::MAX / GIB,
        )?;
        Ok(Self {
            provider_volume_id: required_text(&doc.provider_volume_id, "provider_volume_id", path)?,
            settings: VolumeSettings {
                volume_type: required_text(&doc.volume_type, "volume_type", path)?,
                size_bytes: size_gib * GIB,
                iops: optional_i32(doc.iops, &format!("{path}.iops"))?,
                throughput: optional_i32(doc.throughput, &format!("{path}.throughput"))?,
            },
            description: doc.description.clone(),
            kms_key_id: doc.kms_key_id.clone(),
        })
    }
}

impl RdsTarget {
    fn build(doc: &RdsConfigDocument) -> Result<Self> {
        let block = "rds_config";
        Ok(Self {
            db_instance_identifier: required_text(
                &doc.db_instance_identifier,
                "db_instance_identifier",
                block,
            )?,
            db_instance_class: required_text(&doc.db_instance_class, "db_instance_class", block)?,
            engine: required_text(&doc.engine, "engine", block)?,
            region: required_text(&doc.region, "region", block)?,
            kms_key_id: required_text(&doc.kms_key_id, "kms_key_id", block)?,
            subnet_group_name: doc.subnet_group_name.clone(),
            vpc_security_group_ids: doc.vpc_security_group_ids.clone().unwrap_or_default(),
            allocated_storage: optional_i32(doc.allocated_storage, "rds_config.allocated_storage")?,
            storage_type: doc.storage_type.clone(),
            backup_retention_period: optional_i32(
                doc.backup_retention_period,
                "rds_config.backup_retention_period",
            )?,
            multi_az: doc.multi_az,
            publicly_accessible: doc.publicly_accessible,
            storage_encrypted: doc.storage_encrypted,
            tags: doc.tags.clone().unwrap_or_default(),
        })
    }
}

impl S3BucketTarget {
    fn build(block: &str, doc: &S3BucketConfigDocument) -> Result<Self> {
        Ok(Self {
            bucket_name: required_text(&doc.bucket_name, "bucket_name", block)?,
            key_prefix: doc.key_prefix.clone(),
            kms_key_id: doc.kms_key_id.clone(),
        })
    }
}

impl S3FilesTarget {
    fn build(doc: &S3FileConfigDocument) -> Result<Self> {
        let block = "s3_file_config";
        let bucket = S3BucketTarget::build(
            block,
            &S3BucketConfigDocument {
                bucket_name: doc.bucket_name.clone(),
                key_prefix: doc.key_prefix.clone(),
                kms_key_id: doc.kms_key_id.clone(),
            },
        )?;
        let files = doc.files.as_deref().unwrap_or_default();
        if files.is_empty() {
            return Err(ValidationError::EmptyList {
                path: block.to_string(),
                field: "files".to_string(),
            });
        }
        Ok(Self {
            bucket,
            files: files
                .iter()
                .map(|f| RestoreFile {
                    path: f.path.clone(),
                    is_directory: f.is_directory,
                })
                .collect(),
        })
    }
}

// ============ Document shape ============

fn default_timeout_minutes() -> i64 {
    60
}

fn default_wait_for_completion() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RestoreJobDocument {
    /// Same as `job_id`; assigned at submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `full` or `partial`.
    pub restore_type: String,
    pub snapshot_id: String,
    /// Taken from the snapshot when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Inventory type of the snapshotted resource, e.g. `AWS_EC2`. Looked up
    /// when omitted; declaring it lets the target be validated offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub restore_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebs_config: Option<EbsConfigDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ec2_config: Option<Ec2ConfigDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds_config: Option<RdsConfigDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_bucket_config: Option<S3BucketConfigDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_file_config: Option<S3FileConfigDocument>,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: i64,
    #[serde(default = "default_wait_for_completion")]
    pub wait_for_completion: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
}

impl RestoreJobDocument {
    /// Fields whose change requires submitting a new job.
    pub const IDENTIFYING_FIELDS: [&'static str; 10] = [
        "restore_type",
        "snapshot_id",
        "resource_id",
        "resource_type",
        "restore_account_id",
        "ebs_config",
        "ec2_config",
        "rds_config",
        "s3_bucket_config",
        "s3_file_config",
    ];

    pub fn restore_type(&self) -> Result<RestoreType> {
        RestoreType::parse_field("restore_type", &self.restore_type)
    }

    /// Overall wait budget, validated to be positive.
    pub fn timeout_minutes(&self) -> Result<u32> {
        in_range("timeout_minutes", self.timeout_minutes, 1u32, u32::MAX)
    }

    /// The declared source resource type, if any.
    pub fn declared_resource_type(&self) -> Result<Option<ResourceType>> {
        self.resource_type
            .as_deref()
            .map(|t| ResourceType::parse_field("resource_type", t))
            .transpose()
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.as_deref().map(JobStatus::from_remote)
    }

    pub fn identity_changes(&self, other: &RestoreJobDocument) -> Vec<&'static str> {
        let changed = [
            self.restore_type != other.restore_type,
            self.snapshot_id != other.snapshot_id,
            other.resource_id.is_some() && self.resource_id != other.resource_id,
            other.resource_type.is_some() && self.resource_type != other.resource_type,
            self.restore_account_id != other.restore_account_id,
            self.ebs_config != other.ebs_config,
            self.ec2_config != other.ec2_config,
            self.rds_config != other.rds_config,
            self.s3_bucket_config != other.s3_bucket_config,
            self.s3_file_config != other.s3_file_config,
        ];
        Self::IDENTIFYING_FIELDS
            .into_iter()
            .zip(changed)
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EbsConfigDocument {
    pub provider_volume_id: Option<String>,
    pub availability_zone: Option<String>,
    pub volume_type: Option<String>,
    /// Size of the restored volume in bytes.
    pub volume_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Defaults to `alias/aws/ebs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_encryption_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_encryption_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Ec2ConfigDocument {
    pub region: Option<String>,
    pub instance_type: Option<String>,
    pub subnet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_group_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    pub volume_restore_params: Option<Vec<VolumeRestoreDocument>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VolumeRestoreDocument {
    pub provider_volume_id: Option<String>,
    pub volume_type: Option<String>,
    /// Size in GiB.
    pub volume_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throughput: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RdsConfigDocument {
    pub db_instance_identifier: Option<String>,
    pub db_instance_class: Option<String>,
    pub engine: Option<String>,
    pub region: Option<String>,
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_security_group_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_storage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_retention_period: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_az: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicly_accessible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_encrypted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct S3BucketConfigDocument {
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct S3FileConfigDocument {
    pub bucket_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    pub files: Option<Vec<RestoreFileDocument>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RestoreFileDocument {
    pub path: String,
    #[serde(default)]
    pub is_directory: bool,
}

/// A point-in-time copy of one inventory resource, as exposed to users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapshotDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub resource_id: String,
    pub vault_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_in_time: Option<String>,
}
