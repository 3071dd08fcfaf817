//! Restore targets -> wire restore requests

use backstop_api as api;
use backstop_model::restore::{
    EbsTarget, Ec2Target, RdsTarget, S3BucketTarget, S3FilesTarget, VolumeSettings,
};
use backstop_model::RestoreTarget;

pub(crate) fn to_request(target: &RestoreTarget, restore_account_id: &str) -> api::RestoreRequest {
    let restore_account_id = restore_account_id.to_string();
    match target {
        RestoreTarget::Ebs(ebs) => {
            api::RestoreRequest::Volume(volume_request(ebs, restore_account_id))
        }
        RestoreTarget::Ec2(ec2) => api::RestoreRequest::Instance(api::RestoreInstanceRequest {
            restore_account_id,
            destination: api::InstanceDestination {
                aws_ec2: ec2_destination(ec2),
            },
        }),
        RestoreTarget::Rds(rds) => api::RestoreRequest::Database(api::RestoreDatabaseRequest {
            restore_account_id,
            destination: api::DatabaseDestination {
                aws_rds: rds_destination(rds),
            },
        }),
        RestoreTarget::S3Bucket(bucket) => api::RestoreRequest::Bucket(api::RestoreBucketRequest {
            restore_account_id,
            destination: bucket_destination(bucket),
        }),
        RestoreTarget::S3Files(files) => {
            api::RestoreRequest::Files(files_request(files, restore_account_id))
        }
    }
}

fn settings(settings: &VolumeSettings) -> api::VolumeSettings {
    api::VolumeSettings {
        volume_type: settings.volume_type.clone(),
        size_bytes: settings.size_bytes,
        iops: settings.iops,
        throughput: settings.throughput,
    }
}

fn volume_request(ebs: &EbsTarget, restore_account_id: String) -> api::RestoreVolumeRequest {
    api::RestoreVolumeRequest {
        provider_volume_id: ebs.provider_volume_id.clone(),
        restore_account_id,
        destination: api::VolumeDestination {
            aws_ebs: api::EbsDestination {
                availability_zone: ebs.availability_zone.clone(),
                volume_settings: settings(&ebs.settings),
                volume_encryption_key_id: ebs.volume_encryption_key_id.clone(),
                environment_encryption_key_id: ebs.environment_encryption_key_id.clone(),
                description: ebs.description.clone(),
                tags: ebs.tags.clone(),
            },
        },
    }
}

fn ec2_destination(ec2: &Ec2Target) -> api::Ec2Destination {
    api::Ec2Destination {
        region: ec2.region.clone(),
        instance_type: ec2.instance_type.clone(),
        subnet_id: ec2.subnet_id.clone(),
        security_group_ids: ec2.security_group_ids.clone(),
        tags: ec2.tags.clone(),
        volume_restore_parameters: ec2
            .volumes
            .iter()
            .map(|v| api::InstanceVolume {
                provider_volume_id: v.provider_volume_id.clone(),
                volume_settings: settings(&v.settings),
                volume_encryption_key_id: v.kms_key_id.clone(),
                description: v.description.clone(),
            })
            .collect(),
    }
}

fn rds_destination(rds: &RdsTarget) -> api::RdsDestination {
    api::RdsDestination {
        restore_region: rds.region.clone(),
        restored_name: rds.db_instance_identifier.clone(),
        instance_class: rds.db_instance_class.clone(),
        engine: rds.engine.clone(),
        encryption_key_id: rds.kms_key_id.clone(),
        subnet_group: rds.subnet_group_name.clone(),
        security_groups: rds.vpc_security_group_ids.clone(),
        allocated_storage: rds.allocated_storage,
        storage_type: rds.storage_type.clone(),
        backup_retention_period: rds.backup_retention_period,
        multi_az: rds.multi_az,
        publicly_accessible: rds.publicly_accessible,
        storage_encrypted: rds.storage_encrypted,
        tags: rds.tags.clone(),
    }
}

fn bucket_destination(bucket: &S3BucketTarget) -> api::BucketDestination {
    api::BucketDestination {
        s3_bucket: api::S3Destination {
            bucket_name: bucket.bucket_name.clone(),
            prefix: bucket.key_prefix.clone(),
            encryption_key_id: bucket.kms_key_id.clone(),
        },
    }
}

fn files_request(files: &S3FilesTarget, restore_account_id: String) -> api::RestoreFilesRequest {
    api::RestoreFilesRequest {
        restore_account_id,
        files: files
            .files
            .iter()
            .map(|f| api::FilePath {
                path: f.path.clone(),
                is_directory: f.is_directory,
            })
            .collect(),
        destination: bucket_destination(&files.bucket),
    }
}
