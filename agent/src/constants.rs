// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const METADATA_FLAVOR: &str = "metadata-flavor";
pub const METADATA_FLAVOR_VALUE: &str = "Google";
/// Host or host:port of the GCE metadata server, as honored by Google's client libraries.
pub const GCE_METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";
pub const GCP_DEFAULT_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1";
pub const GCP_LAUNCH_CONFIG_ATTRIBUTE: &str = "instance/attributes/taskcluster";
pub const GCP_IDENTITY_PATH: &str = "instance/service-accounts/default/identity";

pub const EC2_METADATA_ENDPOINT_ENV: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";
pub const EC2_DEFAULT_BASE_URL: &str = "http://169.254.169.254";
pub const EC2_IDENTITY_DOCUMENT_PATH: &str = "/latest/dynamic/instance-identity/document";
pub const EC2_IDENTITY_SIGNATURE_PATH: &str = "/latest/dynamic/instance-identity/signature";
pub const EC2_USER_DATA_PATH: &str = "/latest/user-data";
pub const IMDS_TOKEN_TTL: Duration = Duration::from_secs(300); // 5 minutes

pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);
pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_REGISTER_TIMEOUT: Duration = Duration::from_secs(30);
