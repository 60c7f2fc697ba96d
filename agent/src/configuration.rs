// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::constants;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CloudProvider {
    Gcp,
    Aws,
}

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct AgentOptions {
    #[arg(long, value_enum, default_value = "gcp", env("WORKER_CLOUD_PROVIDER"))]
    pub provider: CloudProvider,
    /// Overrides the metadata service root (and the provider's environment variable)
    #[arg(long, env("WORKER_METADATA_BASE_URL"))]
    pub metadata_base_url: Option<String>,
    #[arg(long, default_value = "500", env("WORKER_METADATA_TIMEOUT_MS"))]
    pub metadata_timeout_ms: u64,
    #[arg(long, default_value = "5", env("WORKER_METADATA_MAX_ATTEMPTS"))]
    pub max_attempts: u32,
    /// Overrides the root URL from the launch configuration
    #[arg(long, env("WORKER_ROOT_URL"))]
    pub root_url: Option<String>,
    #[arg(long, default_value = "30", env("WORKER_REGISTER_TIMEOUT_SECS"))]
    pub register_timeout_secs: u64,
    /// Where to write the issued credentials (mode 0600)
    #[arg(long, env("WORKER_CREDENTIALS_FILE"))]
    pub credentials_file: Option<PathBuf>,
}

impl Default for AgentOptions {
    fn default() -> Self {
        AgentOptions {
            provider: CloudProvider::Gcp,
            metadata_base_url: None,
            metadata_timeout_ms: 500,
            max_attempts: constants::DEFAULT_MAX_ATTEMPTS,
            root_url: None,
            register_timeout_secs: constants::DEFAULT_REGISTER_TIMEOUT.as_secs(),
            credentials_file: None,
        }
    }
}

impl AgentOptions {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn register_timeout(&self) -> Duration {
        Duration::from_secs(self.register_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            ..RetryPolicy::default()
        }
    }
}
