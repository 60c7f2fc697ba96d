// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Access to the instance metadata service of the cloud the worker runs on.
//!
//! Every provider answers the same questions through [`MetadataProvider`]:
//! where its metadata service lives, what identity token it vouches for,
//! which launch configuration the worker manager attached to the instance,
//! and what the instance looks like. Only the transport and the paths differ.
//!
//! | Provider | Implementation | Identity token |
//! |----------|----------------|----------------|
//! | GCP | [`GcpMetadata`] | bearer token from the default service account |
//! | EC2 | [`Ec2Metadata`] | signed instance identity document (IMDSv2) |
//!
//! Identity tokens are fetched fresh on each call and never cached.

mod ec2;
mod gcp;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use worker_protocol::models::{ProviderId, WorkerPoolId};
use worker_protocol::proofs::{AwsProof, GoogleProof, IdentityProof, ProviderType, WorkerIdentityProof};
use zeroize::ZeroizeOnDrop;

pub use ec2::Ec2Metadata;
pub use gcp::GcpMetadata;

use crate::configuration::{AgentOptions, CloudProvider};
use crate::errors::{AgentError, MetadataError};

/// Evidence of identity as handed out by a metadata service.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub enum IdentityToken {
    Bearer(String),
    SignedDocument { document: String, signature: String },
}

impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer([REDACTED])"),
            Self::SignedDocument { document, .. } => f
                .debug_struct("SignedDocument")
                .field("document", &format_args!("[{} bytes]", document.len()))
                .field("signature", &"[REDACTED]")
                .finish(),
        }
    }
}

/// The JSON the worker manager attaches to an instance it launches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkerLaunchConfig {
    pub worker_pool_id: WorkerPoolId,
    pub provider_id: ProviderId,
    pub worker_group: String,
    #[serde(alias = "rootURL")]
    pub root_url: String,
    #[serde(default)]
    pub worker_config: serde_json::Map<String, serde_json::Value>,
}

impl WorkerLaunchConfig {
    /// `workerConfig.genericWorker.config.deploymentId`, when the deployment set one.
    pub fn deployment_id(&self) -> Option<&str> {
        self.worker_config
            .get("genericWorker")?
            .get("config")?
            .get("deploymentId")?
            .as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDescription {
    pub instance_id: String,
    pub zone: String,
    pub machine_type: String,
    pub image: String,
    pub local_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip: Option<String>,
    pub hostname: String,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Root that attribute paths are resolved against.
    fn base_url(&self) -> &str;

    async fn fetch_identity_token(&self, audience: &str) -> Result<IdentityToken, MetadataError>;

    /// Raw text of the attribute at `path`, relative to the provider's attribute root.
    async fn fetch_attribute(&self, path: &str) -> Result<String, MetadataError>;

    async fn fetch_launch_config(&self) -> Result<WorkerLaunchConfig, MetadataError>;

    async fn describe_instance(&self) -> Result<InstanceDescription, MetadataError>;

    /// Wraps `token` in exactly the proof schema of this provider.
    fn build_identity_proof(&self, token: &IdentityToken) -> Result<WorkerIdentityProof, MetadataError> {
        let proof = match (self.provider_type(), token) {
            (ProviderType::Google, IdentityToken::Bearer(token)) => IdentityProof::Google(GoogleProof {
                token: token.clone(),
            }),
            (ProviderType::Aws, IdentityToken::SignedDocument { document, signature }) => {
                IdentityProof::Aws(AwsProof {
                    document: document.clone(),
                    signature: signature.clone(),
                })
            }
            (provider_type, _) => {
                return Err(MetadataError::malformed(
                    self.base_url(),
                    format!("identity token does not belong to provider {provider_type}"),
                ));
            }
        };
        proof
            .encode()
            .map_err(|e| MetadataError::malformed(self.base_url(), e))
    }
}

/// Builds the provider selected by `options`.
pub fn from_options(options: &AgentOptions) -> Result<Box<dyn MetadataProvider>, AgentError> {
    let timeout = options.metadata_timeout();
    let base_url = options.metadata_base_url.clone();
    match options.provider {
        CloudProvider::Gcp => Ok(Box::new(GcpMetadata::new(base_url, timeout)?)),
        CloudProvider::Aws => Ok(Box::new(Ec2Metadata::new(base_url, timeout)?)),
    }
}

/// Picks the metadata root: explicit override, then the provider's
/// environment variable, then the provider default.
pub(crate) fn resolve_base_url(
    explicit: Option<String>,
    from_env: Option<String>,
    env_to_url: impl FnOnce(String) -> String,
    default: &str,
) -> String {
    let url = explicit
        .filter(|url| !url.trim().is_empty())
        .or_else(|| from_env.filter(|v| !v.trim().is_empty()).map(env_to_url))
        .unwrap_or_else(|| default.to_string());
    url.trim_end_matches('/').to_string()
}

/// Decodes a JSON attribute, keeping decode failures apart from transport failures.
pub(crate) fn decode_attribute<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, MetadataError> {
    serde_json::from_str(text).map_err(|source| MetadataError::AttributeDecode {
        path: path.to_string(),
        source,
    })
}

/// Reduces `projects/123/zones/us-west1-a` to `us-west1-a`.
pub(crate) fn last_segment(value: &str) -> String {
    value.rsplit('/').next().unwrap_or(value).to_string()
}
