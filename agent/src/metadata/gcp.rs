// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use worker_protocol::proofs::ProviderType;

use super::{
    IdentityToken, InstanceDescription, MetadataProvider, WorkerLaunchConfig, decode_attribute,
    last_segment, resolve_base_url,
};
use crate::constants::{
    GCE_METADATA_HOST_ENV, GCP_DEFAULT_BASE_URL, GCP_IDENTITY_PATH, GCP_LAUNCH_CONFIG_ATTRIBUTE,
    METADATA_FLAVOR, METADATA_FLAVOR_VALUE,
};
use crate::errors::{AgentError, MetadataError};

/// The GCE metadata server.
pub struct GcpMetadata {
    base_url: String,
    client: reqwest::Client,
}

impl GcpMetadata {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, AgentError> {
        let base_url = resolve_base_url(
            base_url,
            std::env::var(GCE_METADATA_HOST_ENV).ok(),
            |host| format!("http://{host}/computeMetadata/v1"),
            GCP_DEFAULT_BASE_URL,
        );
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        tracing::debug!("[worker] using GCP metadata at {}", base_url);

        Ok(Self { base_url, client })
    }

    /// GETs `path`; `Ok(None)` means the attribute does not exist.
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Option<String>, MetadataError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let response = self
            .client
            .get(&url)
            .header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE)
            .query(query)
            .send()
            .await
            .map_err(|e| MetadataError::unavailable(&url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.is_server_error() {
            return Err(MetadataError::unavailable(&url, format!("status {status}")));
        }
        if !status.is_success() {
            return Err(MetadataError::malformed(&url, format!("status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::unavailable(&url, e))?;
        Ok(Some(body))
    }

    async fn get_required(&self, path: &str, query: &[(&str, &str)]) -> Result<String, MetadataError> {
        let url = format!("{}/{}", self.base_url, path);
        let body = self
            .get(path, query)
            .await?
            .ok_or_else(|| MetadataError::malformed(&url, "not found"))?;
        if body.is_empty() {
            return Err(MetadataError::malformed(&url, "empty response"));
        }
        Ok(body)
    }
}

#[async_trait]
impl MetadataProvider for GcpMetadata {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Google
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_identity_token(&self, audience: &str) -> Result<IdentityToken, MetadataError> {
        let token = self
            .get_required(GCP_IDENTITY_PATH, &[("audience", audience), ("format", "full")])
            .await?;
        if token.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MetadataError::malformed(
                &format!("{}/{}", self.base_url, GCP_IDENTITY_PATH),
                "identity token contains whitespace or control characters",
            ));
        }
        tracing::debug!("[worker] fetched identity token ({} bytes)", token.len());
        Ok(IdentityToken::Bearer(token))
    }

    async fn fetch_attribute(&self, path: &str) -> Result<String, MetadataError> {
        self.get_required(path, &[]).await
    }

    async fn fetch_launch_config(&self) -> Result<WorkerLaunchConfig, MetadataError> {
        let text = self.fetch_attribute(GCP_LAUNCH_CONFIG_ATTRIBUTE).await?;
        decode_attribute(GCP_LAUNCH_CONFIG_ATTRIBUTE, &text)
    }

    async fn describe_instance(&self) -> Result<InstanceDescription, MetadataError> {
        Ok(InstanceDescription {
            instance_id: self.fetch_attribute("instance/id").await?,
            zone: last_segment(&self.fetch_attribute("instance/zone").await?),
            machine_type: last_segment(&self.fetch_attribute("instance/machine-type").await?),
            image: self.fetch_attribute("instance/image").await?,
            local_ip: self.fetch_attribute("instance/network-interfaces/0/ip").await?,
            public_ip: self
                .get("instance/network-interfaces/0/access-configs/0/external-ip", &[])
                .await?
                .filter(|ip| !ip.is_empty()),
            hostname: self.fetch_attribute("instance/hostname").await?,
        })
    }
}
