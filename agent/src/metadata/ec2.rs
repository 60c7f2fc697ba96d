// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use async_trait::async_trait;
use aws_config::imds::client::Client;
use aws_config::imds::client::error::ImdsError;
use worker_protocol::proofs::ProviderType;

use super::{
    IdentityToken, InstanceDescription, MetadataProvider, WorkerLaunchConfig, decode_attribute,
    resolve_base_url,
};
use crate::constants::{
    EC2_DEFAULT_BASE_URL, EC2_IDENTITY_DOCUMENT_PATH, EC2_IDENTITY_SIGNATURE_PATH,
    EC2_METADATA_ENDPOINT_ENV, EC2_USER_DATA_PATH, IMDS_TOKEN_TTL,
};
use crate::errors::{AgentError, MetadataError};

/// The EC2 instance metadata service, spoken to over IMDSv2.
pub struct Ec2Metadata {
    base_url: String,
    client: Client,
}

impl Ec2Metadata {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, AgentError> {
        let base_url = resolve_base_url(
            base_url,
            std::env::var(EC2_METADATA_ENDPOINT_ENV).ok(),
            |endpoint| endpoint,
            EC2_DEFAULT_BASE_URL,
        );

        // retries are owned by the caller so that they can be cancelled
        let client = Client::builder()
            .endpoint(base_url.as_str())
            .map_err(|e| AgentError::Config(e.to_string()))?
            .token_ttl(IMDS_TOKEN_TTL)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .max_attempts(1)
            .build();

        tracing::debug!("[worker] using EC2 instance metadata at {}", base_url);

        Ok(Self { base_url, client })
    }

    /// GETs `path`; `Ok(None)` means the attribute does not exist.
    async fn get(&self, path: &str) -> Result<Option<String>, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        match self.client.get(path).await {
            Ok(value) => Ok(Some(String::from(value))),
            Err(ImdsError::ErrorResponse(response)) => {
                let status = response.response().status().as_u16();
                match status {
                    404 => Ok(None),
                    500.. => Err(MetadataError::unavailable(&url, format!("status {status}"))),
                    _ => Err(MetadataError::malformed(&url, format!("status {status}"))),
                }
            }
            Err(e) => Err(MetadataError::unavailable(&url, e)),
        }
    }

    async fn get_required(&self, path: &str) -> Result<String, MetadataError> {
        let url = format!("{}{}", self.base_url, path);
        let body = self
            .get(path)
            .await?
            .ok_or_else(|| MetadataError::malformed(&url, "not found"))?;
        if body.trim().is_empty() {
            return Err(MetadataError::malformed(&url, "empty response"));
        }
        Ok(body)
    }
}

fn meta_data_path(path: &str) -> String {
    format!("/latest/meta-data/{}", path.trim_start_matches('/'))
}

#[async_trait]
impl MetadataProvider for Ec2Metadata {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Aws
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The identity document is not audience-bound; `audience` is ignored.
    #[tracing::instrument(skip(self))]
    async fn fetch_identity_token(&self, audience: &str) -> Result<IdentityToken, MetadataError> {
        let document = self.get_required(EC2_IDENTITY_DOCUMENT_PATH).await?;
        if serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&document).is_err() {
            return Err(MetadataError::malformed(
                &format!("{}{}", self.base_url, EC2_IDENTITY_DOCUMENT_PATH),
                "instance identity document is not a JSON object",
            ));
        }
        let signature = self.get_required(EC2_IDENTITY_SIGNATURE_PATH).await?;

        tracing::debug!(
            "[worker] fetched instance identity document ({} bytes)",
            document.len()
        );
        Ok(IdentityToken::SignedDocument {
            document,
            signature,
        })
    }

    async fn fetch_attribute(&self, path: &str) -> Result<String, MetadataError> {
        self.get_required(&meta_data_path(path)).await
    }

    async fn fetch_launch_config(&self) -> Result<WorkerLaunchConfig, MetadataError> {
        let text = self.get_required(EC2_USER_DATA_PATH).await?;
        decode_attribute(EC2_USER_DATA_PATH, &text)
    }

    async fn describe_instance(&self) -> Result<InstanceDescription, MetadataError> {
        Ok(InstanceDescription {
            instance_id: self.fetch_attribute("instance-id").await?,
            zone: self.fetch_attribute("placement/availability-zone").await?,
            machine_type: self.fetch_attribute("instance-type").await?,
            image: self.fetch_attribute("ami-id").await?,
            local_ip: self.fetch_attribute("local-ipv4").await?,
            public_ip: self
                .get(&meta_data_path("public-ipv4"))
                .await?
                .filter(|ip| !ip.is_empty()),
            hostname: self.fetch_attribute("local-hostname").await?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_data_path() {
        assert_eq!(meta_data_path("instance-id"), "/latest/meta-data/instance-id");
        assert_eq!(
            meta_data_path("/placement/availability-zone"),
            "/latest/meta-data/placement/availability-zone"
        );
    }

    #[tokio::test]
    async fn test_proof_carries_document_and_signature() {
        let metadata = Ec2Metadata::new(Some("http://127.0.0.1:1".to_string()), Duration::from_millis(100))
            .unwrap();
        assert_eq!(metadata.provider_type(), ProviderType::Aws);

        let proof = metadata
            .build_identity_proof(&IdentityToken::SignedDocument {
                document: "{}".to_string(),
                signature: "c2lnbmF0dXJl".to_string(),
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(proof.as_str()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"document": "{}", "signature": "c2lnbmF0dXJl"})
        );

        assert!(
            metadata
                .build_identity_proof(&IdentityToken::Bearer("sekrit-token".to_string()))
                .is_err()
        );
    }
}
