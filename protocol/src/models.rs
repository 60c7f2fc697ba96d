// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use zeroize::ZeroizeOnDrop;

use crate::constants::MAX_IDENTIFIER_LENGTH;
use crate::errors::ProtocolError;
use crate::proofs::WorkerIdentityProof;

/// Identifies a worker pool as `<provisionerId>/<workerType>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerPoolId(String);

impl WorkerPoolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn provisioner_id(&self) -> &str {
        self.0.split_once('/').map(|(p, _)| p).unwrap_or_default()
    }

    pub fn worker_type(&self) -> &str {
        self.0.split_once('/').map(|(_, w)| w).unwrap_or_default()
    }
}

impl FromStr for WorkerPoolId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProtocolError::InvalidWorkerPoolId(s.to_string());
        let (provisioner_id, worker_type) = s.split_once('/').ok_or_else(invalid)?;
        if !is_identifier(provisioner_id) || !is_identifier(worker_type) {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for WorkerPoolId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkerPoolId> for String {
    fn from(id: WorkerPoolId) -> Self {
        id.0
    }
}

impl fmt::Display for WorkerPoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Names a provider configured in the worker manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The body of `POST /api/worker-manager/v1/worker/register`.
///
/// Decoding is strict: an unknown top-level field fails the whole request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterWorkerRequest {
    pub worker_pool_id: WorkerPoolId,

    pub provider_id: ProviderId,

    #[validate(length(min = 1, max = 38))]
    #[validate(custom(function = "validate_identifier"))]
    pub worker_group: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 38))]
    #[validate(custom(function = "validate_identifier"))]
    pub worker_id: Option<String>,

    pub worker_identity_proof: WorkerIdentityProof,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub access_token: String,
    pub certificate: String,
    pub client_id: String,
}

impl Credentials {
    /// Issuance is all-or-nothing; a credential set with an empty part is unusable.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.certificate.is_empty() && !self.client_id.is_empty()
    }
}

// Custom Debug implementation to prevent accidental logging of sensitive data
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("certificate", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterWorkerResponse {
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Body of every non-success response from the worker manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LENGTH
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Identifiers are limited to `[a-zA-Z0-9_-]`.
fn validate_identifier(value: &str) -> Result<(), validator::ValidationError> {
    if !is_identifier(value) {
        return Err(validator::ValidationError::new("invalid_identifier"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn request_json() -> serde_json::Value {
        serde_json::json!({
            "workerPoolId": "test-provisioner/workerTypeX",
            "providerId": "test-provider",
            "workerGroup": "workers",
            "workerIdentityProof": {"token": "sekrit-token"}
        })
    }

    // RawValue only deserializes from text, never from a `serde_json::Value`.
    fn decode(json: &serde_json::Value) -> serde_json::Result<RegisterWorkerRequest> {
        serde_json::from_str(&json.to_string())
    }

    #[test]
    fn test_worker_pool_id_splits() {
        let id: WorkerPoolId = "test-provisioner/workerTypeX".parse().unwrap();
        assert_eq!(id.provisioner_id(), "test-provisioner");
        assert_eq!(id.worker_type(), "workerTypeX");
        assert_eq!(id.to_string(), "test-provisioner/workerTypeX");
    }

    #[test]
    fn test_worker_pool_id_rejects_bad_shapes() {
        for bad in [
            "",
            "no-slash",
            "/workerType",
            "provisioner/",
            "a/b/c",
            "prov isioner/type",
            "provisioner/this-worker-type-name-is-far-too-long-to-be-valid",
        ] {
            assert!(bad.parse::<WorkerPoolId>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_request_decodes() {
        let request: RegisterWorkerRequest = decode(&request_json()).unwrap();
        assert_eq!(request.worker_pool_id.as_str(), "test-provisioner/workerTypeX");
        assert_eq!(request.provider_id.as_str(), "test-provider");
        assert_eq!(request.worker_group, "workers");
        assert!(request.worker_id.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_unknown_field() {
        let mut json = request_json();
        json["rootUrl"] = serde_json::json!("http://localhost");
        let err = decode(&json).unwrap_err();
        assert!(err.to_string().contains("unknown field `rootUrl`"), "{err}");
    }

    #[test]
    fn test_request_rejects_missing_proof() {
        let mut json = request_json();
        json.as_object_mut().unwrap().remove("workerIdentityProof");
        assert!(decode(&json).is_err());
    }

    #[test]
    fn test_request_rejects_invalid_pool_id() {
        let mut json = request_json();
        json["workerPoolId"] = serde_json::json!("workerTypeX");
        let err = decode(&json).unwrap_err();
        assert!(err.to_string().contains("invalid worker pool id"), "{err}");
    }

    #[test]
    fn test_request_validation_rejects_bad_worker_group() {
        let mut json = request_json();
        json["workerGroup"] = serde_json::json!("us west");
        let request = decode(&json).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_validation_rejects_worker_id_with_line_break() {
        for bad in ["a\n*", "i-0123 x", "worker/id"] {
            let mut json = request_json();
            json["workerId"] = serde_json::json!(bad);
            let request = decode(&json).unwrap();
            assert!(request.validate().is_err(), "{bad:?} should be rejected");
        }

        let mut json = request_json();
        json["workerId"] = serde_json::json!("i-0123456789abcdef0");
        assert!(decode(&json).unwrap().validate().is_ok());
    }

    #[test]
    fn test_request_serializes_camel_case_without_worker_id() {
        let request: RegisterWorkerRequest = decode(&request_json()).unwrap();
        let text = serde_json::to_string(&request).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, request_json());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = Credentials {
            access_token: "test-access-token".to_string(),
            certificate: "test-certificate".to_string(),
            client_id: "test-client-id".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("test-access-token"));
        assert!(!rendered.contains("test-certificate"));
        assert!(rendered.contains("test-client-id"));
        assert!(credentials.is_complete());
    }

    #[test]
    fn test_response_decodes_without_expiry() {
        let response: RegisterWorkerResponse = serde_json::from_value(serde_json::json!({
            "credentials": {
                "accessToken": "test-access-token",
                "certificate": "test-certificate",
                "clientId": "test-client-id"
            }
        }))
        .unwrap();
        assert_eq!(response.credentials.access_token, "test-access-token");
        assert!(response.expires.is_none());
    }
}
