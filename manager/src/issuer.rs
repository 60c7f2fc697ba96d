// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Credential issuance for successfully registered workers.
//!
//! Issued credentials are temporary: the manager keeps no record of them and
//! cannot revoke them, so their expiry is the only thing bounding their use.
//!
//! [`TemporaryCredentialIssuer`] derives credentials from the manager's own
//! client. The certificate binds the scopes and validity window with an
//! HMAC-SHA256 keyed by the issuer's access token, and the access token is
//! the same HMAC over a fresh random seed:
//!
//! ```text
//! signature   = base64(HMAC(issuerToken, "version:1\nclientId:..\nissuer:..\nseed:..\nstart:..\nexpiry:..\nscopes:\n<scope>.."))
//! accessToken = base64url(HMAC(issuerToken, seed))
//! ```

use std::time::Duration;

use async_trait::async_trait;
use aws_lc_rs::{hmac, rand};
use chrono::{DateTime, TimeDelta, Utc};
use data_encoding::{BASE64, BASE64URL_NOPAD};
use serde::Serialize;
use worker_protocol::models::{Credentials, WorkerPoolId};

use crate::constants::{CLOCK_SKEW_ALLOWANCE, CREDENTIAL_SEED_BYTES, MAX_CREDENTIAL_TTL};
use crate::errors::AppError;

/// What a set of credentials is being issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    pub worker_pool_id: WorkerPoolId,
    pub worker_group: String,
    pub worker_id: Option<String>,
}

impl CredentialScope {
    pub fn client_id(&self) -> String {
        match &self.worker_id {
            Some(worker_id) => format!(
                "worker/{}/{}/{}",
                self.worker_pool_id, self.worker_group, worker_id
            ),
            None => format!("worker/{}/{}", self.worker_pool_id, self.worker_group),
        }
    }

    pub fn scopes(&self) -> Vec<String> {
        let worker = format!(
            "{}/{}",
            self.worker_group,
            self.worker_id.as_deref().unwrap_or("*")
        );
        vec![
            format!("assume:worker-pool:{}", self.worker_pool_id),
            format!("queue:claim-work:{}", self.worker_pool_id),
            format!("assume:worker-id:{worker}"),
            format!("queue:worker-id:{worker}"),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct IssuedCredentials {
    pub credentials: Credentials,
    pub expires: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    async fn issue(&self, scope: &CredentialScope) -> Result<IssuedCredentials, AppError>;
}

/// Hands out the same credentials to every worker.
pub struct StaticCredentialIssuer {
    credentials: Credentials,
}

impl StaticCredentialIssuer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialIssuer for StaticCredentialIssuer {
    async fn issue(&self, _scope: &CredentialScope) -> Result<IssuedCredentials, AppError> {
        Ok(IssuedCredentials {
            credentials: self.credentials.clone(),
            expires: None,
        })
    }
}

#[derive(Serialize)]
struct Certificate<'a> {
    version: u8,
    scopes: &'a [String],
    start: i64,
    expiry: i64,
    seed: &'a str,
    signature: String,
    issuer: &'a str,
}

pub struct TemporaryCredentialIssuer {
    issuer_client_id: String,
    key: hmac::Key,
    ttl: Duration,
}

impl TemporaryCredentialIssuer {
    pub fn new(
        issuer_client_id: impl Into<String>,
        issuer_access_token: &str,
        ttl: Duration,
    ) -> Result<Self, AppError> {
        let issuer_client_id = issuer_client_id.into();
        if issuer_client_id.is_empty() || issuer_access_token.is_empty() {
            return Err(AppError::ConfigError(
                "issuer client id and access token are required".to_string(),
            ));
        }
        if issuer_client_id.contains('\n') {
            return Err(AppError::ConfigError(
                "issuer client id must be a single line".to_string(),
            ));
        }
        if ttl.is_zero() || ttl > MAX_CREDENTIAL_TTL {
            return Err(AppError::ConfigError(format!(
                "credential ttl must be between 1s and {}s",
                MAX_CREDENTIAL_TTL.as_secs()
            )));
        }

        Ok(Self {
            issuer_client_id,
            key: hmac::Key::new(hmac::HMAC_SHA256, issuer_access_token.as_bytes()),
            ttl,
        })
    }

    fn mint(
        &self,
        scope: &CredentialScope,
        now: DateTime<Utc>,
        seed: &str,
    ) -> Result<IssuedCredentials, AppError> {
        let skew = TimeDelta::from_std(CLOCK_SKEW_ALLOWANCE).map_err(|_| AppError::InternalServerError)?;
        let ttl = TimeDelta::from_std(self.ttl).map_err(|_| AppError::InternalServerError)?;
        let start = now - skew;
        let expiry = now + ttl;

        let client_id = scope.client_id();
        let scopes = scope.scopes();

        // The signature covers newline-joined lines; a line break inside a
        // value would let the holder re-split it into extra scopes.
        if client_id.contains('\n') || scopes.iter().any(|s| s.contains('\n')) {
            tracing::error!("[manager] refusing to sign multi-line scope for {:?}", client_id);
            return Err(AppError::InternalServerError);
        }

        let mut lines = vec![
            "version:1".to_string(),
            format!("clientId:{client_id}"),
            format!("issuer:{}", self.issuer_client_id),
            format!("seed:{seed}"),
            format!("start:{}", start.timestamp_millis()),
            format!("expiry:{}", expiry.timestamp_millis()),
            "scopes:".to_string(),
        ];
        lines.extend(scopes.iter().cloned());

        let signature = hmac::sign(&self.key, lines.join("\n").as_bytes());
        let access_token = hmac::sign(&self.key, seed.as_bytes());

        let certificate = serde_json::to_string(&Certificate {
            version: 1,
            scopes: &scopes,
            start: start.timestamp_millis(),
            expiry: expiry.timestamp_millis(),
            seed,
            signature: BASE64.encode(signature.as_ref()),
            issuer: &self.issuer_client_id,
        })?;

        Ok(IssuedCredentials {
            credentials: Credentials {
                access_token: BASE64URL_NOPAD.encode(access_token.as_ref()),
                certificate,
                client_id,
            },
            expires: Some(expiry),
        })
    }
}

#[async_trait]
impl CredentialIssuer for TemporaryCredentialIssuer {
    #[tracing::instrument(skip(self))]
    async fn issue(&self, scope: &CredentialScope) -> Result<IssuedCredentials, AppError> {
        let mut seed = [0u8; CREDENTIAL_SEED_BYTES];
        rand::fill(&mut seed)?;
        self.mint(scope, Utc::now(), &BASE64URL_NOPAD.encode(&seed))
    }
}
