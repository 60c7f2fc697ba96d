// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! The registration decision.
//!
//! [`Registrar::register`] turns one registration attempt into either a set
//! of credentials or exactly one [`AppError`]. The checks run in a fixed
//! order and each relies on the previous one having passed:
//!
//! 1. The verb must be `POST`
//! 2. The body must decode strictly into a [`RegisterWorkerRequest`]
//! 3. The provider id must be known, which selects the proof schema
//! 4. The proof must decode strictly under that schema
//! 5. The proof must verify (and, when enabled, must not be a replay)
//! 6. Credentials are issued for the pool and group
//!
//! Nothing is issued unless every check passes. The registrar holds no
//! per-request state, so one instance serves concurrent requests.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use validator::Validate;
use worker_protocol::models::{Credentials, RegisterWorkerRequest, RegisterWorkerResponse};

use crate::configuration::ManagerOptions;
use crate::constants::MAX_REPLAY_WINDOW;
use crate::errors::AppError;
use crate::issuer::{CredentialIssuer, CredentialScope, IssuedCredentials, TemporaryCredentialIssuer};
use crate::providers::ProviderRegistry;
use crate::replay::ReplayGuard;
use crate::verification::{ProofVerifier, StaticProofVerifier};

pub struct Registrar {
    providers: ProviderRegistry,
    verifier: Arc<dyn ProofVerifier>,
    issuer: Arc<dyn CredentialIssuer>,
    replay_guard: Option<ReplayGuard>,
}

impl Registrar {
    pub fn new(
        providers: ProviderRegistry,
        verifier: Arc<dyn ProofVerifier>,
        issuer: Arc<dyn CredentialIssuer>,
    ) -> Self {
        Self {
            providers,
            verifier,
            issuer,
            replay_guard: None,
        }
    }

    pub fn with_replay_guard(mut self, guard: ReplayGuard) -> Self {
        self.replay_guard = Some(guard);
        self
    }

    /// Builds the production registrar: providers and expected identities
    /// from the options, temporary credentials signed by the issuer client.
    pub fn from_options(options: &ManagerOptions) -> Result<Self, AppError> {
        let providers: ProviderRegistry = options.providers.iter().cloned().collect();
        if providers.is_empty() {
            return Err(AppError::ConfigError(
                "at least one provider binding is required".to_string(),
            ));
        }

        let verifier: StaticProofVerifier = options.expected_identities.iter().collect();

        let issuer_client_id = options.issuer_client_id.as_deref().ok_or_else(|| {
            AppError::ConfigError("issuer client id is required".to_string())
        })?;
        let issuer_access_token = options.issuer_access_token.as_ref().ok_or_else(|| {
            AppError::ConfigError("issuer access token is required".to_string())
        })?;
        let issuer = TemporaryCredentialIssuer::new(
            issuer_client_id,
            issuer_access_token.expose(),
            Duration::from_secs(options.credential_ttl_secs),
        )?;

        let registrar = Self::new(providers, Arc::new(verifier), Arc::new(issuer));
        if options.reject_replayed_proofs {
            let window = Duration::from_secs(options.replay_window_secs);
            if window.is_zero() || window > MAX_REPLAY_WINDOW {
                return Err(AppError::ConfigError(format!(
                    "replay window must be between 1s and {}s",
                    MAX_REPLAY_WINDOW.as_secs()
                )));
            }
            return Ok(registrar.with_replay_guard(ReplayGuard::new(window)));
        }
        Ok(registrar)
    }

    #[tracing::instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn register(
        &self,
        method: &Method,
        body: &[u8],
    ) -> Result<RegisterWorkerResponse, AppError> {
        // 1. Only POST registers; anything else is rejected before the body is read
        if method != Method::POST {
            tracing::warn!("[manager] rejecting {} registration attempt", method);
            return Err(AppError::MethodNotAllowed(method.clone()));
        }

        // 2. Strictly decode the envelope
        let request: RegisterWorkerRequest = serde_json::from_slice(body).map_err(|e| {
            tracing::warn!("[manager] malformed registration request: {}", e);
            AppError::MalformedRequest(e.to_string())
        })?;
        request.validate().map_err(|e| {
            tracing::warn!("[manager] registration request failed validation: {}", e);
            AppError::MalformedRequest(e.to_string())
        })?;

        tracing::debug!(
            "[manager] registration for {} from provider {} in group {}",
            request.worker_pool_id,
            request.provider_id,
            request.worker_group
        );

        // 3. The provider id selects the proof schema
        let provider_type = self.providers.lookup(&request.provider_id).ok_or_else(|| {
            tracing::warn!("[manager] unknown provider {}", request.provider_id);
            AppError::UnknownProvider(request.provider_id.clone())
        })?;

        // 4. Strictly decode the proof under that schema
        let proof = provider_type
            .decode_proof(&request.worker_identity_proof)
            .map_err(|e| {
                tracing::warn!("[manager] malformed identity proof: {}", e);
                AppError::MalformedProof(e.to_string())
            })?;

        // 5. Verify the proof, then make sure it has not been spent already
        let fingerprint = proof.fingerprint();
        self.verifier
            .verify(&request.provider_id, &proof)
            .await
            .map_err(|failure| {
                tracing::warn!(
                    "[manager] identity mismatch for provider {}: {}",
                    request.provider_id,
                    failure
                );
                AppError::IdentityMismatch(format!(
                    "identity mismatch for provider \"{}\": {}",
                    request.provider_id, failure
                ))
            })?;

        if let Some(guard) = &self.replay_guard {
            if !guard.check_and_record(fingerprint.clone()).await {
                tracing::warn!("[manager] replayed identity proof {}", fingerprint);
                return Err(AppError::ReplayedProof(fingerprint));
            }
        }

        // 6. Issue credentials scoped to the pool and group
        let scope = CredentialScope {
            worker_pool_id: request.worker_pool_id.clone(),
            worker_group: request.worker_group.clone(),
            worker_id: request.worker_id.clone(),
        };
        let IssuedCredentials {
            credentials,
            expires,
        } = match self.issuer.issue(&scope).await {
            Ok(issued) if issued.credentials.is_complete() => issued,
            failed => {
                if failed.is_ok() {
                    tracing::error!("[manager] issuer returned incomplete credentials");
                }
                // nothing was issued, so the proof is not spent
                if let Some(guard) = &self.replay_guard {
                    guard.forget(&fingerprint).await;
                }
                return Err(failed.err().unwrap_or(AppError::InternalServerError));
            }
        };

        audit(&request, &credentials, &fingerprint.to_string());

        Ok(RegisterWorkerResponse {
            credentials,
            expires,
        })
    }
}

fn audit(request: &RegisterWorkerRequest, credentials: &Credentials, proof: &str) {
    tracing::info!(
        worker_pool_id = %request.worker_pool_id,
        provider_id = %request.provider_id,
        worker_group = %request.worker_group,
        worker_id = request.worker_id.as_deref().unwrap_or(""),
        client_id = %credentials.client_id,
        proof = proof,
        "[manager] issued worker credentials"
    );
}
