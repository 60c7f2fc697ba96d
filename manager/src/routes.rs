// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! HTTP route handlers for the worker manager API.
//!
//! | Method | Path | Handler | Description |
//! |--------|------|---------|-------------|
//! | GET | `/health` | [`health`] | Health check endpoint |
//! | any | `/api/worker-manager/v1/worker/register` | [`register_worker`] | Register a worker |
//!
//! The register route accepts every verb so that anything other than `POST`
//! is answered with the same JSON error body as the other rejections.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::IntoResponse;
use serde_json::json;
use worker_protocol::models::RegisterWorkerResponse;

use crate::application::AppState;
use crate::errors::AppError;

/// Health check endpoint.
///
/// # Response
///
/// ```json
/// {"status": "ok"}
/// ```
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Registers a worker in exchange for its identity proof.
///
/// The body is taken as raw bytes and decoded by the registrar, which owns
/// the strict decoding rules.
///
/// # Errors
///
/// - [`AppError::MethodNotAllowed`] - Verb other than `POST`
/// - [`AppError::MalformedRequest`] - Envelope failed to decode or validate
/// - [`AppError::UnknownProvider`] - Provider id is not configured
/// - [`AppError::MalformedProof`] - Proof does not fit the provider's schema
/// - [`AppError::IdentityMismatch`] - Proof did not verify
/// - [`AppError::ReplayedProof`] - Proof was already used
#[tracing::instrument(skip(state, body))]
pub async fn register_worker(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Json<RegisterWorkerResponse>, AppError> {
    let response = state.registrar.register(&method, &body).await?;
    Ok(Json(response))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use worker_protocol::models::Credentials;
    use worker_protocol::proofs::ProviderType;

    use crate::issuer::StaticCredentialIssuer;
    use crate::providers::ProviderRegistry;
    use crate::registration::Registrar;
    use crate::verification::StaticProofVerifier;

    fn state() -> Arc<AppState> {
        let registrar = Registrar::new(
            ProviderRegistry::new().with_provider("test-provider", ProviderType::Google),
            Arc::new(StaticProofVerifier::new().expect("test-provider", "sekrit-token")),
            Arc::new(StaticCredentialIssuer::new(Credentials {
                access_token: "test-access-token".to_string(),
                certificate: "test-certificate".to_string(),
                client_id: "test-client-id".to_string(),
            })),
        );
        Arc::new(AppState {
            registrar: Arc::new(registrar),
        })
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_register_worker_returns_credentials() {
        let body = json!({
            "workerPoolId": "test-provisioner/workerTypeX",
            "providerId": "test-provider",
            "workerGroup": "workers",
            "workerIdentityProof": {"token": "sekrit-token"}
        });
        let Json(response) = register_worker(
            State(state()),
            Method::POST,
            Bytes::from(body.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(response.credentials.client_id, "test-client-id");
    }

    #[tokio::test]
    async fn test_register_worker_rejects_get() {
        let result = register_worker(State(state()), Method::GET, Bytes::new()).await;
        assert_eq!(result.unwrap_err(), AppError::MethodNotAllowed(Method::GET));
    }
}
