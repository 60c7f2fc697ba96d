// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

use worker_protocol::constants::REGISTER_WORKER_PATH;
use worker_protocol::models::{ErrorResponse, RegisterWorkerRequest, RegisterWorkerResponse};

use crate::errors::AgentError;

/// Talks to the worker manager's registration endpoint.
///
/// Registration is never retried here: a rejection is final, and a transport
/// failure may already have consumed the identity proof.
pub struct RegistrationClient {
    http: reqwest::Client,
}

impl RegistrationClient {
    pub fn new(timeout: Duration) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    #[tracing::instrument(skip(self, request), fields(worker_pool_id = %request.worker_pool_id))]
    pub async fn register(
        &self,
        root_url: &str,
        request: &RegisterWorkerRequest,
    ) -> Result<RegisterWorkerResponse, AgentError> {
        let url = format!("{}{}", root_url.trim_end_matches('/'), REGISTER_WORKER_PATH);
        tracing::debug!("[worker] registering at {}", url);

        let response = self.http.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .map(|error| error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            tracing::warn!("[worker] registration rejected ({}): {}", status, message);
            return Err(AgentError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let response: RegisterWorkerResponse =
            serde_json::from_slice(&body).map_err(AgentError::InvalidResponse)?;
        if !response.credentials.is_complete() {
            return Err(AgentError::IncompleteCredentials);
        }
        Ok(response)
    }
}
