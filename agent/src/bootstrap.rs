// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Worker start-up: from a bare instance to a set of credentials.
//!
//! # Flow
//!
//! 1. Read the launch configuration the manager attached to the instance
//! 2. Fetch a fresh identity token, with the root URL as audience
//! 3. Describe the instance (its id becomes the worker id)
//! 4. Wrap the token in the provider's proof schema
//! 5. POST the registration request to the manager
//!
//! Steps 1 to 3 are retried while the metadata service is unavailable. Every
//! wait gives way to the cancellation token.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use worker_protocol::models::{Credentials, ProviderId, RegisterWorkerRequest, WorkerPoolId};

use crate::errors::AgentError;
use crate::metadata::{InstanceDescription, MetadataProvider, WorkerLaunchConfig};
use crate::registration::RegistrationClient;
use crate::retry::{RetryPolicy, retry};

#[derive(Debug, Clone, Default)]
pub struct BootstrapOptions {
    /// Used instead of the launch configuration's root URL when set.
    pub root_url: Option<String>,
    pub retry: RetryPolicy,
}

/// A registered worker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub root_url: String,
    pub worker_pool_id: WorkerPoolId,
    pub provider_id: ProviderId,
    pub worker_group: String,
    pub worker_id: String,
    pub credentials: Credentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    pub launch_config: WorkerLaunchConfig,
    pub instance: InstanceDescription,
}

#[tracing::instrument(skip_all)]
pub async fn register_worker(
    provider: &dyn MetadataProvider,
    client: &RegistrationClient,
    options: &BootstrapOptions,
    cancel: &CancellationToken,
) -> Result<Registration, AgentError> {
    let policy = &options.retry;

    let launch_config = retry(policy, cancel, "fetching launch configuration", move || {
        provider.fetch_launch_config()
    })
    .await?;
    let root_url = options
        .root_url
        .clone()
        .unwrap_or_else(|| launch_config.root_url.clone());

    tracing::info!(
        "[worker] registering into {} via provider {} (deployment {})",
        launch_config.worker_pool_id,
        launch_config.provider_id,
        launch_config.deployment_id().unwrap_or("-")
    );

    let audience = root_url.as_str();
    let token = retry(policy, cancel, "fetching identity token", move || {
        provider.fetch_identity_token(audience)
    })
    .await?;

    let instance = retry(policy, cancel, "describing instance", move || {
        provider.describe_instance()
    })
    .await?;

    let request = RegisterWorkerRequest {
        worker_pool_id: launch_config.worker_pool_id.clone(),
        provider_id: launch_config.provider_id.clone(),
        worker_group: launch_config.worker_group.clone(),
        worker_id: Some(instance.instance_id.clone()),
        worker_identity_proof: provider.build_identity_proof(&token)?,
    };
    drop(token);

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AgentError::Cancelled),
        response = client.register(&root_url, &request) => response?,
    };

    tracing::info!(
        "[worker] registered as {} in {} (expires {:?})",
        response.credentials.client_id,
        instance.zone,
        response.expires
    );

    Ok(Registration {
        root_url,
        worker_pool_id: request.worker_pool_id,
        provider_id: request.provider_id,
        worker_group: request.worker_group,
        worker_id: instance.instance_id.clone(),
        credentials: response.credentials,
        expires: response.expires,
        launch_config,
        instance,
    })
}
