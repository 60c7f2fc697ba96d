// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use worker_agent::bootstrap::{BootstrapOptions, Registration, register_worker};
use worker_agent::configuration::AgentOptions;
use worker_agent::metadata;
use worker_agent::registration::RegistrationClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("[worker] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    let options = AgentOptions::parse();

    tracing::info!("[worker] {:?}", &options);

    let provider = metadata::from_options(&options).context("invalid metadata configuration")?;
    let client = RegistrationClient::new(options.register_timeout())
        .context("failed to build registration client")?;
    let bootstrap = BootstrapOptions {
        root_url: options.root_url.clone(),
        retry: options.retry_policy(),
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("[worker] interrupted, cancelling registration");
            on_signal.cancel();
        }
    });

    let registration = register_worker(provider.as_ref(), &client, &bootstrap, &cancel)
        .await
        .context("worker registration failed")?;

    match &options.credentials_file {
        Some(path) => write_credentials(path, &registration).await?,
        None => tracing::warn!("[worker] no credentials file configured, credentials discarded"),
    }

    Ok(())
}

/// Writes the registration, credentials included, readable by the owner only.
async fn write_credentials(path: &Path, registration: &Registration) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(registration)?;

    let mut open = tokio::fs::OpenOptions::new();
    open.write(true).create(true).truncate(true);
    #[cfg(unix)]
    open.mode(0o600);

    let mut file = open
        .open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(&json).await?;
    file.flush().await?;

    tracing::info!(
        "[worker] wrote credentials for {} to {}",
        registration.credentials.client_id,
        path.display()
    );
    Ok(())
}
