// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use worker_manager::application::Application;
use worker_manager::configuration::ManagerOptions;
use worker_manager::registration::Registrar;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("[manager] init");

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        // keep span context out of every line
        .with_current_span(false)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .init();

    // get configuration options from arguments and environment variables
    let options = ManagerOptions::parse();

    tracing::info!("[manager] {:?}", &options);

    let registrar = Registrar::from_options(&options).context("invalid manager configuration")?;
    if options.reject_replayed_proofs {
        tracing::info!(
            "[manager] rejecting replayed proofs within {}s",
            options.replay_window_secs
        );
    }

    let application = Application::build(&options, Arc::new(registrar))
        .await
        .context("failed to bind listener")?;
    tracing::info!(
        "[manager] listening at http://{}:{}",
        options.host,
        application.port()
    );

    application
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[manager] failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("[manager] shutting down");
        })
        .await
        .context("server error")
}
