// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::serve::Serve;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use worker_protocol::constants::REGISTER_WORKER_PATH;

use crate::configuration::ManagerOptions;
use crate::constants::{MAX_REQUEST_BODY_BYTES, REQUEST_TIMEOUT};
use crate::registration::Registrar;
use crate::routes;

pub struct AppState {
    pub registrar: Arc<Registrar>,
}

pub struct Application {
    port: u16,
    server: Serve<TcpListener, Router, Router>,
}

impl Application {
    pub async fn build(
        options: &ManagerOptions,
        registrar: Arc<Registrar>,
    ) -> Result<Self, std::io::Error> {
        let address = format!("{}:{}", options.host, options.port);
        let listener = TcpListener::bind(address).await?;
        let server = axum::serve(listener, create_router(registrar));
        let port = server.local_addr()?.port();

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until `shutdown` resolves, then lets in-flight requests finish.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.server.with_graceful_shutdown(shutdown).await
    }
}

/// Builds the router with the same middleware in tests as in production.
pub fn create_router(registrar: Arc<Registrar>) -> Router {
    let state = Arc::new(AppState { registrar });

    Router::new()
        .route("/health", get(routes::health))
        .route(REGISTER_WORKER_PATH, any(routes::register_worker))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
