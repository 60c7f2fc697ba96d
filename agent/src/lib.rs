// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Worker Agent
//!
//! The worker side of the registration protocol: runs on a freshly launched
//! cloud instance, gathers identity evidence from the instance metadata
//! service and trades it with the worker manager for temporary credentials.
//!
//! ```text
//! Metadata service -> Agent (this crate) -> POST register -> Worker manager
//! ```
//!
//! ## Modules
//!
//! - [`bootstrap`]: The start-up sequence, from launch config to credentials
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Metadata endpoints, timeouts and retry defaults
//! - [`errors`]: Metadata and agent error types
//! - [`metadata`]: GCP and EC2 metadata providers
//! - [`registration`]: HTTP client for the registration endpoint
//! - [`retry`]: Cancellable retry with exponential backoff
//!
//! ## Usage
//!
//! ```bash
//! worker-agent --provider gcp --credentials-file /etc/worker/credentials.json
//! ```

pub mod bootstrap;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod metadata;
pub mod registration;
pub mod retry;
