// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Worker Manager
//!
//! The server side of the worker registration protocol.
//!
//! A freshly booted worker presents an identity proof obtained from its cloud
//! provider's metadata service. The manager decides whether the proof is
//! acceptable for the provider the worker claims, and if so answers with
//! temporary credentials scoped to the worker's pool and group.
//!
//! ```text
//! Worker -> POST /api/worker-manager/v1/worker/register -> Manager
//!                                                           |
//!                                                           +-> provider registry (proof schema)
//!                                                           +-> proof verifier
//!                                                           +-> credential issuer
//! ```
//!
//! ## Modules
//!
//! - [`application`]: HTTP server setup with Axum, body limits, and timeouts
//! - [`configuration`]: CLI argument parsing with clap
//! - [`constants`]: Limits and defaults
//! - [`errors`]: Application error types with HTTP response mapping
//! - [`issuer`]: Temporary credential issuance
//! - [`providers`]: Provider id to proof schema bindings
//! - [`registration`]: The ordered registration checks
//! - [`replay`]: Optional single-use enforcement for proofs
//! - [`routes`]: HTTP route handlers (health, register)
//! - [`verification`]: Identity proof verification
//!
//! ## Usage
//!
//! ```bash
//! worker-manager --port 8080 \
//!     --provider test-provider=google \
//!     --expected-identity test-provider=<token> \
//!     --issuer-client-id static/worker-manager \
//!     --issuer-access-token <token>
//! ```
//!
//! ## Security Considerations
//!
//! - Proofs and credentials are zeroized on drop and redacted from `Debug`
//! - Verification failures only ever report SHA-256 fingerprints
//! - Unknown fields in the envelope or the proof fail the request
//! - A signed document's signature is only accepted together with that document
//! - Request bodies are limited to 1 MB and requests time out after 30 seconds

pub mod application;
pub mod configuration;
pub mod constants;
pub mod errors;
pub mod issuer;
pub mod providers;
pub mod registration;
pub mod replay;
pub mod routes;
pub mod verification;
