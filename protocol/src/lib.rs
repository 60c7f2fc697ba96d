// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! # Worker Protocol
//!
//! Wire types shared by the worker manager (which validates registrations and
//! issues credentials) and the worker agent (which gathers identity evidence
//! from its instance metadata service and registers).
//!
//! ```text
//! Worker agent --POST RegisterWorkerRequest--> Worker manager
//!      ^                                            |
//!      +-------- RegisterWorkerResponse ------------+
//! ```
//!
//! ## Modules
//!
//! - [`constants`]: Endpoint paths and identifier limits
//! - [`errors`]: Decode and validation errors for protocol types
//! - [`fingerprint`]: Log-safe digests of secret material
//! - [`models`]: Registration request/response and credential types
//! - [`proofs`]: Provider variants and their strict identity proof schemas
//!
//! ## Strictness
//!
//! Both the request envelope and every proof schema reject unknown fields.
//! A proof is carried as raw JSON and decoded only after the provider id has
//! selected the schema that applies to it.

pub mod constants;
pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod proofs;
