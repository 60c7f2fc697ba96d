// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::time::Duration;

pub const DEFAULT_CREDENTIAL_TTL: Duration = Duration::from_secs(24 * 60 * 60); // 1 day
/// Temporary credentials may not be valid for longer than 31 days.
pub const MAX_CREDENTIAL_TTL: Duration = Duration::from_secs(31 * 24 * 60 * 60);
/// Credentials become valid this long before issuance to tolerate clock skew.
pub const CLOCK_SKEW_ALLOWANCE: Duration = Duration::from_secs(15 * 60);
pub const CREDENTIAL_SEED_BYTES: usize = 32;

/// Identity tokens are valid for one hour, so a replayed proof is only
/// interesting within that window.
pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(60 * 60);
pub const MAX_REPLAY_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60); // 1 week

pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024; // 1 MB
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
