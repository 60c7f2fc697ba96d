// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Path of the registration endpoint, relative to the deployment root URL.
pub const REGISTER_WORKER_PATH: &str = "/api/worker-manager/v1/worker/register";

/// Maximum length of a single identifier (provisioner id, worker type, worker group, worker id).
pub const MAX_IDENTIFIER_LENGTH: usize = 38;

/// Number of hex characters of a digest shown when a fingerprint is displayed.
pub const FINGERPRINT_DISPLAY_CHARS: usize = 16;
