// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Non-reversible identifiers for secret material.
//!
//! Tokens, signatures and access tokens never appear in logs or error
//! messages. Wherever one has to be referred to, its [`Fingerprint`] is used
//! instead: the SHA-256 digest of the secret, displayed truncated.

use std::fmt;

use aws_lc_rs::digest;
use data_encoding::HEXLOWER;

use crate::constants::FINGERPRINT_DISPLAY_CHARS;

/// SHA-256 digest of a secret value.
///
/// Equality and hashing use the full digest; [`Display`](fmt::Display) shows
/// `sha256:` followed by the first [`FINGERPRINT_DISPLAY_CHARS`] hex characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(secret: &[u8]) -> Self {
        let digest = digest::digest(&digest::SHA256, secret);
        Self(HEXLOWER.encode(digest.as_ref()))
    }

    pub fn of_str(secret: &str) -> Self {
        Self::of(secret.as_bytes())
    }

    /// Full lowercase hex digest.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.0.get(..FINGERPRINT_DISPLAY_CHARS).unwrap_or(&self.0);
        write!(f, "sha256:{short}")
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256() {
        let fingerprint = Fingerprint::of_str("sekrit-token");
        assert_eq!(
            fingerprint.as_hex(),
            "9abfd82ec33a5afff12746faa1c7a6c97a81bf557851feee3cf6e2bca5d3da89"
        );
        assert_eq!(fingerprint, Fingerprint::of(b"sekrit-token"));
    }

    #[test]
    fn test_fingerprint_display_is_truncated() {
        let fingerprint = Fingerprint::of_str("sekrit-token");
        let shown = fingerprint.to_string();
        assert_eq!(shown.len(), "sha256:".len() + FINGERPRINT_DISPLAY_CHARS);
        assert!(shown.starts_with("sha256:"));
        assert!(fingerprint.as_hex().starts_with(&shown["sha256:".len()..]));
    }

    #[test]
    fn test_fingerprint_never_contains_secret() {
        let fingerprint = Fingerprint::of_str("sekrit-token");
        assert!(!format!("{fingerprint} {fingerprint:?}").contains("sekrit"));
    }

    #[test]
    fn test_fingerprint_differs_per_secret() {
        assert_ne!(
            Fingerprint::of_str("sekrit-token"),
            Fingerprint::of_str("wrong-token")
        );
    }
}
