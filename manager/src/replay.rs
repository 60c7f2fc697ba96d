// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use worker_protocol::fingerprint::Fingerprint;

use crate::constants::MAX_REPLAY_WINDOW;

/// Remembers accepted proofs so that each one can be used once.
///
/// Entries expire after `window`, which should match the validity period of
/// the provider's identity tokens; past that point the provider itself stops
/// vouching for the token. The window is capped at [`MAX_REPLAY_WINDOW`].
pub struct ReplayGuard {
    window: Duration,
    seen: Mutex<HashMap<Fingerprint, Instant>>,
}

impl ReplayGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window: window.min(MAX_REPLAY_WINDOW),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Records `fingerprint` and returns `true` if it was not already recorded
    /// within the window.
    pub async fn check_and_record(&self, fingerprint: Fingerprint) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        seen.retain(|_, expires_at| *expires_at > now);

        match seen.entry(fingerprint) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(now + self.window);
                true
            }
        }
    }

    /// Gives a recorded proof back, for when the registration it was spent
    /// on failed after the check.
    pub async fn forget(&self, fingerprint: &Fingerprint) {
        self.seen.lock().await.remove(fingerprint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_second_use_is_rejected() {
        let guard = ReplayGuard::new(Duration::from_secs(60));
        assert!(guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);
        assert!(!guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);
        assert!(guard.check_and_record(Fingerprint::of_str("other-token")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_window() {
        let guard = ReplayGuard::new(Duration::from_secs(60));
        assert!(guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);
        assert!(!guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forgotten_proof_can_be_used_again() {
        let guard = ReplayGuard::new(Duration::from_secs(60));
        let fingerprint = Fingerprint::of_str("sekrit-token");
        assert!(guard.check_and_record(fingerprint.clone()).await);

        guard.forget(&fingerprint).await;

        assert!(guard.check_and_record(fingerprint).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_is_capped() {
        let guard = ReplayGuard::new(Duration::from_secs(u64::MAX));
        assert!(guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);

        tokio::time::advance(MAX_REPLAY_WINDOW + Duration::from_secs(1)).await;

        assert!(guard.check_and_record(Fingerprint::of_str("sekrit-token")).await);
    }
}
