// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::collections::HashMap;

use worker_protocol::models::ProviderId;
use worker_protocol::proofs::ProviderType;

use crate::configuration::ProviderBinding;

/// The providers this manager accepts registrations from.
///
/// A provider id is a deployment-chosen name; the registry maps it to the
/// [`ProviderType`] whose proof schema applies to workers it launched.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, ProviderType>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider_id: impl Into<ProviderId>, provider_type: ProviderType) -> Self {
        self.register(provider_id.into(), provider_type);
        self
    }

    /// Adds a binding, returning the provider type it replaced.
    pub fn register(&mut self, provider_id: ProviderId, provider_type: ProviderType) -> Option<ProviderType> {
        let previous = self.providers.insert(provider_id.clone(), provider_type);
        if let Some(previous) = previous {
            tracing::warn!(
                "[manager] provider {} rebound from {} to {}",
                provider_id,
                previous,
                provider_type
            );
        }
        previous
    }

    pub fn lookup(&self, provider_id: &ProviderId) -> Option<ProviderType> {
        self.providers.get(provider_id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromIterator<ProviderBinding> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = ProviderBinding>>(iter: I) -> Self {
        let mut registry = Self::new();
        for binding in iter {
            registry.register(binding.provider_id, binding.provider_type);
        }
        registry
    }
}
