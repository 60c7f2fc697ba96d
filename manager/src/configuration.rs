// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use clap::{ArgAction, Parser};
use worker_protocol::models::ProviderId;
use worker_protocol::proofs::ProviderType;
use zeroize::ZeroizeOnDrop;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct ManagerOptions {
    #[arg(long, default_value = "127.0.0.1", env("MANAGER_HTTP_HOST"))]
    pub host: String,
    #[arg(long, default_value = "8080", env("MANAGER_HTTP_PORT"))]
    pub port: u16,
    /// Provider bindings, `<providerId>=<google|aws>`
    #[arg(long = "provider", env("MANAGER_PROVIDERS"), value_delimiter = ',')]
    pub providers: Vec<ProviderBinding>,
    /// Identity material each provider's proofs must carry, `<providerId>=<value>`.
    /// Signed-document providers take `<signature>@sha256:<document digest>`.
    #[arg(
        long = "expected-identity",
        env("MANAGER_EXPECTED_IDENTITIES"),
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub expected_identities: Vec<ExpectedIdentity>,
    #[arg(long, env("MANAGER_ISSUER_CLIENT_ID"))]
    pub issuer_client_id: Option<String>,
    #[arg(long, env("MANAGER_ISSUER_ACCESS_TOKEN"), hide_env_values = true)]
    pub issuer_access_token: Option<Secret>,
    #[arg(long, default_value = "86400", env("MANAGER_CREDENTIAL_TTL_SECS"))]
    pub credential_ttl_secs: u64,
    #[arg(long, default_value = "false", env("MANAGER_REJECT_REPLAYED_PROOFS"), action = ArgAction::SetTrue)]
    pub reject_replayed_proofs: bool,
    #[arg(long, default_value = "3600", env("MANAGER_REPLAY_WINDOW_SECS"))]
    pub replay_window_secs: u64,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        ManagerOptions {
            host: "127.0.0.1".to_string(),
            port: 8080,
            providers: Vec::new(),
            expected_identities: Vec::new(),
            issuer_client_id: None,
            issuer_access_token: None,
            credential_ttl_secs: crate::constants::DEFAULT_CREDENTIAL_TTL.as_secs(),
            reject_replayed_proofs: false,
            replay_window_secs: crate::constants::DEFAULT_REPLAY_WINDOW.as_secs(),
        }
    }
}

/// A string that must never be logged.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Binds a configured provider id to the provider variant whose proof schema applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderBinding {
    pub provider_id: ProviderId,
    pub provider_type: ProviderType,
}

impl FromStr for ProviderBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, kind) = split_pair(s)?;
        let provider_type = kind.parse::<ProviderType>().map_err(|e| e.to_string())?;
        Ok(Self {
            provider_id: ProviderId::new(id),
            provider_type,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedIdentity {
    pub provider_id: ProviderId,
    pub material: Secret,
}

impl FromStr for ExpectedIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, material) = split_pair(s)?;
        Ok(Self {
            provider_id: ProviderId::new(id),
            material: Secret::new(material),
        })
    }
}

fn split_pair(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.is_empty() => {
            Ok((key.trim(), value))
        }
        // never echo the input back: it may hold a secret
        _ => Err("expected <providerId>=<value>".to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_binding_parses() {
        let binding: ProviderBinding = "test-provider=google".parse().unwrap();
        assert_eq!(binding.provider_id, ProviderId::from("test-provider"));
        assert_eq!(binding.provider_type, ProviderType::Google);
    }

    #[test]
    fn test_provider_binding_rejects_unknown_type() {
        assert!("test-provider=azure".parse::<ProviderBinding>().is_err());
        assert!("test-provider".parse::<ProviderBinding>().is_err());
        assert!("=google".parse::<ProviderBinding>().is_err());
    }

    #[test]
    fn test_expected_identity_keeps_equals_in_value() {
        let identity: ExpectedIdentity = "aws-provider=c2lnbmF0dXJl==".parse().unwrap();
        assert_eq!(identity.provider_id.as_str(), "aws-provider");
        assert_eq!(identity.material.expose(), "c2lnbmF0dXJl==");
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let options = ManagerOptions {
            expected_identities: vec!["test-provider=sekrit-token".parse().unwrap()],
            issuer_access_token: Some(Secret::new("root-access-token")),
            ..ManagerOptions::default()
        };
        let rendered = format!("{options:?}");
        assert!(!rendered.contains("sekrit-token"));
        assert!(!rendered.contains("root-access-token"));
    }

    #[test]
    fn test_cli_parses_repeated_and_delimited_providers() {
        let options = ManagerOptions::try_parse_from([
            "worker-manager",
            "--provider",
            "test-provider=google,aws-provider=aws",
            "--provider",
            "legacy=gcp",
            "--port",
            "0",
        ])
        .unwrap();
        assert_eq!(options.providers.len(), 3);
        assert_eq!(options.port, 0);
        assert!(!options.reject_replayed_proofs);
    }
}
