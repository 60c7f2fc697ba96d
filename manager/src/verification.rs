// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Verification of decoded identity proofs.
//!
//! [`ProofVerifier`] is the seam between the registration flow and whatever
//! actually vouches for a provider's evidence. [`StaticProofVerifier`]
//! compares the proof's credential material against a value configured per
//! provider id. For signed-document providers that value is
//! `<signature>@sha256:<document digest>`, see
//! [`signed_document_material`](worker_protocol::proofs::signed_document_material).
//!
//! Failures only ever carry [`Fingerprint`]s so that neither the presented
//! secret nor the expected one can reach a log line or a response body.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_lc_rs::constant_time;
use worker_protocol::fingerprint::Fingerprint;
use worker_protocol::models::ProviderId;
use worker_protocol::proofs::IdentityProof;
use zeroize::Zeroizing;

use crate::configuration::ExpectedIdentity;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("got token {received} but was expecting token {expected}")]
    Mismatch {
        expected: Fingerprint,
        received: Fingerprint,
    },
    #[error("got token {received} but no identity is expected from this provider")]
    NoExpectation { received: Fingerprint },
}

#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Checks `proof` against what `provider_id` is expected to present.
    async fn verify(
        &self,
        provider_id: &ProviderId,
        proof: &IdentityProof,
    ) -> Result<(), VerificationFailure>;
}

#[derive(Default)]
pub struct StaticProofVerifier {
    expected: HashMap<ProviderId, Zeroizing<String>>,
}

impl StaticProofVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(mut self, provider_id: impl Into<ProviderId>, material: impl Into<String>) -> Self {
        self.expected
            .insert(provider_id.into(), Zeroizing::new(material.into()));
        self
    }
}

impl<'a> FromIterator<&'a ExpectedIdentity> for StaticProofVerifier {
    fn from_iter<I: IntoIterator<Item = &'a ExpectedIdentity>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |verifier, identity| {
            verifier.expect(identity.provider_id.clone(), identity.material.expose())
        })
    }
}

#[async_trait]
impl ProofVerifier for StaticProofVerifier {
    async fn verify(
        &self,
        provider_id: &ProviderId,
        proof: &IdentityProof,
    ) -> Result<(), VerificationFailure> {
        let received = proof.fingerprint();
        let Some(expected) = self.expected.get(provider_id) else {
            return Err(VerificationFailure::NoExpectation { received });
        };

        constant_time::verify_slices_are_equal(
            expected.as_bytes(),
            proof.credential_material().as_bytes(),
        )
        .map_err(|_| VerificationFailure::Mismatch {
            expected: Fingerprint::of_str(expected),
            received,
        })
    }
}
