// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Provider-specific identity proofs.
//!
//! A [`WorkerIdentityProof`] travels inside the registration envelope as an
//! opaque JSON value. Only once the manager knows which [`ProviderType`] the
//! request's provider id is bound to does it decode the proof, using that
//! variant's strict schema. Every proof struct rejects unknown fields, so a
//! proof carrying anything beyond what its provider defines never verifies.
//!
//! | Provider type | Proof schema |
//! |---------------|--------------|
//! | `google` | `{"token": "<identity token>"}` |
//! | `aws` | `{"document": "<instance identity document>", "signature": "<signature>"}` |
//!
//! The credential material of a signed document is
//! `<signature>@sha256:<hex digest of document>`, so the signature only
//! verifies together with the document it was issued for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::errors::ProtocolError;
use crate::fingerprint::Fingerprint;

/// The cloud-provider variant behind a provider id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Google,
    Aws,
}

impl ProviderType {
    /// Decodes `proof` under this provider's strict schema.
    pub fn decode_proof(self, proof: &WorkerIdentityProof) -> Result<IdentityProof, ProtocolError> {
        let raw = proof.as_str();
        let decoded = match self {
            ProviderType::Google => serde_json::from_str::<GoogleProof>(raw).map(IdentityProof::Google),
            ProviderType::Aws => serde_json::from_str::<AwsProof>(raw).map(IdentityProof::Aws),
        };
        decoded.map_err(|source| ProtocolError::ProofDecode {
            provider: self,
            source,
        })
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderType::Google => write!(f, "google"),
            ProviderType::Aws => write!(f, "aws"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gcp" => Ok(ProviderType::Google),
            "aws" | "ec2" => Ok(ProviderType::Aws),
            _ => Err(ProtocolError::UnknownProviderType(s.to_string())),
        }
    }
}

/// Proof for the token variant: a bearer identity token minted by the
/// instance's metadata service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct GoogleProof {
    pub token: String,
}

impl fmt::Debug for GoogleProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleProof")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Proof for the signed-document variant: the instance identity document
/// and the provider's signature over it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
pub struct AwsProof {
    pub document: String,
    pub signature: String,
}

impl fmt::Debug for AwsProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsProof")
            .field("document", &format_args!("[{} bytes]", self.document.len()))
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// A decoded proof, tagged by the provider variant it was decoded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityProof {
    Google(GoogleProof),
    Aws(AwsProof),
}

impl IdentityProof {
    pub fn provider_type(&self) -> ProviderType {
        match self {
            IdentityProof::Google(_) => ProviderType::Google,
            IdentityProof::Aws(_) => ProviderType::Aws,
        }
    }

    /// The secret the provider vouches for, i.e. what a verifier checks.
    pub fn credential_material(&self) -> Zeroizing<String> {
        match self {
            IdentityProof::Google(proof) => Zeroizing::new(proof.token.clone()),
            IdentityProof::Aws(proof) => signed_document_material(&proof.document, &proof.signature),
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_str(&self.credential_material())
    }

    /// Serializes the proof with exactly the fields its variant defines.
    pub fn encode(&self) -> Result<WorkerIdentityProof, ProtocolError> {
        let raw = match self {
            IdentityProof::Google(proof) => serde_json::value::to_raw_value(proof),
            IdentityProof::Aws(proof) => serde_json::value::to_raw_value(proof),
        }
        .map_err(ProtocolError::ProofEncode)?;
        Ok(WorkerIdentityProof(raw))
    }
}

/// Binds `signature` to the digest of the `document` it signs.
pub fn signed_document_material(document: &str, signature: &str) -> Zeroizing<String> {
    Zeroizing::new(format!(
        "{signature}@sha256:{}",
        Fingerprint::of_str(document).as_hex()
    ))
}

/// The opaque proof blob carried by a registration request.
///
/// The JSON text is kept verbatim so that it can be decoded strictly once the
/// provider variant is known.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerIdentityProof(Box<RawValue>);

impl WorkerIdentityProof {
    /// Wraps already-serialized JSON. Fails only if `json` is not valid JSON.
    pub fn from_json(json: impl Into<String>) -> Result<Self, ProtocolError> {
        RawValue::from_string(json.into())
            .map(Self)
            .map_err(ProtocolError::ProofEncode)
    }

    pub fn as_str(&self) -> &str {
        self.0.get()
    }
}

// The raw blob contains the secret, so only its size is ever printed.
impl fmt::Debug for WorkerIdentityProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerIdentityProof([{} bytes])", self.as_str().len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn google(token: &str) -> IdentityProof {
        IdentityProof::Google(GoogleProof {
            token: token.to_string(),
        })
    }

    #[test]
    fn test_provider_type_parses_aliases() {
        assert_eq!("google".parse::<ProviderType>().unwrap(), ProviderType::Google);
        assert_eq!("GCP".parse::<ProviderType>().unwrap(), ProviderType::Google);
        assert_eq!("aws".parse::<ProviderType>().unwrap(), ProviderType::Aws);
        assert_eq!("ec2".parse::<ProviderType>().unwrap(), ProviderType::Aws);
        assert!("azure".parse::<ProviderType>().is_err());
    }

    #[test]
    fn test_google_proof_encodes_only_token() {
        let encoded = google("sekrit-token").encode().unwrap();
        assert_eq!(encoded.as_str(), r#"{"token":"sekrit-token"}"#);
    }

    #[test]
    fn test_google_proof_decodes() {
        let proof = WorkerIdentityProof::from_json(r#"{"token": "sekrit-token"}"#).unwrap();
        let decoded = ProviderType::Google.decode_proof(&proof).unwrap();
        assert_eq!(decoded, google("sekrit-token"));
        assert_eq!(decoded.credential_material().as_str(), "sekrit-token");
    }

    #[test]
    fn test_google_proof_rejects_unknown_field() {
        let proof =
            WorkerIdentityProof::from_json(r#"{"token": "sekrit-token", "extra": 1}"#).unwrap();
        let err = ProviderType::Google.decode_proof(&proof).unwrap_err();
        assert!(err.to_string().contains("unknown field `extra`"), "{err}");
    }

    #[test]
    fn test_google_proof_rejects_missing_token() {
        let proof = WorkerIdentityProof::from_json("{}").unwrap();
        assert!(ProviderType::Google.decode_proof(&proof).is_err());
    }

    #[test]
    fn test_google_proof_rejects_non_object() {
        let proof = WorkerIdentityProof::from_json(r#""sekrit-token""#).unwrap();
        assert!(ProviderType::Google.decode_proof(&proof).is_err());
    }

    #[test]
    fn test_aws_proof_is_not_a_google_proof() {
        let proof =
            WorkerIdentityProof::from_json(r#"{"document": "{}", "signature": "sig"}"#).unwrap();
        assert!(ProviderType::Google.decode_proof(&proof).is_err());

        let decoded = ProviderType::Aws.decode_proof(&proof).unwrap();
        assert_eq!(decoded.provider_type(), ProviderType::Aws);
        assert_eq!(
            decoded.credential_material().as_str(),
            signed_document_material("{}", "sig").as_str()
        );
    }

    #[test]
    fn test_signed_document_material_covers_document() {
        let material = signed_document_material("{}", "sig");
        assert_eq!(
            material.as_str(),
            "sig@sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_ne!(material, signed_document_material("{\"x\":1}", "sig"));

        let aws = |document: &str| {
            IdentityProof::Aws(AwsProof {
                document: document.to_string(),
                signature: "sig".to_string(),
            })
        };
        assert_ne!(aws("{}").fingerprint(), aws("attacker chosen").fingerprint());
    }

    #[test]
    fn test_debug_output_is_redacted() {
        let proof = google("sekrit-token");
        let encoded = proof.encode().unwrap();
        let rendered = format!("{proof:?} {encoded:?}");
        assert!(!rendered.contains("sekrit-token"), "{rendered}");
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(WorkerIdentityProof::from_json("{not json").is_err());
    }
}
