// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use crate::proofs::ProviderType;

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("invalid worker pool id {0:?}: expected <provisionerId>/<workerType>")]
    InvalidWorkerPoolId(String),
    #[error("unknown provider type {0:?}")]
    UnknownProviderType(String),
    #[error("invalid {provider} identity proof: {source}")]
    ProofDecode {
        provider: ProviderType,
        #[source]
        source: serde_json::Error,
    },
    #[error("unable to encode identity proof: {0}")]
    ProofEncode(#[source] serde_json::Error),
}
