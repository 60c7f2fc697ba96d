// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

/// Failure to obtain a fact from the local metadata service.
#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("metadata service unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("malformed metadata from {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("failed to decode metadata attribute {path}: {source}")]
    AttributeDecode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl MetadataError {
    /// Only an unreachable or failing service is worth asking again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub(crate) fn unavailable(url: &str, reason: impl ToString) -> Self {
        Self::Unavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl ToString) -> Self {
        Self::Malformed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("registration rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("registration request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid registration response: {0}")]
    InvalidResponse(#[source] serde_json::Error),
    #[error("manager returned incomplete credentials")]
    IncompleteCredentials,
    #[error("registration cancelled")]
    Cancelled,
    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(MetadataError::unavailable("http://x", "connection refused").is_retryable());
        assert!(!MetadataError::malformed("http://x", "empty body").is_retryable());

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let decode = MetadataError::AttributeDecode {
            path: "instance/attributes/taskcluster".to_string(),
            source,
        };
        assert!(!decode.is_retryable());
        assert!(decode.to_string().contains("instance/attributes/taskcluster"));
    }
}
