// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use axum::Json;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use worker_protocol::fingerprint::Fingerprint;
use worker_protocol::models::{ErrorResponse, ProviderId};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum AppError {
    #[error("registration requires POST, got {0}")]
    MethodNotAllowed(Method),
    #[error("malformed registration request: {0}")]
    MalformedRequest(String),
    #[error("unknown provider \"{0}\"")]
    UnknownProvider(ProviderId),
    #[error("malformed identity proof: {0}")]
    MalformedProof(String),
    #[error("{0}")]
    IdentityMismatch(String),
    #[error("identity proof {0} has already been used")]
    ReplayedProof(Fingerprint),
    #[error("internal server error")]
    InternalServerError,
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedRequest(_) | Self::MalformedProof(_) => StatusCode::BAD_REQUEST,
            Self::UnknownProvider(_) => StatusCode::NOT_FOUND,
            Self::IdentityMismatch(_) => StatusCode::FORBIDDEN,
            Self::ReplayedProof(_) => StatusCode::CONFLICT,
            Self::InternalServerError | Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            // configuration details stay in the logs
            Self::ConfigError(_) => "Internal Server Error".to_string(),
            Self::InternalServerError => "Internal Server Error".to_string(),
            ref other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: status.as_u16(),
            message,
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

impl From<serde_json::Error> for AppError {
    fn from(_source: serde_json::Error) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}

impl From<aws_lc_rs::error::Unspecified> for AppError {
    fn from(_source: aws_lc_rs::error::Unspecified) -> Self {
        tracing::error!("{:?}", _source);
        AppError::InternalServerError
    }
}
