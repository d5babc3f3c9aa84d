//! Request-time error taxonomy and its HTTP mapping.
//!
//! Every handler and the access-control middleware return [`ApiError`];
//! its [`IntoResponse`] impl is the single place where failures become
//! status codes. Upstream details are logged here and never sent to the
//! caller.

use crate::credentials::CredentialError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use studyagora_kernel::exam::ValidationError;
use studyagora_kernel::gateway::{GatewayError, Rejection};
use studyagora_kernel::model::ModelError;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed client-supplied input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Request body exceeds the configured limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Missing, malformed, forged or expired credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Fixed-window quota exhausted.
    #[error("quota exceeded, retry after {retry_after_secs}s")]
    QuotaExceeded { retry_after_secs: u64 },

    /// The upstream model call or its result validation failed.
    #[error("upstream failure: {0}")]
    Upstream(#[from] ModelError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err.0)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::Validation(rejection.body_text())
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Unauthenticated(msg) => ApiError::Unauthenticated(msg),
            Rejection::QuotaExceeded { retry_after_secs } => {
                ApiError::QuotaExceeded { retry_after_secs }
            }
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Delivery(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthenticated(other.to_string()),
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            ApiError::Unauthenticated(msg) => {
                warn!(reason = %msg, "rejected unauthenticated request");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "Authentication required".to_string(),
                )
            }
            ApiError::QuotaExceeded { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED",
                format!("Too many requests. Retry after {retry_after_secs} second(s)."),
            ),
            ApiError::Upstream(err) => {
                match err {
                    ModelError::Transport { status, body } => error!(
                        kind = err.kind(),
                        upstream_status = ?status,
                        upstream_body = %body,
                        "upstream model call failed"
                    ),
                    other => error!(kind = other.kind(), detail = %other, "upstream model call failed"),
                }
                let message = match err {
                    ModelError::ContentParse(_) => "Evaluation failed: invalid response format",
                    _ => "Upstream model request failed",
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_FAILURE",
                    message.to_string(),
                )
            }
            ApiError::Internal(msg) => {
                error!(detail = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if let ApiError::QuotaExceeded { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Failures that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] GatewayError),

    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
