//! Request handlers for the public API

pub mod auth;
pub mod exam;
pub mod health;

pub use auth::{account_router, credential_router};
pub use exam::exam_router;
pub use health::health_router;

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `Json` extractor whose rejection is an [`ApiError::Validation`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
