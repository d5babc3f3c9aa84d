//! Access-control kernel contract.
//!
//! This module defines the *trait interfaces and configuration types* for
//! the request-gating layer in front of the model gateway. Concrete filters
//! live in `studyagora-gateway`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              studyagora-kernel  (this module)               │
//! │  GatewayFilter trait    FilterAction / Rejection            │
//! │  GatewayRequest/Response/Context   RouteClass               │
//! │  GatewaySettings + validate()      GatewayError             │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │              studyagora-gateway  (runtime crate)            │
//! │  SessionAuthFilter / FixedWindowRateLimitFilter /           │
//! │  LoggingFilter, FilterPipeline, OpenAiChatBackend, server   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod filter;
pub mod types;
pub mod validation;

pub use error::GatewayError;
pub use filter::{FilterAction, FilterOrder, GatewayFilter, Rejection};
pub use types::{GatewayContext, GatewayRequest, GatewayResponse, RouteClass};
pub use validation::{
    AccessPolicy, AuthSettings, GatewaySettings, GenerationSettings, IdentitySettings,
    RateLimitSettings, UpstreamSettings,
};
