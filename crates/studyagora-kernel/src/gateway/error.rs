//! Configuration-time error type for the gateway kernel contract.
//!
//! [`GatewayError`] covers failure modes that can be detected before the
//! server binds a socket: invalid settings, unusable key material. Request
//! time failures (bad input, upstream outage) belong to the runtime crate.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Upstream ────────────────────────────────────────────────────────────
    /// The upstream base URL is empty or not an http(s) URL.
    #[error("upstream base url is invalid: {0}")]
    InvalidUpstreamUrl(String),

    /// The model identifier is empty.
    #[error("upstream model id cannot be empty")]
    EmptyModelId,

    /// `timeout_secs` is zero, which would fail every upstream call.
    #[error("upstream timeout must be greater than 0 seconds")]
    InvalidTimeout,

    /// A generation profile has a nonsensical value.
    #[error("generation settings for '{0}' are invalid: {1}")]
    InvalidGeneration(String, String),

    // ── Rate limits ──────────────────────────────────────────────────────────
    /// Window length or a per-class limit is zero.
    #[error("rate limit settings are invalid: {0}")]
    InvalidRateLimit(String),

    // ── Auth ─────────────────────────────────────────────────────────────────
    /// An authentication setting is missing or too weak.
    #[error("authentication config is invalid: {0}")]
    InvalidAuthConfig(String),
}
