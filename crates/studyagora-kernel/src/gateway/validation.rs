//! Gateway settings and startup validation.
//!
//! [`GatewaySettings`] aggregates every tunable of the service (upstream,
//! generation profiles, access policy, rate limits, credentials) and exposes
//! a single [`validate()`](GatewaySettings::validate) that checks structural
//! invariants *before* any runtime resources are allocated.
//!
//! All structs deserialize with defaults for every field, so a config file
//! only needs to name what it overrides.

use super::error::GatewayError;
use super::types::RouteClass;
use crate::model::GenerationOptions;
use serde::{Deserialize, Serialize};

/// Minimum accepted length of the session signing secret, in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

// ─────────────────────────────────────────────────────────────────────────────
// AccessPolicy
// ─────────────────────────────────────────────────────────────────────────────

/// How protected routes (`/evaluate`, `/quiz`) are gated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// Every request is admitted.
    Open,
    /// Fixed-window admission quota per client and route class.
    #[default]
    RateLimited,
    /// A valid session credential is required.
    Authenticated,
}

impl AccessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::Open => "open",
            AccessPolicy::RateLimited => "rate_limited",
            AccessPolicy::Authenticated => "authenticated",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for the OpenAI-compatible upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    /// Bearer key sent upstream. `GROQ_API_KEY` is honored when unset.
    pub api_key: Option<String>,
    /// Whole-request timeout for the upstream call.
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

/// Sampling profile per route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub evaluate: GenerationOptions,
    pub evaluate_structured: GenerationOptions,
    pub quiz: GenerationOptions,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            evaluate: GenerationOptions::new(1000, 0.4),
            evaluate_structured: GenerationOptions::new(1200, 0.2),
            quiz: GenerationOptions::new(2000, 0.7),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rate limits
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-window quotas, one per route class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Window length in seconds.
    pub window_secs: u64,
    /// Admissions per window on `/evaluate`.
    pub evaluate_limit: u32,
    /// Admissions per window on `/quiz`.
    pub quiz_limit: u32,
    /// How often stale windows are evicted.
    pub gc_interval_secs: u64,
    /// Key clients on `X-Forwarded-For` / `X-Real-IP` instead of the socket
    /// peer. Only enable behind a proxy that overwrites those headers.
    pub trust_forwarded_headers: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            evaluate_limit: 20,
            quiz_limit: 50,
            gc_interval_secs: 60,
            trust_forwarded_headers: false,
        }
    }
}

impl RateLimitSettings {
    /// Quota for `class`; `None` means the class is not rate limited.
    pub fn limit_for(&self, class: RouteClass) -> Option<u32> {
        match class {
            RouteClass::Evaluate => Some(self.evaluate_limit),
            RouteClass::Quiz => Some(self.quiz_limit),
            RouteClass::Account => None,
        }
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if self.window_secs == 0 {
            return Err(GatewayError::InvalidRateLimit(
                "window_secs must be greater than 0".into(),
            ));
        }
        if self.evaluate_limit == 0 || self.quiz_limit == 0 {
            return Err(GatewayError::InvalidRateLimit(
                "per-route limits must be greater than 0".into(),
            ));
        }
        if self.gc_interval_secs == 0 {
            return Err(GatewayError::InvalidRateLimit(
                "gc_interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Trusted issuer of external identity tokens (JWT).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim, when the issuer sets one.
    pub audience: Option<String>,
    /// RS256 verification key (PEM). Mutually exclusive with `hs256_secret`.
    pub rsa_public_key_pem: Option<String>,
    /// HS256 shared secret. Mutually exclusive with `rsa_public_key_pem`.
    pub hs256_secret: Option<String>,
}

impl IdentitySettings {
    fn validate(&self) -> Result<(), GatewayError> {
        if self.issuer.trim().is_empty() {
            return Err(GatewayError::InvalidAuthConfig(
                "identity.issuer cannot be empty".into(),
            ));
        }
        match (&self.rsa_public_key_pem, &self.hs256_secret) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            _ => Err(GatewayError::InvalidAuthConfig(
                "identity needs exactly one of rsa_public_key_pem or hs256_secret".into(),
            )),
        }
    }
}

/// Session credential and passcode settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC key for session credentials. `JWT_SECRET` is honored when unset.
    pub session_secret: Option<String>,
    /// Session lifetime in seconds (default 7 days).
    pub session_ttl_secs: u64,
    pub cookie_name: String,
    /// Mark the session cookie `Secure`.
    pub cookie_secure: bool,
    /// Development mode: every passcode is the fixed `123456`.
    pub dev_mode: bool,
    /// Echo the passcode in the `send-otp` response. Honored only in dev mode.
    pub echo_dev_otp: bool,
    pub otp_length: u32,
    pub otp_ttl_secs: u64,
    /// Wrong guesses allowed per passcode; `None` disables the limit.
    pub otp_max_attempts: Option<u32>,
    /// Plan assigned to principals that do not carry one.
    pub default_plan: String,
    /// Enables `POST /auth/verify-token` when present.
    pub identity: Option<IdentitySettings>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_secs: 7 * 24 * 60 * 60,
            cookie_name: "session".to_string(),
            cookie_secure: false,
            dev_mode: false,
            echo_dev_otp: false,
            otp_length: 6,
            otp_ttl_secs: 5 * 60,
            otp_max_attempts: Some(5),
            default_plan: "free".to_string(),
            identity: None,
        }
    }
}

impl AuthSettings {
    fn validate(&self) -> Result<(), GatewayError> {
        match &self.session_secret {
            None => {
                return Err(GatewayError::InvalidAuthConfig(
                    "session_secret is required by the authenticated policy".into(),
                ));
            }
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(GatewayError::InvalidAuthConfig(format!(
                    "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
                )));
            }
            Some(_) => {}
        }
        if self.session_ttl_secs == 0 {
            return Err(GatewayError::InvalidAuthConfig(
                "session_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.cookie_name.trim().is_empty() {
            return Err(GatewayError::InvalidAuthConfig(
                "cookie_name cannot be empty".into(),
            ));
        }
        if !(4..=10).contains(&self.otp_length) {
            return Err(GatewayError::InvalidAuthConfig(
                "otp_length must be between 4 and 10".into(),
            ));
        }
        if self.otp_ttl_secs == 0 {
            return Err(GatewayError::InvalidAuthConfig(
                "otp_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.otp_max_attempts == Some(0) {
            return Err(GatewayError::InvalidAuthConfig(
                "otp_max_attempts must be greater than 0 when set".into(),
            ));
        }
        if let Some(identity) = &self.identity {
            identity.validate()?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewaySettings
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub host: String,
    pub port: u16,
    pub policy: AccessPolicy,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Always return the structured report from `/evaluate`.
    pub structured_reports: bool,
    /// Upper bound on `count` in quiz requests.
    pub max_quiz_count: u32,
    pub upstream: UpstreamSettings,
    pub generation: GenerationSettings,
    pub rate_limit: RateLimitSettings,
    pub auth: AuthSettings,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            policy: AccessPolicy::default(),
            cors_origins: Vec::new(),
            structured_reports: false,
            max_quiz_count: 50,
            upstream: UpstreamSettings::default(),
            generation: GenerationSettings::default(),
            rate_limit: RateLimitSettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl GatewaySettings {
    /// Validate all structural invariants.
    ///
    /// Checks performed (in order):
    /// 1. Upstream base URL is an http(s) URL.
    /// 2. Model id is non-empty.
    /// 3. Upstream timeout is non-zero.
    /// 4. Every generation profile has `max_tokens > 0` and a temperature in `0..=2`.
    /// 5. `max_quiz_count` is non-zero.
    /// 6. Rate-limit settings are non-zero (rate-limited policy only).
    /// 7. Auth settings are complete (authenticated policy only).
    pub fn validate(&self) -> Result<(), GatewayError> {
        let url = self.upstream.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(GatewayError::InvalidUpstreamUrl(url.to_string()));
        }
        if self.upstream.model.trim().is_empty() {
            return Err(GatewayError::EmptyModelId);
        }
        if self.upstream.timeout_secs == 0 {
            return Err(GatewayError::InvalidTimeout);
        }

        for (name, opts) in [
            ("evaluate", &self.generation.evaluate),
            ("evaluate_structured", &self.generation.evaluate_structured),
            ("quiz", &self.generation.quiz),
        ] {
            if opts.max_tokens == 0 {
                return Err(GatewayError::InvalidGeneration(
                    name.into(),
                    "max_tokens must be greater than 0".into(),
                ));
            }
            if !(0.0..=2.0).contains(&opts.temperature) {
                return Err(GatewayError::InvalidGeneration(
                    name.into(),
                    "temperature must be within 0.0..=2.0".into(),
                ));
            }
        }

        if self.max_quiz_count == 0 {
            return Err(GatewayError::InvalidGeneration(
                "quiz".into(),
                "max_quiz_count must be greater than 0".into(),
            ));
        }

        match self.policy {
            AccessPolicy::Open => {}
            AccessPolicy::RateLimited => self.rate_limit.validate()?,
            AccessPolicy::Authenticated => self.auth.validate()?,
        }
        Ok(())
    }
}
