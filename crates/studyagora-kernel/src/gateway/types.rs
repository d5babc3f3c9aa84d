//! Core data types for the access-control contract.
//!
//! These types are shared by every [`GatewayFilter`](super::filter::GatewayFilter)
//! and carry no runtime dependencies beyond `serde` and `std`.

use crate::auth::Principal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

// ─────────────────────────────────────────────────────────────────────────────
// Route class
// ─────────────────────────────────────────────────────────────────────────────

/// Cost class of a protected route. Rate limits are configured per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    /// Answer evaluation: long prompts, expensive.
    Evaluate,
    /// Quiz generation.
    Quiz,
    /// Session-only routes (`/me`, logout); never rate limited.
    Account,
}

impl RouteClass {
    /// Classify a request path. Both the bare and the `/api`-prefixed
    /// spellings map to the same class.
    pub fn from_path(path: &str) -> Self {
        let path = path.split('?').next().unwrap_or(path);
        let path = path.strip_prefix("/api").unwrap_or(path);
        match path.trim_end_matches('/') {
            "/evaluate" => RouteClass::Evaluate,
            "/quiz" => RouteClass::Quiz,
            _ => RouteClass::Account,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Evaluate => "evaluate",
            RouteClass::Quiz => "quiz",
            RouteClass::Account => "account",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// The parts of an inbound request that filters are allowed to look at.
///
/// The body is deliberately absent: gating decisions never depend on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Unique identifier for correlating this request across logs.
    pub id: String,
    /// Request path, e.g. `/evaluate`.
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    /// HTTP headers (names lowercased).
    pub headers: HashMap<String, String>,
    /// Socket peer address, when the transport exposes one.
    pub peer_addr: Option<String>,
}

impl GatewayRequest {
    pub fn new(id: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            method: method.into().to_uppercase(),
            headers: HashMap::new(),
            peer_addr: None,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }

    /// Builder helper: set the socket peer address.
    pub fn with_peer_addr(mut self, addr: impl Into<String>) -> Self {
        self.peer_addr = Some(addr.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Network origin of the caller.
    ///
    /// The socket peer is authoritative. Forwarding headers are client
    /// controlled and are only consulted when `trust_forwarded` is set, in
    /// which case the first `X-Forwarded-For` hop wins, then `X-Real-IP`.
    /// Falls back to `"anonymous"` when nothing identifies the caller.
    pub fn client_id(&self, trust_forwarded: bool) -> String {
        let forwarded = trust_forwarded
            .then(|| {
                self.header("x-forwarded-for")
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .or_else(|| self.header("x-real-ip").map(str::trim).filter(|s| !s.is_empty()))
            })
            .flatten();
        forwarded
            .map(str::to_string)
            .or_else(|| self.peer_addr.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }
}

/// Response metadata visible to filters on the way out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Headers filters want added to the outgoing response.
    pub headers: HashMap<String, String>,
    /// Time spent in the handler, in milliseconds.
    pub latency_ms: u64,
}

impl GatewayResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            latency_ms: 0,
        }
    }

    /// Builder helper: attach a header.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into().to_lowercase(), value.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Mutable context that flows through the filter chain for a single request.
///
/// Filters read from and write to this context, so decisions made early in
/// the chain (the principal set by the auth filter) are visible later
/// (the access log).
#[derive(Debug, Clone)]
pub struct GatewayContext {
    pub request: GatewayRequest,
    pub route_class: RouteClass,
    /// Principal resolved by the auth filter; `None` if unauthenticated.
    pub principal: Option<Principal>,
    /// Free-form attributes written and read by filters.
    pub attributes: HashMap<String, serde_json::Value>,
    /// When the gateway first saw the request.
    pub received_at: Instant,
}

impl GatewayContext {
    /// Create a fresh context, classifying the route from the request path.
    pub fn new(request: GatewayRequest) -> Self {
        let route_class = RouteClass::from_path(&request.path);
        Self {
            request,
            route_class,
            principal: None,
            attributes: HashMap::new(),
            received_at: Instant::now(),
        }
    }

    /// Read a typed attribute, returning `None` if absent or if
    /// deserialization fails.
    pub fn get_attr<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Write a serializable attribute.
    pub fn set_attr<T: serde::Serialize>(&mut self, key: impl Into<String>, val: &T) {
        if let Ok(v) = serde_json::to_value(val) {
            self.attributes.insert(key.into(), v);
        }
    }
}
