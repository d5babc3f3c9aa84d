//! Gateway filter trait and filter-chain types.
//!
//! Filters are sorted by their declared [`FilterOrder`] and executed in
//! ascending order on the request path and descending order on the response
//! path.
//!
//! ```text
//! Request  ──► Auth ──► RateLimit ──► Logging
//!                  (handler / upstream call happens here)
//! Response ◄── Logging ◄── RateLimit ◄── Auth
//! ```

use super::error::GatewayError;
use super::types::{GatewayContext, GatewayResponse};
use async_trait::async_trait;

// ─────────────────────────────────────────────────────────────────────────────
// Filter ordering
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric ordering slot for a filter in the chain.
///
/// Filters with equal order values are executed in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FilterOrder(pub u32);

impl FilterOrder {
    /// Credential verification slot.
    pub const AUTH: FilterOrder = FilterOrder(100);
    /// Admission quota slot.
    pub const RATE_LIMIT: FilterOrder = FilterOrder(200);
    /// Audit logging slot; sees the principal resolved by the auth slot.
    pub const LOGGING: FilterOrder = FilterOrder(400);
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter action
// ─────────────────────────────────────────────────────────────────────────────

/// Why a filter refused to admit a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Missing, malformed, forged or expired credential (401).
    Unauthenticated(String),
    /// Admission quota for the current window is used up (429).
    QuotaExceeded {
        /// Seconds until the window rolls over.
        retry_after_secs: u64,
    },
}

/// Instruction returned by [`GatewayFilter::on_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FilterAction {
    /// Pass the request to the next filter or the handler.
    Continue,
    /// Short-circuit the chain with an error response.
    Reject(Rejection),
}

// ─────────────────────────────────────────────────────────────────────────────
// GatewayFilter trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for a single filter in the gating pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared across Tokio
/// tasks without additional synchronization by the caller.
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Stable, human-readable identifier for this filter (used in logs).
    fn name(&self) -> &str;

    /// Position in the filter chain.  Lower values execute first on the
    /// request path.
    fn order(&self) -> FilterOrder;

    /// Called before the handler runs. May attach a principal to `ctx`.
    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError>;

    /// Called after the handler produced a response. May add headers.
    async fn on_response(
        &self,
        _ctx: &GatewayContext,
        _resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
}
