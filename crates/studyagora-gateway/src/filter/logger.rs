//! Structured audit-logging filter.
//!
//! Emits `tracing` events on both the request and response path,
//! recording path, method, request id, client, principal, response status
//! and round-trip latency. The response event fires for rejected requests
//! too, even though their request event never ran.

use async_trait::async_trait;
use studyagora_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
};
use tracing::{error, info, warn};

/// Logging filter — records inbound requests and outbound responses.
#[derive(Default)]
pub struct LoggingFilter;

impl LoggingFilter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GatewayFilter for LoggingFilter {
    fn name(&self) -> &str {
        "access-log"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::LOGGING
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        info!(
            request_id    = %ctx.request.id,
            method        = %ctx.request.method,
            path          = %ctx.request.path,
            route         = %ctx.route_class,
            peer          = ?ctx.request.peer_addr,
            forwarded_for = ?ctx.request.header("x-forwarded-for"),
            principal     = ?ctx.principal.as_ref().map(|p| p.id.as_str()),
            "→ inbound request"
        );
        Ok(FilterAction::Continue)
    }

    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        let elapsed = u64::try_from(ctx.received_at.elapsed().as_millis()).unwrap_or(u64::MAX);

        if resp.status >= 500 {
            error!(
                request_id = %ctx.request.id,
                path       = %ctx.request.path,
                route      = %ctx.route_class,
                status     = resp.status,
                latency_ms = elapsed,
                "← error response"
            );
        } else if resp.status >= 400 {
            warn!(
                request_id = %ctx.request.id,
                path       = %ctx.request.path,
                route      = %ctx.route_class,
                status     = resp.status,
                latency_ms = elapsed,
                "← client error response"
            );
        } else {
            info!(
                request_id = %ctx.request.id,
                path       = %ctx.request.path,
                route      = %ctx.route_class,
                status     = resp.status,
                latency_ms = elapsed,
                "← outbound response"
            );
        }

        resp.latency_ms = elapsed;
        Ok(())
    }
}
