//! Fixed-window rate-limit filter.
//!
//! Each (route class, client) pair is tracked independently. The client is
//! the socket peer, or the forwarded origin when
//! `trust_forwarded_headers` is set (see [`GatewayRequest::client_id`]).
//! Routes with no configured limit pass through untouched.
//!
//! [`GatewayRequest::client_id`]: studyagora_kernel::gateway::GatewayRequest::client_id

use crate::middleware::{Admission, RateLimiter};
use async_trait::async_trait;
use std::sync::Arc;
use studyagora_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, GatewayResponse,
    RateLimitSettings, Rejection,
};
use tracing::warn;

const LIMIT_ATTR: &str = "ratelimit.limit";
const REMAINING_ATTR: &str = "ratelimit.remaining";

pub struct FixedWindowRateLimitFilter {
    limiter: Arc<RateLimiter>,
    settings: RateLimitSettings,
}

impl FixedWindowRateLimitFilter {
    pub fn new(limiter: Arc<RateLimiter>, settings: RateLimitSettings) -> Self {
        Self { limiter, settings }
    }
}

#[async_trait]
impl GatewayFilter for FixedWindowRateLimitFilter {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::RATE_LIMIT
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let Some(limit) = self.settings.limit_for(ctx.route_class) else {
            return Ok(FilterAction::Continue);
        };
        let client = ctx.request.client_id(self.settings.trust_forwarded_headers);
        let key = format!("{}:{}", ctx.route_class, client);

        match self.limiter.check(&key, limit) {
            Admission::Admitted { remaining } => {
                ctx.set_attr(LIMIT_ATTR, &limit);
                ctx.set_attr(REMAINING_ATTR, &remaining);
                Ok(FilterAction::Continue)
            }
            Admission::Rejected { retry_after } => {
                ctx.set_attr(LIMIT_ATTR, &limit);
                ctx.set_attr(REMAINING_ATTR, &0u32);
                // Whole seconds, rounded up.
                let retry_after_secs = retry_after
                    .as_secs()
                    .saturating_add(u64::from(retry_after.subsec_nanos() > 0))
                    .max(1);
                warn!(
                    request_id = %ctx.request.id,
                    client     = %client,
                    route      = %ctx.route_class,
                    limit,
                    retry_after_secs,
                    "rate limit exceeded"
                );
                Ok(FilterAction::Reject(Rejection::QuotaExceeded { retry_after_secs }))
            }
        }
    }

    async fn on_response(
        &self,
        ctx: &GatewayContext,
        resp: &mut GatewayResponse,
    ) -> Result<(), GatewayError> {
        if let (Some(limit), Some(remaining)) = (
            ctx.get_attr::<u32>(LIMIT_ATTR),
            ctx.get_attr::<u32>(REMAINING_ATTR),
        ) {
            resp.headers
                .insert("x-ratelimit-limit".to_string(), limit.to_string());
            resp.headers
                .insert("x-ratelimit-remaining".to_string(), remaining.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use studyagora_kernel::gateway::GatewayRequest;

    fn filter(evaluate_limit: u32, quiz_limit: u32) -> FixedWindowRateLimitFilter {
        filter_with(RateLimitSettings {
            evaluate_limit,
            quiz_limit,
            ..Default::default()
        })
    }

    fn filter_with(settings: RateLimitSettings) -> FixedWindowRateLimitFilter {
        FixedWindowRateLimitFilter::new(
            Arc::new(RateLimiter::new(Duration::from_secs(settings.window_secs))),
            settings,
        )
    }

    fn ctx(path: &str, ip: &str) -> GatewayContext {
        GatewayContext::new(GatewayRequest::new("r", path, "POST").with_peer_addr(ip))
    }

    fn forwarded(path: &str, peer: &str, forwarded_for: &str) -> GatewayContext {
        GatewayContext::new(
            GatewayRequest::new("r", path, "POST")
                .with_peer_addr(peer)
                .with_header("x-forwarded-for", forwarded_for),
        )
    }

    #[tokio::test]
    async fn rejects_after_limit_per_route_class() {
        let f = filter(2, 5);
        for _ in 0..2 {
            assert_eq!(
                f.on_request(&mut ctx("/evaluate", "1.1.1.1")).await.unwrap(),
                FilterAction::Continue
            );
        }
        let action = f.on_request(&mut ctx("/api/evaluate", "1.1.1.1")).await.unwrap();
        match action {
            FilterAction::Reject(Rejection::QuotaExceeded { retry_after_secs }) => {
                assert!(retry_after_secs >= 1 && retry_after_secs <= 900);
            }
            other => panic!("expected quota rejection, got {other:?}"),
        }

        // Quiz has its own budget; another client has its own counter.
        assert_eq!(
            f.on_request(&mut ctx("/quiz", "1.1.1.1")).await.unwrap(),
            FilterAction::Continue
        );
        assert_eq!(
            f.on_request(&mut ctx("/evaluate", "2.2.2.2")).await.unwrap(),
            FilterAction::Continue
        );
    }

    #[tokio::test]
    async fn annotates_admitted_responses() {
        let f = filter(3, 5);
        let mut c = ctx("/evaluate", "1.1.1.1");
        f.on_request(&mut c).await.unwrap();
        let mut resp = GatewayResponse::new(200);
        f.on_response(&c, &mut resp).await.unwrap();
        assert_eq!(resp.headers["x-ratelimit-limit"], "3");
        assert_eq!(resp.headers["x-ratelimit-remaining"], "2");
    }

    #[tokio::test]
    async fn annotates_rejected_responses() {
        let f = filter(1, 5);
        f.on_request(&mut ctx("/evaluate", "1.1.1.1")).await.unwrap();
        let mut c = ctx("/evaluate", "1.1.1.1");
        assert!(matches!(f.on_request(&mut c).await.unwrap(), FilterAction::Reject(_)));
        let mut resp = GatewayResponse::new(429);
        f.on_response(&c, &mut resp).await.unwrap();
        assert_eq!(resp.headers["x-ratelimit-limit"], "1");
        assert_eq!(resp.headers["x-ratelimit-remaining"], "0");
    }

    #[tokio::test]
    async fn account_routes_are_not_limited() {
        let f = filter(0, 0);
        let mut c = ctx("/me", "1.1.1.1");
        assert_eq!(f.on_request(&mut c).await.unwrap(), FilterAction::Continue);
        let mut resp = GatewayResponse::new(200);
        f.on_response(&c, &mut resp).await.unwrap();
        assert!(resp.headers.is_empty());
    }

    #[tokio::test]
    async fn rotating_forwarded_for_shares_the_peer_budget() {
        let f = filter(20, 2);
        for i in 0..2 {
            let mut c = forwarded("/quiz", "192.0.2.1", &format!("10.9.9.{i}"));
            assert_eq!(f.on_request(&mut c).await.unwrap(), FilterAction::Continue);
        }
        let mut c = forwarded("/quiz", "192.0.2.1", "10.9.9.99");
        assert!(matches!(
            f.on_request(&mut c).await.unwrap(),
            FilterAction::Reject(Rejection::QuotaExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn trusted_forwarded_for_keys_on_origin() {
        let f = filter_with(RateLimitSettings {
            quiz_limit: 1,
            trust_forwarded_headers: true,
            ..Default::default()
        });
        let mut c = forwarded("/quiz", "10.0.0.1", "203.0.113.1");
        assert_eq!(f.on_request(&mut c).await.unwrap(), FilterAction::Continue);
        let mut c = forwarded("/quiz", "10.0.0.1", "203.0.113.2");
        assert_eq!(f.on_request(&mut c).await.unwrap(), FilterAction::Continue);
        let mut c = forwarded("/quiz", "10.0.0.1", "203.0.113.1");
        assert!(matches!(
            f.on_request(&mut c).await.unwrap(),
            FilterAction::Reject(Rejection::QuotaExceeded { .. })
        ));
    }
}
