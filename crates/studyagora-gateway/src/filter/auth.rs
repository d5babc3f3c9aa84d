//! Session authentication filter.
//!
//! Accepts requests that carry a valid session credential in either:
//! - `Authorization: Bearer <token>` header
//! - the session cookie (name configurable, default `session`)
//!
//! On success the verified [`Principal`](studyagora_kernel::auth::Principal)
//! is attached to the context. Anything else is rejected with `401`.

use crate::credentials::session::cookie_value;
use crate::credentials::{CredentialError, SessionSigner};
use async_trait::async_trait;
use std::sync::Arc;
use studyagora_kernel::gateway::{
    FilterAction, FilterOrder, GatewayContext, GatewayError, GatewayFilter, Rejection,
};
use tracing::{debug, warn};

pub struct SessionAuthFilter {
    signer: Arc<SessionSigner>,
    cookie_name: String,
}

impl SessionAuthFilter {
    pub fn new(signer: Arc<SessionSigner>, cookie_name: impl Into<String>) -> Self {
        Self {
            signer,
            cookie_name: cookie_name.into(),
        }
    }

    fn extract_token<'a>(&self, ctx: &'a GatewayContext) -> Option<&'a str> {
        // `Authorization: Bearer <token>` wins over the cookie.
        if let Some(token) = ctx.request.header("authorization").and_then(|auth| {
            let (scheme, token) = auth.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        }) {
            return Some(token).filter(|t| !t.is_empty());
        }
        ctx.request
            .header("cookie")
            .and_then(|cookies| cookie_value(cookies, &self.cookie_name))
    }
}

#[async_trait]
impl GatewayFilter for SessionAuthFilter {
    fn name(&self) -> &str {
        "session-auth"
    }

    fn order(&self) -> FilterOrder {
        FilterOrder::AUTH
    }

    async fn on_request(&self, ctx: &mut GatewayContext) -> Result<FilterAction, GatewayError> {
        let verified = match self.extract_token(ctx) {
            Some(token) => self.signer.verify(token),
            None => Err(CredentialError::Missing),
        };

        match verified {
            Ok(principal) => {
                debug!(request_id = %ctx.request.id, principal = %principal.id, "session verified");
                ctx.principal = Some(principal);
                Ok(FilterAction::Continue)
            }
            Err(err) => {
                warn!(request_id = %ctx.request.id, reason = %err, "rejected request: session");
                Ok(FilterAction::Reject(Rejection::Unauthenticated(err.to_string())))
            }
        }
    }
}
