//! Access-control middleware.
//!
//! Translates the axum request into a [`GatewayContext`], runs the filter
//! pipeline, and either short-circuits with the rejection or forwards to the
//! handler. Response hooks run afterwards in both cases and may add headers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use studyagora_kernel::gateway::{FilterAction, GatewayContext, GatewayRequest, GatewayResponse};
use tracing::warn;
use uuid::Uuid;

pub async fn access_control(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut gw_req = GatewayRequest::new(
        Uuid::new_v4().to_string(),
        req.uri().path(),
        req.method().as_str(),
    );
    for (name, value) in req.headers() {
        if let Ok(v) = value.to_str() {
            gw_req = gw_req.with_header(name.as_str(), v);
        }
    }
    if let Some(ConnectInfo(peer)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        gw_req = gw_req.with_peer_addr(peer.ip().to_string());
    }

    let mut ctx = GatewayContext::new(gw_req);
    let response = match state.pipeline.run_request(&mut ctx).await {
        Ok(FilterAction::Reject(rejection)) => ApiError::from(rejection).into_response(),
        Err(err) => ApiError::from(err).into_response(),
        // FilterAction is #[non_exhaustive]; treat unknown variants as Continue.
        Ok(_) => {
            if let Some(principal) = ctx.principal.clone() {
                req.extensions_mut().insert(principal);
            }
            next.run(req).await
        }
    };

    finish(&state, &ctx, response).await
}

/// Run the response hooks and merge the headers they produced.
async fn finish(state: &AppState, ctx: &GatewayContext, mut response: Response) -> Response {
    let mut gw_resp = GatewayResponse::new(response.status().as_u16());
    if let Err(err) = state.pipeline.run_response(ctx, &mut gw_resp).await {
        warn!(
            request_id = %ctx.request.id,
            error = %err,
            "response filter pipeline error (handler response still returned)"
        );
    }

    let headers = response.headers_mut();
    for (k, v) in gw_resp.headers {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(k), HeaderValue::try_from(v)) {
            headers.insert(name, value);
        }
    }
    response
}
