//! Shared fixtures for the router integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use studyagora_gateway::server::GatewayServer;
use studyagora_kernel::gateway::{AccessPolicy, GatewaySettings};
use studyagora_kernel::model::{ModelClient, ModelRequest, ModelResult};
use tower::ServiceExt;

pub const SESSION_SECRET: &str = "test-session-secret-0123456789abcdef";

/// Model stub that replays scripted replies and records every call.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelResult<String>>>,
    requests: Mutex<Vec<ModelRequest>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn replying(replies: impl IntoIterator<Item = ModelResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, request: ModelRequest) -> ModelResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("scripted reply".to_string()))
    }
}

pub fn settings(policy: AccessPolicy) -> GatewaySettings {
    let mut s = GatewaySettings {
        policy,
        ..Default::default()
    };
    s.auth.session_secret = Some(SESSION_SECRET.to_string());
    s
}

pub fn app(settings: GatewaySettings, model: Arc<ScriptedModel>) -> Router {
    GatewayServer::new(settings, model)
        .build_app()
        .expect("test settings are valid")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
        text,
    }
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_json_with(uri, body, &[])
}

pub fn post_json_with(uri: &str, body: &Value, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_with(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(Body::empty()).unwrap()
}

/// Attach the socket peer the server would see for `ip`.
pub fn from_peer(mut request: Request<Body>, ip: &str) -> Request<Body> {
    let ip: IpAddr = ip.parse().unwrap();
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));
    request
}
