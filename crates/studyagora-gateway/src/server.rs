//! Axum-based HTTP gateway server.
//!
//! [`GatewayServer`] wires together the model backend, the filter pipeline
//! for the configured access policy, and the credential machinery into a
//! running axum service.
//!
//! # Endpoints
//!
//! | Method | Path | Gate |
//! |--------|------|------|
//! | `GET`  | `/`, `/health` | none |
//! | `POST` | `/evaluate`, `/api/evaluate`, `/quiz`, `/api/quiz` | policy |
//! | `POST` | `/auth/send-otp`, `/auth/verify-otp`, `/auth/verify-token` | none (authenticated policy only) |
//! | `GET`  | `/me`, `/auth/me` | session (authenticated policy only) |
//! | `POST` | `/auth/logout` | session (authenticated policy only) |

use crate::credentials::{IdentityVerifier, LogOtpSender, OtpSender, OtpStore, SessionSigner};
use crate::error::ServerError;
use crate::filter::{FilterPipeline, FixedWindowRateLimitFilter, LoggingFilter, SessionAuthFilter};
use crate::handlers::{account_router, credential_router, exam_router, health_router};
use crate::middleware::{RateLimiter, access_control};
use crate::prompt::PromptTemplates;
use crate::state::{AppState, AuthState};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use studyagora_kernel::gateway::{AccessPolicy, GatewayFilter, GatewayError, GatewaySettings};
use studyagora_kernel::model::ModelClient;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// JSON body limit for every route.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// GatewayServer
// ─────────────────────────────────────────────────────────────────────────────

/// High-level gateway server encapsulating settings, the upstream model and
/// the passcode delivery channel.
pub struct GatewayServer {
    settings: GatewaySettings,
    model: Arc<dyn ModelClient>,
    otp_sender: Arc<dyn OtpSender>,
}

impl GatewayServer {
    /// Create a new server. Passcodes are delivered through the log until
    /// [`with_otp_sender`](Self::with_otp_sender) replaces the channel.
    pub fn new(settings: GatewaySettings, model: Arc<dyn ModelClient>) -> Self {
        Self {
            settings,
            model,
            otp_sender: Arc::new(LogOtpSender),
        }
    }

    pub fn with_otp_sender(mut self, sender: Arc<dyn OtpSender>) -> Self {
        self.otp_sender = sender;
        self
    }

    /// Validate settings and assemble the shared state for the policy.
    pub fn build_state(&self) -> Result<AppState, GatewayError> {
        self.settings.validate()?;
        let settings = &self.settings;

        let mut filters: Vec<Arc<dyn GatewayFilter>> = vec![Arc::new(LoggingFilter::new())];
        let mut limiter = None;
        let mut auth = None;

        match settings.policy {
            AccessPolicy::Open => {
                warn!("access policy is OPEN: every request reaches the upstream model");
            }
            AccessPolicy::RateLimited => {
                let rl = Arc::new(RateLimiter::new(Duration::from_secs(
                    settings.rate_limit.window_secs,
                )));
                filters.push(Arc::new(FixedWindowRateLimitFilter::new(
                    rl.clone(),
                    settings.rate_limit.clone(),
                )));
                limiter = Some(rl);
            }
            AccessPolicy::Authenticated => {
                let state = self.build_auth_state()?;
                filters.push(Arc::new(SessionAuthFilter::new(
                    state.sessions.clone(),
                    settings.auth.cookie_name.clone(),
                )));
                auth = Some(Arc::new(state));
            }
        }

        let pipeline = FilterPipeline::new(filters);
        info!(
            policy = settings.policy.as_str(),
            filters = ?pipeline.names(),
            model = self.model.model_id(),
            "filter pipeline assembled"
        );

        Ok(AppState {
            model: self.model.clone(),
            prompts: PromptTemplates,
            pipeline: Arc::new(pipeline),
            limiter,
            auth,
            settings: Arc::new(self.settings.clone()),
        })
    }

    fn build_auth_state(&self) -> Result<AuthState, GatewayError> {
        let auth = &self.settings.auth;
        let secret = auth
            .session_secret
            .as_deref()
            .ok_or_else(|| GatewayError::InvalidAuthConfig("session_secret is required".into()))?;
        let ttl = i64::try_from(auth.session_ttl_secs)
            .map_err(|_| GatewayError::InvalidAuthConfig("session_ttl_secs is too large".into()))?;

        let identity = auth
            .identity
            .as_ref()
            .map(IdentityVerifier::from_settings)
            .transpose()?;

        Ok(AuthState {
            sessions: Arc::new(SessionSigner::new(secret, chrono::Duration::seconds(ttl))),
            otp: OtpStore::new(
                Duration::from_secs(auth.otp_ttl_secs),
                auth.otp_length,
                auth.dev_mode,
                auth.otp_max_attempts,
            ),
            otp_sender: self.otp_sender.clone(),
            identity,
        })
    }

    /// Build the axum [`Router`] for the configured policy.
    ///
    /// Call [`start()`](Self::start) to bind and serve.
    pub fn build_app(&self) -> Result<Router, ServerError> {
        let state = self.build_state()?;
        Ok(Self::router(state, &self.settings))
    }

    fn router(state: AppState, settings: &GatewaySettings) -> Router {
        let gate = from_fn_with_state(state.clone(), access_control);

        let mut gated = exam_router();
        let mut open = health_router();
        if settings.policy == AccessPolicy::Authenticated {
            gated = gated.merge(account_router());
            open = open.merge(credential_router());
        }

        Router::new()
            .merge(gated.route_layer(gate))
            .merge(open)
            .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
            .layer(cors_layer(&settings.cors_origins))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind to `{host}:{port}` and serve until Ctrl-C.
    pub async fn start(self) -> Result<(), ServerError> {
        let state = self.build_state()?;
        spawn_housekeeping(&state);
        let app = Self::router(state, &self.settings);

        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        info!(addr = %addr, policy = self.settings.policy.as_str(), "StudyAgora gateway starting");
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        info!("StudyAgora gateway stopped");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Any origin when `origins` is empty; otherwise the listed origins with
/// credentials allowed (needed for the session cookie).
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o.trim()) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Periodically evict elapsed rate-limit windows and expired passcodes.
fn spawn_housekeeping(state: &AppState) {
    let interval_secs = state.settings.rate_limit.gc_interval_secs.max(1);
    let limiter = state.limiter.clone();
    let auth = state.auth.clone();
    if limiter.is_none() && auth.is_none() {
        return;
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            if let Some(rl) = &limiter {
                rl.gc();
            }
            if let Some(auth) = &auth {
                auth.otp.purge_expired();
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
