//! Shared application state for the HTTP server

use crate::credentials::{IdentityVerifier, OtpSender, OtpStore, SessionSigner};
use crate::error::{ApiError, ApiResult};
use crate::filter::FilterPipeline;
use crate::middleware::RateLimiter;
use crate::prompt::PromptTemplates;
use std::sync::Arc;
use studyagora_kernel::gateway::GatewaySettings;
use studyagora_kernel::model::ModelClient;

/// State shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream model used by the exam routes
    pub model: Arc<dyn ModelClient>,
    pub prompts: PromptTemplates,
    /// Access-control pipeline assembled from the configured policy
    pub pipeline: Arc<FilterPipeline>,
    /// Present under the rate-limited policy
    pub limiter: Option<Arc<RateLimiter>>,
    /// Present under the authenticated policy
    pub auth: Option<Arc<AuthState>>,
    pub settings: Arc<GatewaySettings>,
}

/// Credential machinery for the authenticated policy.
pub struct AuthState {
    pub sessions: Arc<SessionSigner>,
    pub otp: OtpStore,
    pub otp_sender: Arc<dyn OtpSender>,
    /// Configured only when a trusted identity issuer is set up.
    pub identity: Option<IdentityVerifier>,
}

impl AppState {
    pub fn auth(&self) -> ApiResult<&AuthState> {
        self.auth
            .as_deref()
            .ok_or_else(|| ApiError::Internal("auth routes used without auth state".into()))
    }
}
