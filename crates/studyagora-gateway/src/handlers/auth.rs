//! Credential and account endpoints (authenticated policy only)
//!
//! POST /auth/send-otp      - issue a passcode for a phone number
//! POST /auth/verify-otp    - exchange the passcode for a session
//! POST /auth/verify-token  - exchange a trusted identity token for a session
//! GET  /me, /auth/me       - the signed-in principal
//! POST /auth/logout        - clear the session cookie

use axum::{
    Extension, Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use studyagora_kernel::auth::{Principal, Role};
use tracing::info;

use super::ApiJson;
use crate::credentials::session::{clear_session_cookie, session_cookie};
use crate::credentials::IssuedSession;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    /// Echoed only in dev mode with echo enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub user: Principal,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Principal,
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("Missing required fields: {field}")))
}

/// Digits with an optional leading `+`, 7 to 15 digits long.
fn normalize_phone(raw: &str) -> ApiResult<String> {
    let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    if (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(ApiError::Validation("phone must be 7 to 15 digits".into()))
    }
}

/// Session response carrying the credential both as cookie and in the body.
fn session_response(
    state: &AppState,
    ttl: chrono::Duration,
    issued: IssuedSession,
) -> impl IntoResponse + use<> {
    let auth = &state.settings.auth;
    let cookie = session_cookie(&auth.cookie_name, &issued.token, ttl, auth.cookie_secure);
    (
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            success: true,
            user: issued.principal,
            token: issued.token,
        }),
    )
}

/// POST /auth/send-otp
pub async fn send_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SendOtpRequest>,
) -> ApiResult<Json<SendOtpResponse>> {
    let phone = normalize_phone(&required(req.phone, "phone")?)?;
    let auth = state.auth()?;

    let code = auth.otp.issue(&phone);
    auth.otp_sender.send(&phone, &code).await?;
    info!(phone = %phone, "passcode sent");

    let echo = auth.otp.is_dev_mode() && state.settings.auth.echo_dev_otp;
    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent".into(),
        otp: echo.then_some(code),
    }))
}

/// POST /auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyOtpRequest>,
) -> ApiResult<impl IntoResponse> {
    let phone = normalize_phone(&required(req.phone, "phone")?)?;
    let otp = required(req.otp, "otp")?;
    let auth = state.auth()?;

    auth.otp.verify(&phone, &otp)?;
    let issued = auth.sessions.issue(
        &phone,
        Some(phone.clone()),
        Role::Student,
        &state.settings.auth.default_plan,
    )?;
    info!(principal = %issued.principal.id, "session issued via passcode");

    Ok(session_response(&state, auth.sessions.ttl(), issued))
}

/// POST /auth/verify-token
pub async fn verify_token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let token = required(req.token, "token")?;
    let auth = state.auth()?;
    let verifier = auth
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::Unauthenticated("identity tokens are not accepted".into()))?;

    let claims = verifier.verify(&token)?;
    let plan = claims
        .plan
        .unwrap_or_else(|| state.settings.auth.default_plan.clone());
    let issued = auth.sessions.issue(
        &claims.sub,
        claims.phone_number,
        claims.role.unwrap_or_default(),
        &plan,
    )?;
    info!(principal = %issued.principal.id, issuer = %claims.iss, "session issued via identity token");

    Ok(session_response(&state, auth.sessions.ttl(), issued))
}

/// GET /me
pub async fn me(Extension(principal): Extension<Principal>) -> Json<MeResponse> {
    Json(MeResponse { user: principal })
}

/// POST /auth/logout
///
/// Clears the cookie only; the token itself stays valid until it expires.
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> impl IntoResponse {
    info!(principal = %principal.id, "logged out");
    let auth = &state.settings.auth;
    (
        [(
            header::SET_COOKIE,
            clear_session_cookie(&auth.cookie_name, auth.cookie_secure),
        )],
        Json(serde_json::json!({ "success": true })),
    )
}

/// Routes that mint credentials. Not gated.
pub fn credential_router() -> axum::Router<AppState> {
    use axum::routing::post;
    axum::Router::new()
        .route("/auth/send-otp", post(send_otp))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/verify-token", post(verify_token))
}

/// Routes that require a session. Gated by the access-control layer.
pub fn account_router() -> axum::Router<AppState> {
    use axum::routing::{get, post};
    axum::Router::new()
        .route("/me", get(me))
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}
