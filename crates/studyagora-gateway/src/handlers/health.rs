//! Liveness endpoints
//!
//! GET /        - plaintext banner
//! GET /health  - liveness probe with the active access policy

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

const BANNER: &str = "StudyAgora Backend Running 🚀";

/// GET / - plaintext banner
pub async fn root() -> &'static str {
    BANNER
}

/// GET /health - liveness probe
///
/// Always returns 200 OK while the process is alive.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "policy": state.settings.policy.as_str(),
    }))
}

/// Build the health router sub-tree
pub fn health_router() -> axum::Router<AppState> {
    use axum::routing::get;
    axum::Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}
