//! Settings loading for the binary.
//!
//! Layers, lowest to highest precedence:
//! 1. built-in defaults
//! 2. the file named by `STUDYAGORA_CONFIG` (format from its extension)
//! 3. `STUDYAGORA__*` environment variables (`__` separates nested keys,
//!    e.g. `STUDYAGORA__RATE_LIMIT__EVALUATE_LIMIT=10`)
//! 4. the plain `PORT`, `GROQ_API_KEY` and `JWT_SECRET` variables, when the
//!    corresponding setting is still unset

use studyagora_kernel::config::{ConfigResult, load_layered};
use studyagora_kernel::gateway::GatewaySettings;

pub const ENV_PREFIX: &str = "STUDYAGORA";
pub const CONFIG_PATH_VAR: &str = "STUDYAGORA_CONFIG";

const LIST_KEYS: &[&str] = &["cors_origins"];
const DEFAULT_PORT: u16 = 5000;

pub fn load_settings() -> ConfigResult<GatewaySettings> {
    let path = std::env::var(CONFIG_PATH_VAR).ok();
    let settings: GatewaySettings = load_layered(path.as_deref(), ENV_PREFIX, LIST_KEYS)?;
    Ok(apply_legacy_env(settings, |key| std::env::var(key).ok()))
}

/// Fill gaps from the well-known plain variables.
pub fn apply_legacy_env(
    mut settings: GatewaySettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> GatewaySettings {
    if settings.port == DEFAULT_PORT {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            settings.port = port;
        }
    }
    if settings.upstream.api_key.is_none() {
        settings.upstream.api_key = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty());
    }
    if settings.auth.session_secret.is_none() {
        settings.auth.session_secret = lookup("JWT_SECRET").filter(|s| !s.is_empty());
    }
    settings
}
