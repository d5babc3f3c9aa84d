//! StudyAgora gateway — entry point.
//!
//! Loads `.env`, installs logging, reads layered settings and starts the
//! axum-based HTTP gateway.
//!
//! # Environment variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `STUDYAGORA_CONFIG` | *(none)* | Path to a TOML/YAML/JSON settings file. |
//! | `STUDYAGORA__<KEY>` | *(none)* | Overrides any setting, e.g. `STUDYAGORA__POLICY=authenticated`. |
//! | `PORT` | `5000` | TCP port to listen on. |
//! | `GROQ_API_KEY` | *(none)* | Upstream API key. |
//! | `JWT_SECRET` | *(none)* | Session signing key (authenticated policy). |
//! | `RUST_LOG` | `studyagora_gateway=info` | Log filter. |
//! | `LOG_FORMAT` | `text` | `json` for structured log lines. |

use anyhow::Context;
use std::sync::Arc;
use studyagora_gateway::backend::OpenAiChatBackend;
use studyagora_gateway::server::GatewayServer;
use studyagora_gateway::settings::load_settings;
use studyagora_kernel::gateway::AccessPolicy;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("studyagora_gateway=info,tower_http=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = load_settings().context("failed to load settings")?;
    if settings.upstream.api_key.is_none() {
        warn!("no upstream API key configured (GROQ_API_KEY); upstream calls will be rejected");
    }
    if settings.policy == AccessPolicy::Authenticated && settings.auth.dev_mode {
        warn!("authenticated policy running in passcode dev mode. Do not use in production.");
    }

    info!(
        host = %settings.host,
        port = settings.port,
        policy = settings.policy.as_str(),
        model = %settings.upstream.model,
        upstream = %settings.upstream.base_url,
        "StudyAgora gateway configuration loaded"
    );

    let backend =
        OpenAiChatBackend::new(&settings.upstream).context("failed to build upstream client")?;
    GatewayServer::new(settings, Arc::new(backend))
        .start()
        .await
        .context("gateway server failed")?;
    Ok(())
}
