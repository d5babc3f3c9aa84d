//! `studyagora-gateway` — StudyAgora exam-evaluation gateway runtime.
//!
//! This crate provides the concrete implementations of the contracts
//! defined in `studyagora-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`ModelClient`](studyagora_kernel::model::ModelClient) | [`backend::OpenAiChatBackend`] |
//! | [`GatewayFilter`](studyagora_kernel::gateway::GatewayFilter) | [`filter::SessionAuthFilter`], [`filter::FixedWindowRateLimitFilter`], [`filter::LoggingFilter`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service whose gate is chosen by the configured
//! [`AccessPolicy`](studyagora_kernel::gateway::AccessPolicy).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use studyagora_gateway::backend::OpenAiChatBackend;
//! use studyagora_gateway::server::GatewayServer;
//! use studyagora_kernel::gateway::GatewaySettings;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = GatewaySettings::default();
//!     let backend = OpenAiChatBackend::new(&settings.upstream)?;
//!     GatewayServer::new(settings, Arc::new(backend)).start().await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod prompt;
pub mod server;
pub mod settings;
pub mod state;

// Re-export the kernel gateway types for convenience.
pub use studyagora_kernel::gateway;
