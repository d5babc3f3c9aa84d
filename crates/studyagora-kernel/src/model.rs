//! Upstream model contract.
//!
//! A [`ModelClient`] takes a rendered prompt plus generation options and
//! returns the raw text produced by the model. Implementations must treat
//! the upstream envelope as untrusted: every nested field is checked before
//! use, and failures are reported through [`ModelError`] instead of panics.
//!
//! ```text
//! prompt ──► ModelClient::invoke ──► envelope decode ──► content: String
//!                 │                        │
//!                 ▼                        ▼
//!          ModelError::Transport     ModelError::Shape
//! ```
//!
//! Callers that need machine-readable output run a second validation stage
//! on the returned text (see [`crate::exam::EvaluationReport::from_model_text`]),
//! which fails with [`ModelError::ContentParse`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// Sampling options applied to a single upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl GenerationOptions {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::new(1000, 0.4)
    }
}

/// A single prompt-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Fully rendered prompt, sent as the only user-role message.
    pub prompt: String,
    /// Sampling options.
    pub options: GenerationOptions,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure modes of an upstream model call.
///
/// None of these are retried by the client itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// Network failure, or the upstream answered with a non-success status.
    /// `body` holds the raw upstream payload (or the transport error text)
    /// for diagnostics; it must not be echoed back to API callers.
    #[error("upstream transport failure (status {status:?}): {body}")]
    Transport { status: Option<u16>, body: String },

    /// The envelope lacks a usable result: no candidates, a candidate with
    /// no message content, or a body that is not an envelope at all.
    #[error("upstream response has an unexpected shape: {0}")]
    Shape(String),

    /// The returned text could not be decoded as the structured shape the
    /// caller asked for.
    #[error("upstream content is not in the expected format: {0}")]
    ContentParse(String),
}

impl ModelError {
    /// Short stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::Transport { .. } => "transport",
            ModelError::Shape(_) => "shape",
            ModelError::ContentParse(_) => "content_parse",
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

// ─────────────────────────────────────────────────────────────────────────────
// ModelClient trait
// ─────────────────────────────────────────────────────────────────────────────

/// Kernel contract for the upstream text-generation service.
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// by every request handler.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier of the backing model (used in logs).
    fn model_id(&self) -> &str;

    /// Send `request` upstream and return the first candidate's text.
    async fn invoke(&self, request: ModelRequest) -> ModelResult<String>;
}
