//! OpenAI-compatible chat-completions backend.
//!
//! [`OpenAiChatBackend`] sends a single user message to
//! `{base_url}/chat/completions` (Groq by default) and returns the text of
//! the first choice.
//!
//! The response envelope is decoded into structs whose every field is
//! optional, then checked explicitly, so a partial or surprising body
//! becomes a [`ModelError::Shape`] instead of a panic.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use studyagora_kernel::gateway::UpstreamSettings;
use studyagora_kernel::model::{ModelClient, ModelError, ModelRequest, ModelResult};
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Calls an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiChatBackend {
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiChatBackend {
    /// Build the backend with a client-level request timeout.
    pub fn new(settings: &UpstreamSettings) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            model: settings.model.clone(),
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim().trim_end_matches('/')
            ),
            api_key: settings.api_key.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelClient for OpenAiChatBackend {
    fn model_id(&self) -> &str {
        &self.model
    }

    #[instrument(
        skip(self, request),
        fields(model = %self.model, max_tokens = request.options.max_tokens)
    )]
    async fn invoke(&self, request: ModelRequest) -> ModelResult<String> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let start = std::time::Instant::now();
        let response = builder.send().await.map_err(|e| ModelError::Transport {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ModelError::Transport {
            status: Some(status.as_u16()),
            body: e.to_string(),
        })?;
        debug!(
            status = status.as_u16(),
            latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "upstream responded"
        );

        if !status.is_success() {
            return Err(ModelError::Transport {
                status: Some(status.as_u16()),
                body: text,
            });
        }

        extract_content(&text)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions body.
pub fn extract_content(body: &str) -> ModelResult<String> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| ModelError::Shape(format!("response is not a completion envelope: {e}")))?;

    let choice = envelope
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| ModelError::Shape("response has no choices".into()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| ModelError::Shape("first choice has no message content".into()))?;

    if content.trim().is_empty() {
        return Err(ModelError::Shape("first choice content is empty".into()));
    }
    Ok(content)
}
