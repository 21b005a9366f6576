//! OpenAI-compatible chat-completion client.
//!
//! Speaks the `/chat/completions` dialect, which every endpoint we care
//! about (OpenAI itself, Azure OpenAI gateways, vLLM, LiteLLM) accepts.
//! One user message, one response, no streaming. Temperature and the
//! output-token budget come from the caller's [`CompletionOptions`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{Completion, CompletionBackend, CompletionOptions};
use crate::error::ExtractError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// HTTP client for an OpenAI-compatible chat-completion endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChat {
    /// Build a client against the public OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build a client from `OPENAI_API_KEY` (and optional
    /// `OPENAI_BASE_URL`). `None` when the key is unset or empty.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty())?;
        let mut client = Self::new(api_key);
        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            if !base.is_empty() {
                client = client.base_url(base);
            }
        }
        Some(client)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiChat {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ExtractError> {
        let request = ChatRequest {
            model: &options.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractError::CompletionFailed {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::CompletionFailed {
                detail: format!("HTTP {status}: {body}"),
            });
        }

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ExtractError::CompletionFailed {
                    detail: format!("invalid response body: {e}"),
                })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ExtractError::CompletionFailed {
                detail: "response contained no choices".to_string(),
            })?;

        debug!(
            "completion finished: {} chars, finish_reason={:?}",
            choice.message.content.len(),
            choice.finish_reason
        );

        Ok(Completion {
            content: choice.message.content,
            finish_reason: choice.finish_reason,
            structured: None,
        })
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}
