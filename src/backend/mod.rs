//! External service seams: document analysis (OCR) and chat completion.
//!
//! Both collaborators are consumed through object-safe async traits so the
//! pipeline can be driven by fakes in tests and by the real HTTP clients in
//! production. The orchestrator only ever sees `Arc<dyn …>`; which concrete
//! client backs it is a configuration decision made at process start.

pub mod azure;
pub mod openai;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ExtractError;
use crate::pipeline::normalize::OcrAnalysis;

pub use azure::AzureDocumentClient;
pub use openai::OpenAiChat;

/// A document-analysis (OCR) service.
///
/// `analyze` submits the document and blocks until the backend's analysis
/// job reaches a terminal state — implementations own the poll-until-done
/// loop. No client-side deadline is imposed beyond the backend's.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, bytes: &[u8], content_type: &str)
        -> Result<OcrAnalysis, ExtractError>;
}

/// A chat-completion service: one prompt in, one free-form response out.
/// No streaming, no function calling.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<Completion, ExtractError>;
}

/// Per-call completion parameters, filled in from
/// [`crate::config::ExtractionConfig`].
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Model identifier, e.g. `"gpt-4o"`.
    pub model: String,
    /// Sampling temperature. Extraction wants determinism: default 0.2.
    pub temperature: f32,
    /// Output token budget. Too small silently truncates mid-JSON, so the
    /// default is generous (4000).
    pub max_output_tokens: u32,
}

/// A completion backend's response.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    /// The raw response text.
    pub content: String,
    /// Backend-reported stop reason; `"length"` signals truncation.
    pub finish_reason: Option<String>,
    /// Populated by backends running in native structured-output mode;
    /// when present the orchestrator skips text recovery and uses the
    /// value directly.
    pub structured: Option<Value>,
}
