//! Configuration for statement extraction.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share the config across handlers and to diff two
//! deployment profiles to understand why their outputs differ.
//!
//! The two backend slots hold `Arc<dyn …>` trait objects constructed once
//! at process start and injected here — never ambient singletons — so tests
//! substitute fakes by building a config, nothing more.

use std::fmt;
use std::sync::Arc;

use crate::backend::{CompletionBackend, DocumentAnalyzer};
use crate::error::ExtractError;

/// Configuration for one extraction pipeline.
///
/// Built via [`ExtractionConfig::builder()`] or
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use stmt2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.2)
///     .sanitize(false)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Completion model identifier. Default: "gpt-4o".
    pub model: String,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Extraction is transcription, not composition; near-zero keeps the
    /// model faithful to the statement text.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4000.
    ///
    /// A dense multi-page statement easily produces hundreds of
    /// transaction objects; a small budget truncates the JSON mid-object
    /// and the whole response is lost to recovery.
    pub max_output_tokens: u32,

    /// Run the character allow-list sanitizer over the combined text before
    /// prompting. Default: true. Profiles handling clean digital-text
    /// statements turn this off.
    pub sanitize: bool,

    /// Maximum files accepted per batch. Default: 12.
    pub max_files: usize,

    /// Document-analysis (OCR) backend. `None` means the collaborator is
    /// unavailable and PDF/image files fall back to direct text decoding.
    pub analyzer: Option<Arc<dyn DocumentAnalyzer>>,

    /// Completion backend. When `None` the orchestrator builds one from the
    /// environment per call (`OPENAI_API_KEY`).
    pub completion: Option<Arc<dyn CompletionBackend>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.2,
            max_output_tokens: 4000,
            sanitize: true,
            max_files: 12,
            analyzer: None,
            completion: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("sanitize", &self.sanitize)
            .field("max_files", &self.max_files)
            .field("analyzer", &self.analyzer.as_ref().map(|_| "<dyn DocumentAnalyzer>"))
            .field("completion", &self.completion.as_ref().map(|_| "<dyn CompletionBackend>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn sanitize(mut self, v: bool) -> Self {
        self.config.sanitize = v;
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.max_files = n.max(1);
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn DocumentAnalyzer>) -> Self {
        self.config.analyzer = Some(analyzer);
        self
    }

    pub fn completion(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.completion = Some(backend);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_output_tokens == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_files == 0 {
            return Err(ExtractError::InvalidConfig("max_files must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
