//! The pipeline orchestrator: batch of files in, envelope out.
//!
//! Sequencing is deliberately simple. Files are few (the batch is capped)
//! and their order matters — the combined text is concatenated in upload
//! order and fed to a single completion call — so extraction runs
//! sequentially per file rather than concurrently. Each file's temp copy is
//! deleted as soon as its text is in hand, extraction outcome
//! notwithstanding.
//!
//! Nothing here is shared across requests: every call owns its own state,
//! and concurrent requests need no locks.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::{Completion, CompletionBackend, CompletionOptions, OpenAiChat};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::pipeline::{extract, recover, sanitize};
use crate::prompts::build_prompt;
use crate::record::{ResponseEnvelope, StatementRecord};
use crate::upload::UploadedFile;

/// Run the full pipeline and wrap the outcome in a [`ResponseEnvelope`].
///
/// Success → `{success: true, result}`; malformed model output →
/// `{success: false, error, raw}`; any other failure →
/// `{success: false, error}`. Never panics on bad model output.
pub async fn process(files: Vec<UploadedFile>, config: &ExtractionConfig) -> ResponseEnvelope {
    match extract_statement(files, config).await {
        Ok(record) => ResponseEnvelope::success(record),
        Err(e) => {
            warn!("extraction pipeline failed: {}", e);
            ResponseEnvelope::failure(&e)
        }
    }
}

/// Run the full pipeline, returning the recovered record or a structured
/// error.
///
/// # Errors
/// - [`ExtractError::NoFilesProvided`] / [`ExtractError::TooManyFiles`]
///   before any file or network I/O
/// - [`ExtractError::CompletionNotConfigured`] when no backend is injected
///   and none can be built from the environment
/// - [`ExtractError::CompletionFailed`] on transport/API faults
/// - [`ExtractError::MalformedOutput`] when no JSON object can be recovered
pub async fn extract_statement(
    files: Vec<UploadedFile>,
    config: &ExtractionConfig,
) -> Result<StatementRecord, ExtractError> {
    // ── Step 1: Guard the batch ──────────────────────────────────────────
    if files.is_empty() {
        return Err(ExtractError::NoFilesProvided);
    }
    if files.len() > config.max_files {
        return Err(ExtractError::TooManyFiles {
            count: files.len(),
            max: config.max_files,
        });
    }
    info!("processing batch of {} file(s)", files.len());

    // ── Step 2: Extract text per file, upload order ──────────────────────
    let mut texts: Vec<String> = Vec::with_capacity(files.len());
    for file in &files {
        let bytes = match file.read().await {
            Ok(bytes) => bytes,
            Err(e) => {
                // The spooled copy is unreadable; nothing to salvage from.
                remove_all(&files[texts.len()..]).await;
                return Err(ExtractError::ExtractionFailed {
                    file: file.original_name().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let extracted =
            extract::extract_text(config.analyzer.as_ref(), &bytes, file.original_name()).await;
        if let extract::ExtractedText::Degraded { reason, .. } = &extracted {
            warn!(
                "'{}': degraded extraction ({})",
                file.original_name(),
                reason
            );
        }
        texts.push(extracted.into_text());

        file.remove().await;
    }

    // ── Step 3: Combine and optionally sanitize ──────────────────────────
    let mut combined = texts.join("\n\n");
    if config.sanitize {
        let before = combined.len();
        combined = sanitize::sanitize(&combined);
        debug!("sanitized combined text: {} → {} chars", before, combined.len());
    }

    // ── Step 4: Prompt and single completion call ────────────────────────
    let prompt = build_prompt(&combined);
    let backend = resolve_completion(config)?;
    let options = CompletionOptions {
        model: config.model.clone(),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
    };

    let completion = backend.complete(&prompt, &options).await?;
    if completion.finish_reason.as_deref() == Some("length") {
        warn!(
            "completion hit the output-token budget ({}); JSON may be truncated",
            config.max_output_tokens
        );
    }

    // ── Step 5: Recover the structured record ────────────────────────────
    recover_record(completion)
}

/// Resolve the completion backend: injected instance first, then the
/// environment. Mirrors the analyzer side, where `None` is a legal
/// "collaborator unavailable" state — but a missing completion backend is
/// fatal, since there is no fallback that produces a record.
fn resolve_completion(
    config: &ExtractionConfig,
) -> Result<Arc<dyn CompletionBackend>, ExtractError> {
    if let Some(ref backend) = config.completion {
        return Ok(Arc::clone(backend));
    }

    OpenAiChat::from_env()
        .map(|client| Arc::new(client) as Arc<dyn CompletionBackend>)
        .ok_or_else(|| ExtractError::CompletionNotConfigured {
            hint: "Set OPENAI_API_KEY, or inject a backend via \
                   ExtractionConfig::builder().completion(…)."
                .to_string(),
        })
}

/// Prefer backend-native structured output; otherwise run text recovery.
fn recover_record(completion: Completion) -> Result<StatementRecord, ExtractError> {
    if let Some(value) = completion.structured {
        return serde_json::from_value(value.clone()).map_err(|e| ExtractError::MalformedOutput {
            detail: format!("structured output does not match the record shape: {e}"),
            raw: value.to_string(),
        });
    }
    recover::recover(&completion.content)
}

/// Best-effort cleanup of files whose text was never extracted.
async fn remove_all(files: &[UploadedFile]) {
    for file in files {
        file.remove().await;
    }
}
