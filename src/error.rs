//! Error types for the stmt2json library.
//!
//! Everything the pipeline can fail with is collected in [`ExtractError`].
//! Two properties matter to callers:
//!
//! * The HTTP layer needs to tell user mistakes (empty or oversized batch,
//!   → 400) apart from backend/service faults (→ 500); that split is
//!   [`ExtractError::is_user_error`], not a second error type.
//!
//! * A model that produced unparseable output is not the same failure as a
//!   model that could not be reached. [`ExtractError::MalformedOutput`]
//!   therefore carries the raw response text so an operator can inspect
//!   what the model actually said.
//!
//! OCR failures deliberately do NOT abort the batch: per-file analysis
//! trouble is salvaged by falling back to a direct text decode (see
//! [`crate::pipeline::extract`]).

use thiserror::Error;

/// All errors returned by the stmt2json library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The request carried no files at all.
    #[error("No files uploaded.")]
    NoFilesProvided,

    /// The request carried more files than the configured batch cap.
    #[error("Too many files: got {count}, maximum is {max}")]
    TooManyFiles { count: usize, max: usize },

    /// A spooled upload could not be read back from disk.
    #[error("Failed to read uploaded file '{file}': {reason}")]
    ExtractionFailed { file: String, reason: String },

    // ── Completion backend errors ─────────────────────────────────────────
    /// No completion backend was injected and none could be built from the
    /// environment.
    #[error("No completion backend configured.\n{hint}")]
    CompletionNotConfigured { hint: String },

    /// The completion endpoint returned an error or could not be reached.
    #[error("Completion backend error: {detail}")]
    CompletionFailed { detail: String },

    // ── OCR backend errors ────────────────────────────────────────────────
    /// The document-analysis backend rejected the request or the analysis
    /// job terminated in a failed state. Surfaced to the extractor, which
    /// degrades to a direct text decode.
    #[error("Document analysis failed: {detail}")]
    AnalysisFailed { detail: String },

    // ── Model output errors ───────────────────────────────────────────────
    /// The model response contained no recoverable JSON object.
    ///
    /// `raw` is the unmodified response text, attached for operator
    /// diagnosis and echoed in the failure envelope.
    #[error("Model output is not valid JSON: {detail}")]
    MalformedOutput { detail: String, raw: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// `true` when the failure is the caller's fault (HTTP 400 territory),
    /// `false` for service-side faults (HTTP 500 territory).
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ExtractError::NoFilesProvided | ExtractError::TooManyFiles { .. }
        )
    }

    /// The raw model output attached to a [`ExtractError::MalformedOutput`],
    /// if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractError::MalformedOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
