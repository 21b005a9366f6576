//! Text extraction: pick a strategy per file and always come back with text.
//!
//! Two paths exist. Files whose extension marks them as scanned material
//! (PDF and the common image formats) go to the document-analysis backend;
//! everything else is read as UTF-8 directly. The OCR path can fail — the
//! backend may be down, unconfigured, or reject the document — and the
//! policy is salvage, not abort: the same bytes are decoded as text
//! best-effort (garbage for true binary input, an accepted degradation).
//!
//! The outcome is a tagged [`ExtractedText`] rather than a bare string so
//! the degradation is visible to the orchestrator's logs instead of being
//! silently swallowed by a catch-and-fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::DocumentAnalyzer;
use crate::pipeline::normalize;

/// Extensions routed through the OCR backend (case-insensitive).
const OCR_EXTENSIONS: [&str; 7] = ["pdf", "jpg", "jpeg", "png", "tiff", "bmp", "gif"];

/// The result of extracting one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    /// Text obtained through the intended path.
    Clean(String),
    /// OCR was wanted but unavailable or failed; `text` is the raw-decode
    /// salvage and `reason` says why the intended path was skipped.
    Degraded { text: String, reason: String },
}

impl ExtractedText {
    /// The extracted text, however it was obtained.
    pub fn text(&self) -> &str {
        match self {
            ExtractedText::Clean(text) => text,
            ExtractedText::Degraded { text, .. } => text,
        }
    }

    /// Consume, keeping only the text.
    pub fn into_text(self) -> String {
        match self {
            ExtractedText::Clean(text) => text,
            ExtractedText::Degraded { text, .. } => text,
        }
    }
}

/// Whether a filename's extension marks it for the OCR path.
pub fn is_ocr_eligible(filename: &str) -> bool {
    extension_of(filename)
        .map(|ext| OCR_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// MIME type sent to the OCR backend, inferred from the extension.
///
/// Only meaningful for OCR-eligible names; anything unrecognised maps to
/// `application/octet-stream`.
pub fn content_type_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("tiff") => "image/tiff",
        Some("bmp") => "image/bmp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Best-effort text decode of raw bytes. Lossy on invalid UTF-8; exact for
/// valid UTF-8 input.
fn decode_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Extract plain text from one file's bytes.
///
/// Does not mutate the source; the only I/O is the analyzer's network
/// calls, which block this step until the backend's analysis job reaches a
/// terminal state (the analyzer polls internally, no client-side deadline).
pub async fn extract_text(
    analyzer: Option<&Arc<dyn DocumentAnalyzer>>,
    bytes: &[u8],
    original_name: &str,
) -> ExtractedText {
    if !is_ocr_eligible(original_name) {
        debug!("'{}': direct text decode", original_name);
        return ExtractedText::Clean(decode_utf8(bytes));
    }

    let Some(analyzer) = analyzer else {
        warn!(
            "'{}': OCR-eligible but no OCR backend configured, decoding as text",
            original_name
        );
        return ExtractedText::Degraded {
            text: decode_utf8(bytes),
            reason: "no OCR backend configured".to_string(),
        };
    };

    let content_type = content_type_for(original_name);
    match analyzer.analyze(bytes, content_type).await {
        Ok(analysis) => {
            let text = normalize::normalize(&analysis);
            debug!(
                "'{}': OCR analysis produced {} chars",
                original_name,
                text.len()
            );
            ExtractedText::Clean(text)
        }
        Err(e) => {
            warn!(
                "'{}': OCR analysis failed ({}), decoding as text",
                original_name, e
            );
            ExtractedText::Degraded {
                text: decode_utf8(bytes),
                reason: e.to_string(),
            }
        }
    }
}
