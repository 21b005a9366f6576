//! Result normalization: flatten heterogeneous OCR analysis shapes to text.
//!
//! The document-analysis backend has returned three incompatible result
//! shapes across model versions: a single aggregate `content` string, a
//! `paragraphs` list, or a `pages` list each carrying `lines`. Rather than
//! branch on backend version markers, [`OcrAnalysis`] carries all three as
//! optional fields and [`normalize`] picks the first non-empty one with a
//! fixed precedence:
//!
//! ```text
//! content  →  paragraphs  →  pages/lines
//! ```
//!
//! Missing or empty fields at any level contribute nothing — a sparse
//! result degrades to a shorter string, never to an error.

use serde::Deserialize;

/// The analysis result as returned by the OCR backend.
///
/// Deserialized straight from the backend's `analyzeResult` payload; only
/// the fields the normalizer consumes are modelled, everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrAnalysis {
    /// Aggregate full-document content (newer layout models).
    pub content: Option<String>,
    /// Paragraph list, document order.
    pub paragraphs: Option<Vec<OcrParagraph>>,
    /// Per-page line lists (older read models).
    pub pages: Option<Vec<OcrPage>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrParagraph {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPage {
    pub lines: Option<Vec<OcrLine>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrLine {
    pub content: Option<String>,
}

/// Flatten an analysis result into one plain-text string.
///
/// First non-empty of: aggregate content, paragraphs joined by newline in
/// document order, page lines joined by newline in page then line order.
/// Returns an empty string when every shape is absent or empty.
pub fn normalize(analysis: &OcrAnalysis) -> String {
    if let Some(content) = &analysis.content {
        if !content.is_empty() {
            return content.clone();
        }
    }

    if let Some(paragraphs) = &analysis.paragraphs {
        let text = paragraphs
            .iter()
            .filter_map(|p| p.content.as_deref())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            return text;
        }
    }

    if let Some(pages) = &analysis.pages {
        let text = pages
            .iter()
            .flat_map(|page| page.lines.iter().flatten())
            .filter_map(|line| line.content.as_deref())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            return text;
        }
    }

    String::new()
}
