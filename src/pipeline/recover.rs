//! Response recovery: pull one JSON object out of free-form model output.
//!
//! Models prepend and append prose despite the prompt's raw-JSON-only
//! directive ("Sure! Here is the extraction: { … } Let me know…"). The
//! compatibility-default heuristic slices from the first `{` to the last
//! `}` inclusive and parses that. It is knowingly fragile — a stray `}`
//! inside trailing prose widens the slice past the object — so when the
//! slice fails to parse, a second pass walks the text with a balanced-brace
//! scan that respects string literals and escapes, and retries on the first
//! complete object it finds. The second pass only runs when the first
//! failed, so inputs the slice already handled keep their behavior.
//!
//! Truncated JSON (an unclosed object) fails both passes and surfaces as
//! [`ExtractError::MalformedOutput`] with the raw text attached; there is
//! no automatic re-prompt.

use crate::error::ExtractError;
use crate::record::StatementRecord;

/// Recover a [`StatementRecord`] from raw model output.
///
/// Fails with [`ExtractError::MalformedOutput`] when no parseable object
/// can be found — including when the text contains no `{` at all.
pub fn recover(raw: &str) -> Result<StatementRecord, ExtractError> {
    let candidate = slice_outer_braces(raw).ok_or_else(|| ExtractError::MalformedOutput {
        detail: "no JSON object found in model output".to_string(),
        raw: raw.to_string(),
    })?;

    let first_err = match serde_json::from_str::<StatementRecord>(candidate) {
        Ok(record) => return Ok(record),
        Err(e) => e,
    };

    // Rescue pass: balanced scan, tolerant of JSON-ish trailing prose.
    if let Some(candidate) = scan_balanced_object(raw) {
        if let Ok(record) = serde_json::from_str::<StatementRecord>(candidate) {
            return Ok(record);
        }
    }

    Err(ExtractError::MalformedOutput {
        detail: first_err.to_string(),
        raw: raw.to_string(),
    })
}

/// First `{` to last `}`, inclusive. `None` when either brace is missing or
/// the last `}` precedes the first `{`.
fn slice_outer_braces(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let end = input.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&input[start..=end])
}

/// First complete top-level object, found by brace counting that skips
/// string literals and backslash escapes. `None` when braces never balance.
fn scan_balanced_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in input[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..=start + idx]);
                }
            }
            _ => {}
        }
    }
    None
}
