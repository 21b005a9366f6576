//! Text sanitization: strip OCR noise glyphs before prompting.
//!
//! OCR output of scanned statements is littered with box-drawing runes,
//! currency look-alikes and stray symbols that inflate the prompt and
//! occasionally derail the model's own JSON formatting. This pass keeps
//! only the characters a statement legitimately contains: letters, digits,
//! whitespace and `. , $ # - _ /`.
//!
//! The pass is pure and idempotent, and it is a deployment toggle
//! ([`crate::config::ExtractionConfig::sanitize`]) — profiles feeding the
//! model clean digital-text statements skip it.

/// Characters outside the alphanumeric/whitespace classes that survive
/// sanitization. Everything covering amounts (`$ . ,`), dates (`/ -`),
/// check numbers (`#`) and identifiers (`_`).
const KEPT_PUNCTUATION: &str = ".,$#-_/";

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || KEPT_PUNCTUATION.contains(c)
}

/// Remove every character not in the allow-list.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|&c| is_allowed(c)).collect()
}
