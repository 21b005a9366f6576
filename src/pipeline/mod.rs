//! Pipeline stages for statement extraction.
//!
//! Each submodule implements exactly one transformation step, independently
//! testable without a network.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ normalize ──▶ sanitize ──▶ (prompt + completion) ──▶ recover
//! (OCR/decode) (flatten)    (optional)                             (JSON)
//! ```
//!
//! 1. [`extract`]   — per-file strategy selection: OCR backend for PDFs and
//!    images, direct UTF-8 decode otherwise, with decode salvage on OCR
//!    failure
//! 2. [`normalize`] — flatten the backend's result shapes (aggregate
//!    content, paragraphs, or page lines) to one plain-text string
//! 3. [`sanitize`]  — optional allow-list character filter for OCR noise
//! 4. [`recover`]   — pull a structured record out of free-form model
//!    output
//!
//! Prompt construction lives in [`crate::prompts`]; the orchestrator that
//! sequences these stages over a batch is [`crate::process`].

pub mod extract;
pub mod normalize;
pub mod recover;
pub mod sanitize;
