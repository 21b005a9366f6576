//! # stmt2json
//!
//! Extract structured transaction data from uploaded financial-statement
//! documents (PDF, image, or plain text) using an OCR backend and an LLM
//! completion endpoint.
//!
//! ## Why this crate?
//!
//! Bank statements arrive as scans, photos, exports, and pastes — and no
//! two banks agree on a layout. Template-based parsers break on every new
//! institution. Instead this crate extracts the raw text (via a
//! document-analysis service for scanned material, direct decoding for
//! text), hands it to an LLM with a fixed extraction prompt, and
//! defensively recovers a well-formed JSON record from whatever the model
//! sends back — including responses wrapped in prose or missing their
//! closing brace.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Extract    OCR backend for PDFs/images (poll-until-done),
//!  │                UTF-8 decode for text, decode salvage on OCR failure
//!  ├─ 2. Normalize  flatten OCR result shapes to one plain-text string
//!  ├─ 3. Sanitize   optional allow-list filter for OCR noise glyphs
//!  ├─ 4. Prompt     fixed template + combined text
//!  ├─ 5. Complete   single low-temperature LLM call, bounded output
//!  └─ 6. Recover    pull one JSON object out of the free-form response
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stmt2json::{process, AzureDocumentClient, DocumentAnalyzer, ExtractionConfig, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // OPENAI_API_KEY from the environment; AZURE_ENDPOINT/AZURE_KEY
//!     // optional — without them PDFs degrade to a direct text decode.
//!     let mut builder = ExtractionConfig::builder();
//!     if let Some(client) = AzureDocumentClient::from_env() {
//!         builder = builder.analyzer(Arc::new(client) as Arc<dyn DocumentAnalyzer>);
//!     }
//!     let config = builder.build()?;
//!
//!     let files = vec![UploadedFile::new("/tmp/upload-0", "january.pdf", 48_213)];
//!     let envelope = process(files, &config).await;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | Enables the `stmt2json` HTTP server binary (axum + clap + tower-http) |
//!
//! Disable `server` when using only the library:
//! ```toml
//! stmt2json = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod record;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    AzureDocumentClient, Completion, CompletionBackend, CompletionOptions, DocumentAnalyzer,
    OpenAiChat,
};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::ExtractError;
pub use process::{extract_statement, process};
pub use record::{ResponseEnvelope, StatementMetadata, StatementRecord, Transaction};
pub use upload::UploadedFile;
