//! Integration tests for the extraction pipeline.
//!
//! These drive `extract_statement` / `process` end to end with scripted
//! backend fakes — no network, no credentials. The fakes record what the
//! pipeline hands them, so tests can assert on the prompt that would have
//! gone over the wire, not just on the final record.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use stmt2json::pipeline::normalize::{OcrAnalysis, OcrParagraph};
use stmt2json::{
    extract_statement, process, Completion, CompletionBackend, CompletionOptions,
    DocumentAnalyzer, ExtractError, ExtractionConfig, StatementRecord, UploadedFile,
};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Completion backend that replays a canned response and records every
/// prompt it receives.
struct ScriptedCompletion {
    response: Completion,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    fn returning(content: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Completion {
                content: content.to_string(),
                ..Completion::default()
            },
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn with_response(response: Completion) -> Arc<Self> {
        Arc::new(Self {
            response,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("completion backend was never called")
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, ExtractError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Completion backend that must never be reached. Guards are supposed to
/// reject bad batches before any backend call.
struct UnreachableCompletion;

#[async_trait]
impl CompletionBackend for UnreachableCompletion {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, ExtractError> {
        panic!("completion backend called for a batch the guards should have rejected");
    }
}

/// Analyzer that replays canned paragraphs and counts calls.
struct ScriptedAnalyzer {
    paragraphs: Vec<&'static str>,
    calls: AtomicUsize,
    content_types: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    fn returning(paragraphs: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            paragraphs,
            calls: AtomicUsize::new(0),
            content_types: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DocumentAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        content_type: &str,
    ) -> Result<OcrAnalysis, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.content_types
            .lock()
            .unwrap()
            .push(content_type.to_string());
        Ok(OcrAnalysis {
            paragraphs: Some(
                self.paragraphs
                    .iter()
                    .map(|p| OcrParagraph {
                        content: Some(p.to_string()),
                    })
                    .collect(),
            ),
            ..OcrAnalysis::default()
        })
    }
}

/// Analyzer whose jobs always fail, to exercise degraded extraction.
struct BrokenAnalyzer;

#[async_trait]
impl DocumentAnalyzer for BrokenAnalyzer {
    async fn analyze(
        &self,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<OcrAnalysis, ExtractError> {
        Err(ExtractError::AnalysisFailed {
            detail: "service unavailable".to_string(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

async fn spool(dir: &Path, name: &str, contents: &str, index: usize) -> UploadedFile {
    UploadedFile::spool(contents.as_bytes(), name, dir, index)
        .await
        .expect("failed to spool test upload")
}

fn config_with(completion: Arc<dyn CompletionBackend>) -> ExtractionConfig {
    ExtractionConfig::builder()
        .completion(completion)
        .build()
        .expect("default test config must validate")
}

/// A well-formed model response matching the prompt's schema.
const GOOD_RESPONSE: &str = r#"{
  "metadata": {
    "ownerName": "Jane Doe",
    "bankName": "First National",
    "accountNumber": "1234567890",
    "statementDate": "2024-02-01",
    "dateRangeStartDate": "2024-01-01",
    "dateRangeEndDate": "2024-01-31",
    "totalAmountOfDepositsAsReported": 5000.00,
    "totalAmountOfWithdrawalsAsReported": 3200.50,
    "totalCountOfDepositsAsReported": 3,
    "totalCountOfWithdrawalsAsReported": 7
  },
  "transactions": [
    {
      "date": "2024-01-05",
      "description": "DIRECT DEPOSIT PAYROLL",
      "amount": 2500.00,
      "depositOrWithdrawal": "deposit",
      "transactionCategory": "income"
    },
    {
      "date": "2024-01-09",
      "description": "GROCERY MART #211",
      "amount": 84.17,
      "depositOrWithdrawal": "withdrawal",
      "transactionCategory": "groceries"
    }
  ]
}"#;

/// The canned response must itself match the wire shape the prompt asks
/// for — metadata nested under `"metadata"`, not at the top level — or
/// every test built on it silently asserts against empty defaults.
#[test]
fn good_response_fixture_deserializes_with_populated_metadata() {
    let record: StatementRecord = serde_json::from_str(GOOD_RESPONSE).unwrap();
    assert_eq!(record.metadata.owner_name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.transactions.len(), 2);
}

// ── Batch guards ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_batch_is_rejected_before_any_backend_call() {
    let config = config_with(Arc::new(UnreachableCompletion));
    let err = extract_statement(Vec::new(), &config).await.unwrap_err();
    assert!(matches!(err, ExtractError::NoFilesProvided));
    assert!(err.is_user_error());
}

#[tokio::test]
async fn oversized_batch_is_rejected_before_any_backend_call() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = Vec::new();
    for i in 0..13 {
        files.push(spool(dir.path(), &format!("s{i}.txt"), "x", i).await);
    }

    let config = config_with(Arc::new(UnreachableCompletion));
    let err = extract_statement(files, &config).await.unwrap_err();
    assert!(matches!(err, ExtractError::TooManyFiles { count: 13, max: 12 }));
    assert!(err.is_user_error());
}

#[tokio::test]
async fn empty_batch_maps_to_the_stock_error_message() {
    let config = config_with(Arc::new(UnreachableCompletion));
    let envelope = process(Vec::new(), &config).await;
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("No files uploaded."));
    assert!(envelope.result.is_none());
}

// ── Text assembly ────────────────────────────────────────────────────────────

#[tokio::test]
async fn plain_text_files_reach_the_prompt_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let body = "Opening balance 1000.00 on 2024-01-01";
    let files = vec![spool(dir.path(), "january.txt", body, 0).await];

    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = ExtractionConfig::builder()
        .completion(backend.clone())
        .sanitize(false)
        .build()
        .unwrap();

    extract_statement(files, &config).await.unwrap();
    let prompt = backend.last_prompt();
    assert!(
        prompt.contains(body),
        "prompt must embed the file text unchanged: {prompt}"
    );
}

#[tokio::test]
async fn files_are_joined_with_a_blank_line_in_upload_order() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        spool(dir.path(), "jan.txt", "january statement", 0).await,
        spool(dir.path(), "feb.txt", "february statement", 1).await,
    ];

    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = config_with(backend.clone());

    extract_statement(files, &config).await.unwrap();
    let prompt = backend.last_prompt();
    assert!(
        prompt.contains("january statement\n\nfebruary statement"),
        "files must appear in upload order separated by a blank line"
    );
}

#[tokio::test]
async fn sanitizer_strips_disallowed_punctuation_from_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "s.txt", "CAFÉ @MIDTOWN* $12.50 (card)", 0).await];

    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = config_with(backend.clone());

    extract_statement(files, &config).await.unwrap();
    let prompt = backend.last_prompt();
    assert!(prompt.contains("CAFÉ MIDTOWN $12.50 card"));
    assert!(!prompt.contains('@'));
    assert!(!prompt.contains('*'));
}

// ── OCR routing ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_uploads_are_routed_through_the_analyzer() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "scan.pdf", "%PDF-1.7 raw bytes", 0).await];

    let analyzer = ScriptedAnalyzer::returning(vec!["Deposit 2500.00", "Withdrawal 84.17"]);
    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = ExtractionConfig::builder()
        .analyzer(analyzer.clone())
        .completion(backend.clone())
        .build()
        .unwrap();

    extract_statement(files, &config).await.unwrap();

    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        analyzer.content_types.lock().unwrap().as_slice(),
        ["application/pdf"]
    );
    let prompt = backend.last_prompt();
    assert!(prompt.contains("Deposit 2500.00\nWithdrawal 84.17"));
    assert!(
        !prompt.contains("%PDF"),
        "raw bytes must not leak into the prompt when OCR succeeds"
    );
}

#[tokio::test]
async fn text_uploads_bypass_the_analyzer() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "plain.txt", "balance 10.00", 0).await];

    let analyzer = ScriptedAnalyzer::returning(vec!["should never appear"]);
    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = ExtractionConfig::builder()
        .analyzer(analyzer.clone())
        .completion(backend.clone())
        .build()
        .unwrap();

    extract_statement(files, &config).await.unwrap();
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn analyzer_failure_degrades_to_byte_decoding_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "scan.pdf", "legible fallback text", 0).await];

    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = ExtractionConfig::builder()
        .analyzer(Arc::new(BrokenAnalyzer))
        .completion(backend.clone())
        .build()
        .unwrap();

    let record = extract_statement(files, &config).await.unwrap();
    assert_eq!(record.metadata.owner_name.as_deref(), Some("Jane Doe"));
    assert!(backend.last_prompt().contains("legible fallback text"));
}

#[tokio::test]
async fn missing_analyzer_degrades_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "scan.pdf", "decoded as text", 0).await];

    let backend = ScriptedCompletion::returning(GOOD_RESPONSE);
    let config = config_with(backend.clone());

    extract_statement(files, &config).await.unwrap();
    assert!(backend.last_prompt().contains("decoded as text"));
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn well_formed_response_yields_the_full_record() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "jan.txt", "statement text", 0).await];

    let config = config_with(ScriptedCompletion::returning(GOOD_RESPONSE));
    let record = extract_statement(files, &config).await.unwrap();

    assert_eq!(record.metadata.owner_name.as_deref(), Some("Jane Doe"));
    assert_eq!(record.metadata.bank_name.as_deref(), Some("First National"));
    assert_eq!(record.metadata.account_number.as_deref(), Some("1234567890"));
    assert_eq!(record.transactions.len(), 2);
    assert_eq!(record.transactions[0].description, "DIRECT DEPOSIT PAYROLL");
    assert_eq!(record.transactions[0].deposit_or_withdrawal, "deposit");
    assert_eq!(record.transactions[1].amount, json!(84.17));
}

#[tokio::test]
async fn prose_wrapped_response_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "jan.txt", "statement text", 0).await];

    let wrapped = format!("Sure — here is the extracted data:\n\n{GOOD_RESPONSE}\n\nLet me know!");
    let config = config_with(ScriptedCompletion::returning(&wrapped));

    let record = extract_statement(files, &config).await.unwrap();
    assert_eq!(record.transactions.len(), 2);
}

#[tokio::test]
async fn truncated_response_reports_malformed_output_with_the_raw_text() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "jan.txt", "statement text", 0).await];

    let truncated = r#"{"ownerName": "Jane Doe", "transactions": [{"date": "2024-"#;
    let config = config_with(ScriptedCompletion::returning(truncated));

    let envelope = process(files, &config).await;
    assert!(!envelope.success);
    assert!(envelope.error.is_some());
    assert_eq!(envelope.raw.as_deref(), Some(truncated));
    assert!(envelope.result.is_none());
}

#[tokio::test]
async fn response_without_any_json_object_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "jan.txt", "statement text", 0).await];

    let config =
        config_with(ScriptedCompletion::returning("I could not read this statement."));
    let err = extract_statement(files, &config).await.unwrap_err();

    assert!(matches!(err, ExtractError::MalformedOutput { .. }));
    assert!(!err.is_user_error());
    assert_eq!(err.raw_output(), Some("I could not read this statement."));
}

#[tokio::test]
async fn structured_output_bypasses_text_recovery() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "jan.txt", "statement text", 0).await];

    // Content is deliberately garbage: structured output must win.
    let response = Completion {
        content: "not json at all".to_string(),
        structured: Some(json!({
            "metadata": { "ownerName": "Structured Owner" },
            "transactions": []
        })),
        ..Completion::default()
    };
    let config = config_with(ScriptedCompletion::with_response(response));

    let record = extract_statement(files, &config).await.unwrap();
    assert_eq!(
        record.metadata.owner_name.as_deref(),
        Some("Structured Owner")
    );
    assert!(record.transactions.is_empty());
}

// ── Cleanup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn spooled_files_are_removed_after_processing() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        spool(dir.path(), "a.txt", "one", 0).await,
        spool(dir.path(), "b.txt", "two", 1).await,
    ];
    let paths: Vec<_> = files.iter().map(|f| f.path().to_path_buf()).collect();

    let config = config_with(ScriptedCompletion::returning(GOOD_RESPONSE));
    extract_statement(files, &config).await.unwrap();

    for path in paths {
        assert!(!path.exists(), "{} should have been removed", path.display());
    }
}

#[tokio::test]
async fn spooled_files_are_removed_even_when_recovery_fails() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![spool(dir.path(), "a.txt", "one", 0).await];
    let path = files[0].path().to_path_buf();

    let config = config_with(ScriptedCompletion::returning("no json here"));
    let _ = extract_statement(files, &config).await;

    assert!(!path.exists(), "file must be removed regardless of the outcome");
}
