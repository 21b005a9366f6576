//! HTTP server binary for stmt2json.
//!
//! A thin shim over the library crate: one multipart endpoint that spools
//! the uploaded batch to request-scoped temp files, runs the extraction
//! pipeline, and answers with the JSON envelope. Backends are constructed
//! once at startup from the environment and injected into the shared
//! [`ExtractionConfig`].

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use clap::Parser;
use stmt2json::{
    AzureDocumentClient, CompletionBackend, DocumentAnalyzer, ExtractError, ExtractionConfig,
    OpenAiChat, ResponseEnvelope, UploadedFile,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Uploads are statements, not archives; 50 MB covers a 12-file batch of
/// dense scans with room to spare.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

const AFTER_HELP: &str = r#"ENVIRONMENT VARIABLES:
  OPENAI_API_KEY    Completion backend API key (required for extraction)
  OPENAI_BASE_URL   Alternate OpenAI-compatible endpoint
  AZURE_ENDPOINT    Azure Document Intelligence endpoint (optional)
  AZURE_KEY         Azure Document Intelligence key (optional)
  PORT              Listen port (same as --port)

Without AZURE_* credentials the server still runs; PDF and image uploads
are then decoded as text best-effort instead of OCR'd.

EXAMPLE:
  export OPENAI_API_KEY=sk-...
  stmt2json --port 3000
  curl -F files=@january.pdf -F files=@february.txt http://localhost:3000/processFiles
"#;

/// Extract structured transactions from bank-statement uploads.
#[derive(Parser, Debug)]
#[command(
    name = "stmt2json",
    version,
    about = "HTTP service extracting structured transactions from bank-statement documents",
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Listen address.
    #[arg(long, env = "STMT2JSON_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Completion model ID.
    #[arg(long, env = "STMT2JSON_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "STMT2JSON_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max completion output tokens.
    #[arg(long, env = "STMT2JSON_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: u32,

    /// Skip the OCR-noise sanitizer pass.
    #[arg(long, env = "STMT2JSON_NO_SANITIZE")]
    no_sanitize: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "STMT2JSON_VERBOSE")]
    verbose: bool,
}

struct AppState {
    config: ExtractionConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    // ── Backends from the environment, once ──────────────────────────────
    let analyzer = AzureDocumentClient::from_env()
        .map(|c| Arc::new(c) as Arc<dyn DocumentAnalyzer>);
    if analyzer.is_none() {
        warn!("AZURE_ENDPOINT/AZURE_KEY not set — PDF and image uploads will be decoded as text");
    }

    let completion = OpenAiChat::from_env()
        .map(|c| Arc::new(c) as Arc<dyn CompletionBackend>);
    if completion.is_none() {
        warn!("OPENAI_API_KEY not set — extraction requests will fail until it is provided");
    }

    let mut builder = ExtractionConfig::builder()
        .model(&cli.model)
        .temperature(cli.temperature)
        .max_output_tokens(cli.max_tokens)
        .sanitize(!cli.no_sanitize);
    if let Some(analyzer) = analyzer {
        builder = builder.analyzer(analyzer);
    }
    if let Some(completion) = completion {
        builder = builder.completion(completion);
    }
    let config = builder.build().context("Invalid configuration")?;

    let state = Arc::new(AppState { config });

    // ── Router ───────────────────────────────────────────────────────────
    let app = Router::new()
        .route("/processFiles", post(process_files))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .context("Invalid host/port")?;
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// `POST /processFiles` — multipart batch in, JSON envelope out.
///
/// Always responds with an envelope body, even on failure, so callers can
/// distinguish "the model produced no JSON" from a transport error.
async fn process_files(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> (StatusCode, Json<ResponseEnvelope>) {
    // The TempDir guard must outlive the pipeline call: dropping it removes
    // the directory (and any file the pipeline's per-file cleanup missed).
    let spool_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            let err = ExtractError::Internal(format!("failed to create spool dir: {e}"));
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(ResponseEnvelope::failure(&err)));
        }
    };

    let files = match spool_batch(multipart, spool_dir.path()).await {
        Ok(files) => files,
        Err(e) => return (status_for(&e), Json(ResponseEnvelope::failure(&e))),
    };

    match stmt2json::extract_statement(files, &state.config).await {
        Ok(record) => (StatusCode::OK, Json(ResponseEnvelope::success(record))),
        Err(e) => (status_for(&e), Json(ResponseEnvelope::failure(&e))),
    }
}

/// Collect the `files` parts of the multipart form into spooled uploads.
async fn spool_batch(
    mut multipart: Multipart,
    dir: &std::path::Path,
) -> Result<Vec<UploadedFile>, ExtractError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractError::Internal(format!("failed to read form field: {e}")))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ExtractError::Internal(format!("failed to read file data: {e}")))?;

        let file = UploadedFile::spool(&bytes, &original_name, dir, files.len())
            .await
            .map_err(|e| ExtractError::Internal(format!("failed to spool upload: {e}")))?;
        files.push(file);
    }

    Ok(files)
}

fn status_for(err: &ExtractError) -> StatusCode {
    if err.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
