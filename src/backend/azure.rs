//! Azure Document Intelligence client.
//!
//! The analyze API is asynchronous on the server side: submitting a
//! document returns `202 Accepted` with an `Operation-Location` header, and
//! the result is fetched by polling that URL until `status` leaves
//! `running`/`notStarted`. [`AzureDocumentClient::analyze`] owns that loop,
//! so callers see one suspend point per document. The poll interval is
//! fixed and configurable; there is deliberately no client-side deadline —
//! the backend enforces its own job timeout and reports `failed`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::backend::DocumentAnalyzer;
use crate::error::ExtractError;
use crate::pipeline::normalize::OcrAnalysis;

const API_VERSION: &str = "2024-11-30";
const DEFAULT_DOCUMENT_MODEL: &str = "prebuilt-bankStatement.us";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// HTTP client for the Azure Document Intelligence analyze API.
pub struct AzureDocumentClient {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    document_model: String,
    poll_interval: Duration,
}

impl AzureDocumentClient {
    /// Build a client for the given resource endpoint and API key.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            document_model: DEFAULT_DOCUMENT_MODEL.to_string(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Override the prebuilt document model (default
    /// `prebuilt-bankStatement.us`).
    pub fn document_model(mut self, model: impl Into<String>) -> Self {
        self.document_model = model.into();
        self
    }

    /// Override the poll interval (default 1 s).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build a client from `AZURE_ENDPOINT` / `AZURE_KEY`.
    ///
    /// `None` when either variable is unset or empty — the pipeline then
    /// treats the OCR collaborator as unavailable and extraction falls back
    /// to direct text decoding.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("AZURE_ENDPOINT").ok().filter(|s| !s.is_empty())?;
        let key = std::env::var("AZURE_KEY").ok().filter(|s| !s.is_empty())?;
        Some(Self::new(endpoint, key))
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.document_model, API_VERSION
        )
    }

    /// Submit the document; returns the operation URL to poll.
    async fn begin_analyze(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, ExtractError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ExtractError::AnalysisFailed {
                detail: format!("submit: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::AnalysisFailed {
                detail: format!("submit: HTTP {status}: {body}"),
            });
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ExtractError::AnalysisFailed {
                detail: "submit: missing Operation-Location header".to_string(),
            })?;

        debug!("analysis job accepted: {}", operation_url);
        Ok(operation_url)
    }

    /// Poll the operation URL until the job reaches a terminal state.
    async fn poll_until_done(&self, operation_url: &str) -> Result<OcrAnalysis, ExtractError> {
        loop {
            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.key)
                .send()
                .await
                .map_err(|e| ExtractError::AnalysisFailed {
                    detail: format!("poll: {e}"),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ExtractError::AnalysisFailed {
                    detail: format!("poll: HTTP {status}: {body}"),
                });
            }

            let operation: AnalyzeOperation =
                response
                    .json()
                    .await
                    .map_err(|e| ExtractError::AnalysisFailed {
                        detail: format!("poll: invalid response body: {e}"),
                    })?;

            match operation.status.as_str() {
                "succeeded" => {
                    return operation.analyze_result.ok_or_else(|| {
                        ExtractError::AnalysisFailed {
                            detail: "job succeeded but returned no analyzeResult".to_string(),
                        }
                    });
                }
                "failed" => {
                    let detail = operation
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| "job reported failed with no error body".to_string());
                    return Err(ExtractError::AnalysisFailed { detail });
                }
                other => {
                    debug!("analysis job status: {}", other);
                    sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocumentClient {
    async fn analyze(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<OcrAnalysis, ExtractError> {
        info!(
            "submitting {} bytes ({}) to document model '{}'",
            bytes.len(),
            content_type,
            self.document_model
        );
        let operation_url = self.begin_analyze(bytes, content_type).await?;
        self.poll_until_done(&operation_url).await
    }
}

/// Poll response envelope around `analyzeResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    analyze_result: Option<OcrAnalysis>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}
