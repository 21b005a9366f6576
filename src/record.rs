//! The structured output contract: statement metadata, transactions, and the
//! response envelope.
//!
//! Field names are a wire contract shared with downstream consumers — they
//! must serialize exactly as documented (`ownerName`, `dateRangeStartDate`,
//! `totalAmountOfDepositsAsReported`, `depositOrWithdrawal`, …). Do not
//! rename without coordinating a consumer migration.
//!
//! # Permissiveness
//!
//! The record is deserialized from whatever JSON the model produced, so
//! every field is defaulted and the numeric-or-null fields are kept as
//! [`serde_json::Value`]: a model that emits `"amount": "4.50"` instead of
//! `4.50` still parses, and the string survives re-serialization untouched.
//! Schema validation beyond shape is the consumer's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExtractError;

/// Statement-level metadata as reported by the model.
///
/// All fields optional: statements routinely omit reported totals, and a
/// partial extraction is still useful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatementMetadata {
    pub owner_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub statement_date: Option<String>,
    pub date_range_start_date: Option<String>,
    pub date_range_end_date: Option<String>,
    /// Number or numeric-looking string, whichever the model emitted.
    pub total_amount_of_deposits_as_reported: Option<Value>,
    pub total_amount_of_withdrawals_as_reported: Option<Value>,
    pub total_count_of_deposits_as_reported: Option<Value>,
    pub total_count_of_withdrawals_as_reported: Option<Value>,
}

/// A single statement line item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    pub date: String,
    pub description: String,
    /// Number or numeric-looking string, whichever the model emitted.
    pub amount: Value,
    /// `"deposit"` or `"withdrawal"`; kept as a string because the model is
    /// not guaranteed to honour the enum.
    pub deposit_or_withdrawal: String,
    /// Free-text label suggested by the model (e.g. "Fuel", "Supplies").
    pub transaction_category: String,
}

/// The normalized structured output of the pipeline.
///
/// `transactions` preserves the order the model emitted them in; duplicate
/// lines are legal (recurring fees look identical month to month).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementRecord {
    pub metadata: StatementMetadata,
    pub transactions: Vec<Transaction>,
}

/// The success/failure wrapper returned to callers.
///
/// Exactly one of `result` (success) or `error` (failure) is present;
/// `raw` rides along only when the model produced output we could not
/// parse, so operators can see what came back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<StatementRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ResponseEnvelope {
    /// Wrap a recovered record as `{success: true, result}`.
    pub fn success(record: StatementRecord) -> Self {
        Self {
            success: true,
            result: Some(record),
            error: None,
            raw: None,
        }
    }

    /// Wrap an error as `{success: false, error[, raw]}`.
    pub fn failure(err: &ExtractError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            raw: err.raw_output().map(str::to_string),
        }
    }
}
