//! The extraction prompt sent to the completion backend.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the JSON skeleton inside the prompt is a
//!    wire contract mirrored by [`crate::record::StatementRecord`]; keeping
//!    it in one constant makes a drift between prompt and types easy to spot
//!    in review.
//!
//! 2. **Testability** — unit tests can assert on the rendered prompt without
//!    touching a live model.
//!
//! The prompt is fully determined by the statement text: same text in, same
//! prompt out, nothing read from the environment.

/// Instruction template. `{statement_text}` is replaced by
/// [`build_prompt`]; everything else is fixed.
pub const EXTRACTION_PROMPT: &str = r#"Extract the following from the bank statement text below:
1. Metadata: Owner Name, Bank Name, Account Number, Statement Date,
   DateRangeStartDate, DateRangeEndDate,
   TotalAmountOfDepositsAsReported (if present),
   TotalAmountOfWithdrawalsAsReported (if present),
   TotalCountOfDepositsAsReported (if present),
   TotalCountOfWithdrawalsAsReported (if present)
2. Transactions: Array of objects { Date, Description, Amount, DepositOrWithdrawal, TransactionCategory }

For each transaction, suggest a TransactionCategory (e.g., Phone, Electricity, Fuel, Supplies, Maintenance, etc.)
Return raw JSON only, with no commentary and no code fences, matching this structure:
{
  "metadata": {
    "ownerName": "",
    "bankName": "",
    "accountNumber": "",
    "statementDate": "",
    "dateRangeStartDate": "",
    "dateRangeEndDate": "",
    "totalAmountOfDepositsAsReported": null,
    "totalAmountOfWithdrawalsAsReported": null,
    "totalCountOfDepositsAsReported": null,
    "totalCountOfWithdrawalsAsReported": null
  },
  "transactions": [
    {
      "date": "",
      "description": "",
      "amount": 0.0,
      "depositOrWithdrawal": "",
      "transactionCategory": ""
    }
  ]
}

Statement text:
"""{statement_text}"""
"#;

/// Render the full prompt for one request.
pub fn build_prompt(statement_text: &str) -> String {
    EXTRACTION_PROMPT.replace("{statement_text}", statement_text)
}
