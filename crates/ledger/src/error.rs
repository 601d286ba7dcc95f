//! Ledger error types.

use dispenser_types::DispenserError;
use thiserror::Error;

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backend refused the transaction; nothing was broadcast.
    #[error("submission failed: {0}")]
    SubmissionFailed(String),

    /// A receipt or state lookup failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("ledger transport error: {0}")]
    Transport(String),

    #[error("ledger RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("failed to decode ledger response: {0}")]
    Decode(String),
}

impl From<LedgerError> for DispenserError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SubmissionFailed(msg) => DispenserError::ChainSubmission(msg),
            other => DispenserError::ChainQuery(other.to_string()),
        }
    }
}
