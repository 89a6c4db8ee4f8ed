//! Ledger error types.

use thiserror::Error;

use crate::transaction::types::Amount;

/// Every way the ledger can refuse an operation.
///
/// Each variant maps to a machine-readable kind on the wire (see
/// [`kind`](LedgerError::kind)); none of them are panics and none are
/// swallowed. `DuplicateTransaction` deserves a special mention: from the
/// submitter's perspective it means "your transfer already went through",
/// which is the idempotency guard doing its job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("wallet not found: {0}")]
    WalletNotFound(String),

    #[error("digital signature does not verify against the sender's public key")]
    InvalidSignature,

    #[error("attestation digest does not match the attested sensor data")]
    InvalidAttestation,

    #[error("transaction {0} has already been applied")]
    DuplicateTransaction(String),

    #[error("wallet {wallet_id} holds {balance}, transfer needs {required}")]
    InsufficientBalance {
        wallet_id: String,
        balance: Amount,
        required: Amount,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("internal ledger failure: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Stable machine-readable error kind, carried in every error response.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::WalletNotFound(_) => "not_found",
            LedgerError::InvalidSignature => "invalid_signature",
            LedgerError::InvalidAttestation => "invalid_attestation",
            LedgerError::DuplicateTransaction(_) => "duplicate_transaction",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::Validation(_) => "validation_error",
            LedgerError::Internal(_) => "internal_error",
        }
    }
}
