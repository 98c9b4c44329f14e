use host_ledger::LedgerError;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Wallet already exists")]
    AlreadyExists,

    #[error("Claimed address does not match the derived wallet address")]
    AddressMismatch,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Wallet not found")]
    NotFound,

    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u64, requested: u64 },

    #[error("Resource limit exceeded: {0}")]
    ResourceExceeded(String),

    #[error("Target action failed: {0}")]
    TargetActionFailed(LedgerError),

    #[error("Host error: {0}")]
    Host(LedgerError),
}

impl RelayError {
    /// Classify a failure raised by a relayed invocation.
    pub(crate) fn from_target(e: LedgerError) -> Self {
        match e {
            LedgerError::ComputeBudgetExceeded { .. } => {
                RelayError::ResourceExceeded(e.to_string())
            }
            other => RelayError::TargetActionFailed(other),
        }
    }
}

impl From<LedgerError> for RelayError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ComputeBudgetExceeded { .. } => {
                RelayError::ResourceExceeded(e.to_string())
            }
            other => RelayError::Host(other),
        }
    }
}

impl From<CodecError> for RelayError {
    fn from(e: CodecError) -> Self {
        RelayError::InvalidInput(e.to_string())
    }
}
