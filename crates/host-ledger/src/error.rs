use thiserror::Error;

use crate::address::Address;

/// Errors raised by the host ledger itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    #[error("derived address lies on the ed25519 curve")]
    OnCurve,

    #[error("account {0} already in use")]
    AccountAlreadyInUse(Address),

    #[error("account {0} not found")]
    AccountNotFound(Address),

    #[error("insufficient funds in {address}: available {available}, requested {requested}")]
    InsufficientFunds {
        address: Address,
        available: u64,
        requested: u64,
    },

    #[error("program {0} is not registered")]
    ProgramNotFound(Address),

    #[error("missing required signature for {0}")]
    MissingRequiredSignature(Address),

    #[error("delegated authority for {0} does not derive from the caller")]
    InvalidDelegation(Address),

    #[error("account {0} referenced more than once")]
    DuplicateAccount(Address),

    #[error("read-only account {0} was modified")]
    ReadonlyAccountModified(Address),

    #[error("account {0} modified by a program that does not own it")]
    ExternalAccountModified(Address),

    #[error("instruction changed the total lamports of its accounts")]
    UnbalancedInstruction,

    #[error("compute budget exceeded: limit {limit}, required {required}")]
    ComputeBudgetExceeded { limit: u64, required: u64 },

    #[error("program {program_id} failed: {error}")]
    Program {
        program_id: Address,
        error: ProgramError,
    },
}

/// Errors a program reports from its `process` entrypoint.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error("custom program error: {0:#x}")]
    Custom(u32),

    #[error("missing required signature")]
    MissingRequiredSignature,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("invalid instruction data")]
    InvalidInstructionData,

    #[error("invalid account data")]
    InvalidAccountData,

    #[error("not enough account keys")]
    NotEnoughAccountKeys,

    #[error("computational budget exceeded")]
    ComputationalBudgetExceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_custom_program_error() {
        let err = ProgramError::Custom(0x1771);
        assert_eq!(err.to_string(), "custom program error: 0x1771");
    }

    #[test]
    fn display_wrapped_program_error() {
        let err = LedgerError::Program {
            program_id: Address::default(),
            error: ProgramError::InvalidInstructionData,
        };
        assert_eq!(
            err.to_string(),
            "program 11111111111111111111111111111111 failed: invalid instruction data"
        );
    }

    #[test]
    fn display_insufficient_funds() {
        let err = LedgerError::InsufficientFunds {
            address: Address::default(),
            available: 5,
            requested: 10,
        };
        assert!(err.to_string().contains("available 5, requested 10"));
    }

    #[test]
    fn display_compute_exceeded() {
        let err = LedgerError::ComputeBudgetExceeded {
            limit: 200_000,
            required: 200_001,
        };
        assert_eq!(
            err.to_string(),
            "compute budget exceeded: limit 200000, required 200001"
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> = Box::new(LedgerError::OnCurve);
        assert!(err.to_string().contains("curve"));
    }
}
