//! A deterministic, in-memory host ledger for account-model programs.
//!
//! Accounts hold lamports and data and are owned by a program. Programs run
//! against the [`Host`] trait: they read accounts, allocate program-derived
//! accounts, move lamports they own, and invoke each other, optionally
//! signing as a PDA through a [`DelegatedAuthority`]. [`MemoryLedger`] runs
//! each transaction atomically under a compute budget.

pub mod account;
pub mod address;
pub mod authority;
pub mod compute;
pub mod error;
pub mod instruction;
pub mod ledger;
pub mod pda;
pub mod program;
pub mod system;

pub use account::{minimum_balance, Account, LAMPORTS_PER_SOL};
pub use address::Address;
pub use authority::DelegatedAuthority;
pub use compute::{
    ComputeBudget, ComputeMeter, DEFAULT_COMPUTE_UNIT_LIMIT, INVOKE_UNITS, MAX_COMPUTE_UNIT_LIMIT,
};
pub use error::{LedgerError, ProgramError};
pub use instruction::{compact_u16_len, AccountMeta, Instruction};
pub use ledger::{
    Host, MemoryLedger, Transaction, TransactionContext, DEFAULT_LAMPORTS_PER_SIGNATURE,
    NATIVE_LOADER_ID,
};
pub use pda::{create_program_address, find_program_address, is_on_curve, MAX_SEEDS, MAX_SEED_LEN};
pub use program::{AccountView, InvokeContext, Program};
pub use system::{SystemProgram, SYSTEM_PROGRAM_ID};
