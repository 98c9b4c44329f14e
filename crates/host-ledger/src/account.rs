use crate::address::Address;

/// Lamports in one whole native unit.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Bytes of per-account metadata charged for rent on top of its data.
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Rent rate (3480 lamports per byte-year) times the two-year exemption window.
const EXEMPT_LAMPORTS_PER_BYTE: u64 = 3480 * 2;

/// State of a single ledger account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    pub lamports: u64,
    /// The program allowed to debit this account and mutate its data.
    pub owner: Address,
    pub data: Vec<u8>,
    pub executable: bool,
}

impl Account {
    pub fn new(lamports: u64, owner: Address, data: Vec<u8>) -> Self {
        Self {
            lamports,
            owner,
            data,
            executable: false,
        }
    }
}

/// Balance an account with `data_len` bytes must keep to be rent-exempt.
pub fn minimum_balance(data_len: usize) -> u64 {
    (ACCOUNT_STORAGE_OVERHEAD + data_len as u64) * EXEMPT_LAMPORTS_PER_BYTE
}
