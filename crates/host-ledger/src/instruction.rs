//! Instructions addressed to ledger programs.
//!
//! Sizes follow the host transaction wire format, where every length is a
//! compact-u16:
//!
//! ```text
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! plus 32 bytes in the transaction's key table for each key it references.

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountMeta {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account reference.
    pub fn new(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account reference.
    pub fn new_readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction for one program: target, ordered accounts, opaque data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Address, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }

    /// Upper bound of the bytes this instruction adds to a host transaction.
    ///
    /// Keys are counted once per reference; a transaction deduplicates them,
    /// so the real figure can only be smaller.
    pub fn wire_size(&self) -> usize {
        let n = self.accounts.len();
        let compiled =
            1 + compact_u16_len(n) + n + compact_u16_len(self.data.len()) + self.data.len();
        let keys = 32 * (n + 1);
        compiled + keys
    }

    /// Whether `address` is named anywhere as a required signer.
    pub fn requires_signer(&self, address: &Address) -> bool {
        self.accounts
            .iter()
            .any(|meta| meta.is_signer && meta.pubkey == *address)
    }
}

/// Number of bytes `value` occupies in compact-u16 encoding.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
///
/// Values beyond `u16::MAX` cannot be encoded; they are reported as 3 bytes
/// and rejected elsewhere by size limits.
pub fn compact_u16_len(value: usize) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_len_boundaries() {
        assert_eq!(compact_u16_len(0), 1);
        assert_eq!(compact_u16_len(0x7f), 1);
        assert_eq!(compact_u16_len(128), 2);
        assert_eq!(compact_u16_len(16383), 2);
        assert_eq!(compact_u16_len(16384), 3);
        assert_eq!(compact_u16_len(u16::MAX as usize), 3);
    }

    #[test]
    fn account_meta_constructors() {
        let key = Address::new([1; 32]);
        let w = AccountMeta::new(key, true);
        assert!(w.is_signer && w.is_writable);
        let r = AccountMeta::new_readonly(key, false);
        assert!(!r.is_signer && !r.is_writable);
    }

    #[test]
    fn wire_size_of_system_transfer() {
        // Two accounts, 12 bytes of data:
        // 1 + 1 + 2 + 1 + 12 = 17 compiled, 3 keys * 32 = 96.
        let ix = Instruction::new(
            Address::default(),
            vec![
                AccountMeta::new(Address::new([1; 32]), true),
                AccountMeta::new(Address::new([2; 32]), false),
            ],
            vec![0u8; 12],
        );
        assert_eq!(ix.wire_size(), 17 + 96);
    }

    #[test]
    fn wire_size_grows_with_data_prefix() {
        let small = Instruction::new(Address::default(), vec![], vec![0u8; 127]);
        let large = Instruction::new(Address::default(), vec![], vec![0u8; 128]);
        // One extra data byte plus one extra length-prefix byte.
        assert_eq!(large.wire_size() - small.wire_size(), 2);
    }

    #[test]
    fn requires_signer_checks_flag() {
        let wallet = Address::new([9; 32]);
        let ix = Instruction::new(
            Address::default(),
            vec![AccountMeta::new(wallet, false)],
            vec![],
        );
        assert!(!ix.requires_signer(&wallet));

        let ix = Instruction::new(
            Address::default(),
            vec![AccountMeta::new_readonly(wallet, true)],
            vec![],
        );
        assert!(ix.requires_signer(&wallet));
    }
}
