//! Built-in system program: owns plain accounts and moves lamports between them.

use crate::address::Address;
use crate::error::ProgramError;
use crate::instruction::{AccountMeta, Instruction};
use crate::program::{InvokeContext, Program};

/// The system program id: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; 32]);

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

const SYSTEM_TRANSFER_UNITS: u64 = 150;

/// Build a System Program `Transfer` instruction.
pub fn transfer(from: &Address, to: &Address, lamports: u64) -> Instruction {
    // Instruction data: u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    )
}

pub struct SystemProgram;

impl Program for SystemProgram {
    fn process(&self, ctx: &mut InvokeContext<'_>) -> Result<(), ProgramError> {
        ctx.consume(SYSTEM_TRANSFER_UNITS)?;

        let data = ctx.data();
        if data.len() != 12 || data[..4] != SYSTEM_TRANSFER_IX_INDEX.to_le_bytes() {
            return Err(ProgramError::InvalidInstructionData);
        }
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&data[4..12]);
        let lamports = u64::from_le_bytes(amount);

        let from = ctx.account(0)?;
        if !from.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        // Only plain system accounts can be debited here.
        if from.account.owner != SYSTEM_PROGRAM_ID || !from.account.data.is_empty() {
            return Err(ProgramError::InvalidAccountData);
        }
        if from.account.lamports < lamports {
            return Err(ProgramError::InsufficientFunds);
        }
        ctx.account(1)?;

        ctx.account_mut(0)?.account.lamports -= lamports;
        let to = &mut ctx.account_mut(1)?.account;
        to.lamports = to
            .lamports
            .checked_add(lamports)
            .ok_or(ProgramError::InvalidAccountData)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_instruction_data_is_12_bytes() {
        let ix = transfer(&Address::new([1; 32]), &Address::new([2; 32]), 1_000_000);
        // 4 bytes instruction index + 8 bytes lamports = 12.
        assert_eq!(ix.data.len(), 12);
        assert_eq!(&ix.data[..4], &[2, 0, 0, 0]);
        assert_eq!(&ix.data[4..], &1_000_000u64.to_le_bytes());
    }

    #[test]
    fn transfer_has_correct_accounts() {
        let from = Address::new([0xAA; 32]);
        let to = Address::new([0xBB; 32]);
        let ix = transfer(&from, &to, 500);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(ix.accounts.len(), 2);
        assert_eq!(ix.accounts[0].pubkey, from);
        assert!(ix.accounts[0].is_signer);
        assert!(ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, to);
        assert!(!ix.accounts[1].is_signer);
        assert!(ix.accounts[1].is_writable);
    }
}
