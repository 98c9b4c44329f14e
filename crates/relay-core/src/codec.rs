//! Canonical action encoding.
//!
//! Every authorized action is hashed from this encoding, so it must be
//! deterministic and injective over `(kind, payload)`:
//!
//! ```text
//! Transfer         := 0x01 ‖ destination[32] ‖ amount u64 LE
//! RelayInstruction := 0x02 ‖ instruction
//! RelayBatch       := 0x03 ‖ count u32 LE ‖ (len u32 LE ‖ instruction)*
//! instruction      := program_id[32] ‖ n u32 LE ‖ (pubkey[32] ‖ flags u8)*n
//!                     ‖ data_len u32 LE ‖ data
//! flags            := bit0 signer, bit1 writable
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crypto_utils::keccak256;
use host_ledger::{AccountMeta, Address, Instruction};
use thiserror::Error;

pub const TRANSFER_TAG: u8 = 0x01;
pub const RELAY_INSTRUCTION_TAG: u8 = 0x02;
pub const RELAY_BATCH_TAG: u8 = 0x03;

const SIGNER_FLAG: u8 = 0b01;
const WRITABLE_FLAG: u8 = 0b10;

/// Largest count a host compact-u16 length prefix can carry.
const MAX_COMPACT_U16: usize = u16::MAX as usize;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unknown action tag: {0:#04x}")]
    UnknownTag(u8),

    #[error("Invalid account flags: {0:#04x}")]
    InvalidFlags(u8),

    #[error("Truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Declared length {declared} does not match {actual} bytes consumed")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("{0} trailing bytes")]
    TrailingBytes(usize),

    #[error("Length {0} does not fit in u32")]
    LengthOverflow(usize),

    #[error("Account {0} listed more than once")]
    DuplicateAccount(Address),

    #[error("{0} account references exceed the host limit")]
    TooManyAccounts(usize),

    #[error("{0} bytes of instruction data exceed the host limit")]
    DataTooLarge(usize),
}

/// The kind tag of an [`ActionEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Transfer,
    RelayInstruction,
    RelayBatch,
}

impl ActionKind {
    pub fn tag(self) -> u8 {
        match self {
            ActionKind::Transfer => TRANSFER_TAG,
            ActionKind::RelayInstruction => RELAY_INSTRUCTION_TAG,
            ActionKind::RelayBatch => RELAY_BATCH_TAG,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Transfer => "transfer",
            ActionKind::RelayInstruction => "relay_instruction",
            ActionKind::RelayBatch => "relay_batch",
        })
    }
}

/// An action a wallet key can authorize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEnvelope {
    Transfer { destination: Address, amount: u64 },
    RelayInstruction(Instruction),
    /// Executed in order; the order is part of what gets signed.
    RelayBatch(Vec<Instruction>),
}

impl ActionEnvelope {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionEnvelope::Transfer { .. } => ActionKind::Transfer,
            ActionEnvelope::RelayInstruction(_) => ActionKind::RelayInstruction,
            ActionEnvelope::RelayBatch(_) => ActionKind::RelayBatch,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = vec![self.kind().tag()];
        match self {
            ActionEnvelope::Transfer {
                destination,
                amount,
            } => {
                out.extend_from_slice(destination.as_bytes());
                out.extend_from_slice(&amount.to_le_bytes());
            }
            ActionEnvelope::RelayInstruction(ix) => encode_instruction(ix, &mut out)?,
            ActionEnvelope::RelayBatch(batch) => {
                put_len(&mut out, batch.len())?;
                for ix in batch {
                    let mut member = Vec::new();
                    encode_instruction(ix, &mut member)?;
                    put_len(&mut out, member.len())?;
                    out.extend_from_slice(&member);
                }
            }
        }
        Ok(out)
    }

    /// Strict inverse of [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);
        let envelope = match r.u8()? {
            TRANSFER_TAG => ActionEnvelope::Transfer {
                destination: r.address()?,
                amount: r.u64()?,
            },
            RELAY_INSTRUCTION_TAG => ActionEnvelope::RelayInstruction(decode_instruction(&mut r)?),
            RELAY_BATCH_TAG => {
                let count = r.length()?;
                // Each member needs at least its own length prefix.
                if count > r.remaining() / 4 {
                    return Err(CodecError::Truncated {
                        needed: count.saturating_mul(4),
                        remaining: r.remaining(),
                    });
                }
                let mut batch = Vec::with_capacity(count);
                for _ in 0..count {
                    let declared = r.length()?;
                    let mut member = Reader::new(r.take(declared)?);
                    batch.push(decode_instruction(&mut member)?);
                    if member.remaining() != 0 {
                        return Err(CodecError::LengthMismatch {
                            declared,
                            actual: declared - member.remaining(),
                        });
                    }
                }
                ActionEnvelope::RelayBatch(batch)
            }
            tag => return Err(CodecError::UnknownTag(tag)),
        };
        r.finish()?;
        Ok(envelope)
    }

    /// Reject descriptors the host could never accept as written.
    pub fn validate(&self) -> Result<(), CodecError> {
        match self {
            ActionEnvelope::Transfer { .. } => Ok(()),
            ActionEnvelope::RelayInstruction(ix) => validate_instruction(ix),
            ActionEnvelope::RelayBatch(batch) => batch.iter().try_for_each(validate_instruction),
        }
    }

    /// keccak-256 of the canonical encoding: the message a wallet key signs.
    pub fn message_hash(&self) -> Result<[u8; 32], CodecError> {
        Ok(keccak256(&self.encode()?))
    }
}

fn validate_instruction(ix: &Instruction) -> Result<(), CodecError> {
    if ix.accounts.len() > MAX_COMPACT_U16 {
        return Err(CodecError::TooManyAccounts(ix.accounts.len()));
    }
    if ix.data.len() > MAX_COMPACT_U16 {
        return Err(CodecError::DataTooLarge(ix.data.len()));
    }
    let mut seen = BTreeSet::new();
    for meta in &ix.accounts {
        if !seen.insert(meta.pubkey) {
            return Err(CodecError::DuplicateAccount(meta.pubkey));
        }
    }
    Ok(())
}

fn put_len(out: &mut Vec<u8>, len: usize) -> Result<(), CodecError> {
    let len = u32::try_from(len).map_err(|_| CodecError::LengthOverflow(len))?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn encode_instruction(ix: &Instruction, out: &mut Vec<u8>) -> Result<(), CodecError> {
    out.extend_from_slice(ix.program_id.as_bytes());
    put_len(out, ix.accounts.len())?;
    for meta in &ix.accounts {
        out.extend_from_slice(meta.pubkey.as_bytes());
        let mut flags = 0;
        if meta.is_signer {
            flags |= SIGNER_FLAG;
        }
        if meta.is_writable {
            flags |= WRITABLE_FLAG;
        }
        out.push(flags);
    }
    put_len(out, ix.data.len())?;
    out.extend_from_slice(&ix.data);
    Ok(())
}

fn decode_instruction(r: &mut Reader<'_>) -> Result<Instruction, CodecError> {
    let program_id = r.address()?;
    let n = r.length()?;
    if n > r.remaining() / 33 {
        return Err(CodecError::Truncated {
            needed: n.saturating_mul(33),
            remaining: r.remaining(),
        });
    }
    let mut accounts = Vec::with_capacity(n);
    for _ in 0..n {
        let pubkey = r.address()?;
        let flags = r.u8()?;
        if flags & !(SIGNER_FLAG | WRITABLE_FLAG) != 0 {
            return Err(CodecError::InvalidFlags(flags));
        }
        accounts.push(AccountMeta {
            pubkey,
            is_signer: flags & SIGNER_FLAG != 0,
            is_writable: flags & WRITABLE_FLAG != 0,
        });
    }
    let data_len = r.length()?;
    let data = r.take(data_len)?.to_vec();
    Ok(Instruction::new(program_id, accounts, data))
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn remaining(&self) -> usize {
        self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.bytes.len() {
            return Err(CodecError::Truncated {
                needed: n,
                remaining: self.bytes.len(),
            });
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.array::<1>()?[0])
    }

    fn length(&mut self) -> Result<usize, CodecError> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn address(&mut self) -> Result<Address, CodecError> {
        Ok(Address::new(self.array()?))
    }

    fn finish(self) -> Result<(), CodecError> {
        match self.bytes.len() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
