//! Wallet registry: seeds, derived addresses and the persisted record.
//!
//! A wallet lives at `find_program_address([WALLET_PREFIX, seed], program_id)`.
//! That account's data is the wallet record:
//!
//! ```text
//! discriminator  [u8; 8]   sha256("account:WalletRecord")[..8]
//! seed_len       u8
//! seed           [u8; 32]  zero-padded
//! public_key     [u8; 64]  uncompressed secp256k1, no 0x04 prefix
//! bump           u8
//! ```

use std::fmt;

use crypto_utils::{keccak256, PUBLIC_KEY_LEN};
use host_ledger::{find_program_address, Address, DelegatedAuthority, Host};
use sha2::{Digest, Sha256};

use crate::error::RelayError;

/// Domain-separation prefix for wallet addresses.
pub const WALLET_PREFIX: &[u8] = b"smart-wallet";

pub const MAX_SEED_LEN: usize = 32;

pub const WALLET_RECORD_LEN: usize = 8 + 1 + MAX_SEED_LEN + PUBLIC_KEY_LEN + 1;

/// 1 to 32 caller-chosen bytes identifying a wallet.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletSeed {
    bytes: [u8; MAX_SEED_LEN],
    len: u8,
}

impl WalletSeed {
    pub fn new(seed: &[u8]) -> Result<Self, RelayError> {
        if seed.is_empty() || seed.len() > MAX_SEED_LEN {
            return Err(RelayError::InvalidInput(format!(
                "seed must be 1 to {MAX_SEED_LEN} bytes, got {}",
                seed.len()
            )));
        }
        let mut bytes = [0u8; MAX_SEED_LEN];
        bytes[..seed.len()].copy_from_slice(seed);
        Ok(Self {
            bytes,
            len: seed.len() as u8,
        })
    }

    /// The default discriminator: the X coordinate of the wallet key.
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LEN]) -> Self {
        let mut bytes = [0u8; MAX_SEED_LEN];
        bytes.copy_from_slice(&public_key[..MAX_SEED_LEN]);
        Self {
            bytes,
            len: MAX_SEED_LEN as u8,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The message signed to register a wallet under this seed.
    pub fn message_hash(&self) -> [u8; 32] {
        keccak256(self.as_bytes())
    }
}

impl TryFrom<&[u8]> for WalletSeed {
    type Error = RelayError;

    fn try_from(seed: &[u8]) -> Result<Self, Self::Error> {
        Self::new(seed)
    }
}

impl fmt::Debug for WalletSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletSeed({})", hex::encode(self.as_bytes()))
    }
}

/// Derive the wallet address and bump for `seed` under `program_id`.
pub fn wallet_address(
    program_id: &Address,
    seed: &WalletSeed,
) -> Result<(Address, u8), RelayError> {
    find_program_address(&[WALLET_PREFIX, seed.as_bytes()], program_id)
        .map_err(|e| RelayError::InvalidInput(e.to_string()))
}

/// A registered wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletRecord {
    pub seed: WalletSeed,
    pub verification_key: [u8; PUBLIC_KEY_LEN],
    pub address: Address,
    pub bump: u8,
}

fn discriminator() -> [u8; 8] {
    let digest = Sha256::digest(b"account:WalletRecord");
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

impl WalletRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WALLET_RECORD_LEN);
        out.extend_from_slice(&discriminator());
        out.push(self.seed.len);
        out.extend_from_slice(&self.seed.bytes);
        out.extend_from_slice(&self.verification_key);
        out.push(self.bump);
        out
    }

    /// Parse the record stored at `address`. `None` if `data` is not one.
    pub fn decode(address: Address, data: &[u8]) -> Option<Self> {
        if data.len() != WALLET_RECORD_LEN || data[..8] != discriminator() {
            return None;
        }
        let seed_len = data[8] as usize;
        let seed = WalletSeed::new(data.get(9..9 + seed_len)?).ok()?;
        if data[9 + seed_len..9 + MAX_SEED_LEN].iter().any(|b| *b != 0) {
            return None;
        }
        let mut verification_key = [0u8; PUBLIC_KEY_LEN];
        let key_start = 9 + MAX_SEED_LEN;
        verification_key.copy_from_slice(&data[key_start..key_start + PUBLIC_KEY_LEN]);
        Some(Self {
            seed,
            verification_key,
            address,
            bump: data[WALLET_RECORD_LEN - 1],
        })
    }

    /// The capability letting the relay program sign as this wallet.
    pub fn authority(&self) -> DelegatedAuthority {
        DelegatedAuthority::new(
            self.address,
            vec![WALLET_PREFIX.to_vec(), self.seed.as_bytes().to_vec()],
            self.bump,
        )
    }
}

/// Look up the wallet registered under `seed`.
pub fn load_wallet<H: Host + ?Sized>(
    host: &H,
    program_id: &Address,
    seed: &WalletSeed,
) -> Result<WalletRecord, RelayError> {
    let (address, bump) = wallet_address(program_id, seed)?;
    let account = host.account(&address).ok_or(RelayError::NotFound)?;
    if account.owner != *program_id {
        return Err(RelayError::NotFound);
    }
    match WalletRecord::decode(address, &account.data) {
        Some(record) if record.seed == *seed && record.bump == bump => Ok(record),
        _ => Err(RelayError::NotFound),
    }
}
