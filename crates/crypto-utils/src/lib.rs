//! # crypto-utils
//!
//! Keccak-256 hashing, secp256k1 recoverable signatures, and secure random
//! generation shared by the relay core and its off-ledger signers.

pub mod error;
pub mod hash;
pub mod random;
pub mod recover;
pub mod signer;

pub use error::CryptoError;
pub use hash::keccak256;
pub use recover::{recover_public_key, RecoverableSignature, PUBLIC_KEY_LEN};
pub use signer::Secp256k1Signer;
