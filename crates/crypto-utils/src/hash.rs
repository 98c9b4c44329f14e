use sha3::{Digest, Keccak256};

/// Keccak-256 (the pre-NIST padding used by Ethereum, not SHA3-256).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}
