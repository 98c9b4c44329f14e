//! Off-ledger secp256k1 signer.
//!
//! The wallet's private key never reaches the ledger. Whoever holds it signs
//! message hashes here and submits the recoverable signature alongside the
//! plaintext action.

use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::random::random_bytes_fixed;
use crate::recover::{uncompressed_xy, RecoverableSignature, PUBLIC_KEY_LEN};

/// A secp256k1 private key. `SigningKey` zeroizes its scalar on drop.
pub struct Secp256k1Signer {
    key: SigningKey,
}

impl Secp256k1Signer {
    /// Build a signer from a 32-byte big-endian private scalar.
    pub fn from_bytes(private_key: &[u8; 32]) -> Result<Self, CryptoError> {
        let mut key_bytes = *private_key;
        let key = SigningKey::from_bytes((&key_bytes).into())
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()));
        key_bytes.zeroize();
        Ok(Self { key: key? })
    }

    /// Generate a fresh signer from OS randomness.
    pub fn random() -> Self {
        loop {
            let mut candidate: [u8; 32] = random_bytes_fixed();
            let key = SigningKey::from_bytes((&candidate).into());
            candidate.zeroize();
            // Rejection happens only for zero or >= n, probability ~2^-128.
            if let Ok(key) = key {
                return Self { key };
            }
        }
    }

    /// Uncompressed public key, X || Y without the SEC1 tag.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        uncompressed_xy(self.key.verifying_key())
    }

    /// Sign a 32-byte hash directly (no prefixing). The output is low-s.
    pub fn sign_prehash(&self, prehash: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (signature, recovery_id): (Signature, RecoveryId) = self
            .key
            .sign_prehash(prehash)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        let mut compact = [0u8; 64];
        compact.copy_from_slice(&signature.to_bytes());

        Ok(RecoverableSignature {
            recovery_id: recovery_id.to_byte(),
            compact,
        })
    }
}

impl std::fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("public_key", &hex::encode(self.public_key()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_key_is_invalid() {
        assert!(Secp256k1Signer::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn key_above_order_is_invalid() {
        assert!(Secp256k1Signer::from_bytes(&[0xFFu8; 32]).is_err());
    }

    #[test]
    fn signatures_are_deterministic() {
        // RFC 6979 nonces: same key + hash => same signature.
        let signer = Secp256k1Signer::from_bytes(&[0x42u8; 32]).unwrap();
        let hash = [0xAAu8; 32];
        assert_eq!(
            signer.sign_prehash(&hash).unwrap(),
            signer.sign_prehash(&hash).unwrap()
        );
    }

    #[test]
    fn signatures_are_low_s() {
        let signer = Secp256k1Signer::random();
        for i in 0..16u8 {
            let sig = signer.sign_prehash(&[i; 32]).unwrap();
            let parsed = Signature::from_slice(&sig.compact).unwrap();
            assert!(parsed.normalize_s().is_none(), "signature {i} has high s");
            assert!(sig.recovery_id <= 1);
        }
    }

    #[test]
    fn random_signers_differ() {
        let a = Secp256k1Signer::random();
        let b = Secp256k1Signer::random();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn debug_does_not_print_secret() {
        let signer = Secp256k1Signer::from_bytes(&[0x42u8; 32]).unwrap();
        let debug = format!("{signer:?}");
        assert!(debug.contains("public_key"));
        assert!(!debug.contains(&hex::encode([0x42u8; 32])));
    }
}
