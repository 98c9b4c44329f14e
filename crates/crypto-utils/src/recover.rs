//! secp256k1 public key recovery from compact signatures.
//!
//! A recoverable signature is the 64-byte `r || s` pair plus a recovery id
//! selecting which of the candidate points the signer's key is. Only the
//! canonical low-s form is accepted so one logical signature has exactly one
//! accepted encoding.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::error::CryptoError;

/// Length of an uncompressed secp256k1 public key without the 0x04 prefix.
pub const PUBLIC_KEY_LEN: usize = 64;

/// Compact ECDSA signature with its recovery selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// 0..=3. Bit 0 is the y parity, bit 1 marks an x-coordinate overflow.
    pub recovery_id: u8,
    /// `r || s`, 32 bytes each, big-endian.
    pub compact: [u8; 64],
}

/// Recover the uncompressed public key (X || Y) that produced `compact`
/// over the 32-byte `prehash`.
pub fn recover_public_key(
    prehash: &[u8; 32],
    compact: &[u8; 64],
    recovery_id: u8,
) -> Result<[u8; PUBLIC_KEY_LEN], CryptoError> {
    let recid =
        RecoveryId::from_byte(recovery_id).ok_or(CryptoError::InvalidRecoveryId(recovery_id))?;

    let signature = Signature::from_slice(compact)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    // `normalize_s` returns Some only when s was in the upper half.
    if signature.normalize_s().is_some() {
        return Err(CryptoError::NonCanonicalSignature);
    }

    let key = VerifyingKey::recover_from_prehash(prehash, &signature, recid)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(uncompressed_xy(&key))
}

/// Strip the SEC1 0x04 tag from a verifying key's uncompressed encoding.
pub(crate) fn uncompressed_xy(key: &VerifyingKey) -> [u8; PUBLIC_KEY_LEN] {
    let encoded = key.to_encoded_point(false);
    let mut out = [0u8; PUBLIC_KEY_LEN];
    out.copy_from_slice(&encoded.as_bytes()[1..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;
    use crate::signer::Secp256k1Signer;

    const TEST_PRIVKEY: [u8; 32] = {
        let mut key = [0u8; 32];
        key[31] = 1;
        key
    };

    fn signer() -> Secp256k1Signer {
        Secp256k1Signer::from_bytes(&TEST_PRIVKEY).unwrap()
    }

    #[test]
    fn recovers_signer_key() {
        let signer = signer();
        let hash = keccak256(b"relay me");
        let sig = signer.sign_prehash(&hash).unwrap();

        let recovered = recover_public_key(&hash, &sig.compact, sig.recovery_id).unwrap();
        assert_eq!(recovered, signer.public_key());
    }

    #[test]
    fn generator_point_for_key_one() {
        // Private key 1 => public key is the generator G.
        let pk = signer().public_key();
        assert_eq!(
            hex::encode(&pk[..32]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn wrong_recovery_id_yields_other_key() {
        let signer = signer();
        let hash = keccak256(b"relay me");
        let sig = signer.sign_prehash(&hash).unwrap();

        let flipped = sig.recovery_id ^ 1;
        match recover_public_key(&hash, &sig.compact, flipped) {
            Ok(key) => assert_ne!(key, signer.public_key()),
            Err(_) => {}
        }
    }

    #[test]
    fn tampered_hash_yields_other_key() {
        let signer = signer();
        let hash = keccak256(b"relay me");
        let sig = signer.sign_prehash(&hash).unwrap();

        let mut other = hash;
        other[0] ^= 0x01;
        match recover_public_key(&other, &sig.compact, sig.recovery_id) {
            Ok(key) => assert_ne!(key, signer.public_key()),
            Err(_) => {}
        }
    }

    #[test]
    fn recovery_id_above_three_rejected() {
        let hash = [0x11u8; 32];
        let result = recover_public_key(&hash, &[0x01; 64], 4);
        assert_eq!(result, Err(CryptoError::InvalidRecoveryId(4)));
    }

    #[test]
    fn zero_signature_rejected() {
        let hash = [0x11u8; 32];
        let result = recover_public_key(&hash, &[0u8; 64], 0);
        assert!(matches!(result, Err(CryptoError::InvalidSignature(_))));
    }

    #[test]
    fn high_s_signature_rejected() {
        let signer = signer();
        let hash = keccak256(b"malleable");
        let sig = signer.sign_prehash(&hash).unwrap();

        // Replace s with n - s to get the high-s twin of the same signature.
        let parsed = Signature::from_slice(&sig.compact).unwrap();
        let high_s = -parsed.s();
        let twin = Signature::from_scalars(parsed.r().to_bytes(), high_s.to_bytes()).unwrap();
        let mut twin_bytes = [0u8; 64];
        twin_bytes.copy_from_slice(&twin.to_bytes());

        let result = recover_public_key(&hash, &twin_bytes, sig.recovery_id ^ 1);
        assert_eq!(result, Err(CryptoError::NonCanonicalSignature));
    }
}
