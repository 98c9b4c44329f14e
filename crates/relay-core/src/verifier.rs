//! Signature verification against a registered wallet key.

use crypto_utils::{recover_public_key, RecoverableSignature, PUBLIC_KEY_LEN};
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::registry::{WalletRecord, WalletSeed};

/// Authorization material accompanying every wallet call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationProof {
    pub recovery_id: u8,
    /// `r ‖ s`, low-s.
    pub compact_signature: [u8; 64],
    pub claimed_public_key: [u8; PUBLIC_KEY_LEN],
    pub seed: WalletSeed,
}

impl AuthorizationProof {
    pub fn new(
        signature: RecoverableSignature,
        claimed_public_key: [u8; PUBLIC_KEY_LEN],
        seed: WalletSeed,
    ) -> Self {
        Self {
            recovery_id: signature.recovery_id,
            compact_signature: signature.compact,
            claimed_public_key,
            seed,
        }
    }

    /// Recover the key that signed `message_hash`.
    ///
    /// Every failure folds into [`RelayError::AuthenticationFailed`].
    pub fn recover(
        &self,
        message_hash: &[u8; 32],
    ) -> Result<[u8; PUBLIC_KEY_LEN], RelayError> {
        recover_public_key(message_hash, &self.compact_signature, self.recovery_id).map_err(|e| {
            warn!(seed = ?self.seed, "signature recovery failed: {e}");
            RelayError::AuthenticationFailed
        })
    }

    /// Recover the signer and require it to be the key the caller claims.
    pub fn recover_claimed(
        &self,
        message_hash: &[u8; 32],
    ) -> Result<[u8; PUBLIC_KEY_LEN], RelayError> {
        let recovered = self.recover(message_hash)?;
        if recovered != self.claimed_public_key {
            warn!(seed = ?self.seed, "recovered key differs from claimed key");
            return Err(RelayError::AuthenticationFailed);
        }
        Ok(recovered)
    }
}

/// Resolve the key `proof` binds at registration.
///
/// Under the `simulation` feature an unverifiable proof yields its claimed key.
pub fn authenticate_key(
    proof: &AuthorizationProof,
    message_hash: &[u8; 32],
) -> Result<[u8; PUBLIC_KEY_LEN], RelayError> {
    match proof.recover_claimed(message_hash) {
        Err(_) if cfg!(feature = "simulation") => {
            debug!(seed = ?proof.seed, "simulation: accepting unverified registration");
            Ok(proof.claimed_public_key)
        }
        outcome => outcome,
    }
}

/// Check that `proof` authorizes `message_hash` for `record`.
///
/// The `simulation` feature still performs recovery but accepts any outcome,
/// so a transaction can be priced before the key holder signs it. Never
/// enable it in a deployed build.
pub fn verify(
    proof: &AuthorizationProof,
    message_hash: &[u8; 32],
    record: &WalletRecord,
) -> Result<(), RelayError> {
    let outcome = check(proof, message_hash, record);
    if outcome.is_err() && cfg!(feature = "simulation") {
        debug!(wallet = %record.address, "simulation: accepting unverified proof");
        return Ok(());
    }
    outcome
}

fn check(
    proof: &AuthorizationProof,
    message_hash: &[u8; 32],
    record: &WalletRecord,
) -> Result<(), RelayError> {
    if proof.claimed_public_key != record.verification_key {
        warn!(wallet = %record.address, "claimed key is not the wallet key");
        return Err(RelayError::AuthenticationFailed);
    }
    proof.recover_claimed(message_hash)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_utils::{keccak256, Secp256k1Signer};
    use host_ledger::Address;

    fn setup() -> (Secp256k1Signer, WalletRecord, [u8; 32], AuthorizationProof) {
        let signer = Secp256k1Signer::random();
        let seed = WalletSeed::from_public_key(&signer.public_key());
        let record = WalletRecord {
            seed,
            verification_key: signer.public_key(),
            address: Address::new_unique(),
            bump: 255,
        };
        let hash = keccak256(b"an authorized action");
        let sig = signer.sign_prehash(&hash).unwrap();
        let proof = AuthorizationProof::new(sig, signer.public_key(), seed);
        (signer, record, hash, proof)
    }

    #[test]
    fn valid_proof_verifies() {
        let (_, record, hash, proof) = setup();
        assert_eq!(verify(&proof, &hash, &record), Ok(()));
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn every_signature_bit_matters() {
        let (_, record, hash, proof) = setup();
        for byte in 0..64 {
            for bit in [0x01, 0x80] {
                let mut tampered = proof.clone();
                tampered.compact_signature[byte] ^= bit;
                assert_eq!(
                    verify(&tampered, &hash, &record),
                    Err(RelayError::AuthenticationFailed),
                    "byte {byte} bit {bit:#x}"
                );
            }
        }
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn wrong_recovery_id_fails() {
        let (_, record, hash, proof) = setup();
        for id in 0..=4u8 {
            if id == proof.recovery_id {
                continue;
            }
            let mut tampered = proof.clone();
            tampered.recovery_id = id;
            assert_eq!(
                verify(&tampered, &hash, &record),
                Err(RelayError::AuthenticationFailed)
            );
        }
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn tampered_hash_fails() {
        let (_, record, mut hash, proof) = setup();
        hash[31] ^= 1;
        assert_eq!(verify(&proof, &hash, &record), Err(RelayError::AuthenticationFailed));
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn other_wallet_key_fails() {
        let (_, mut record, hash, proof) = setup();
        record.verification_key = Secp256k1Signer::random().public_key();
        assert_eq!(verify(&proof, &hash, &record), Err(RelayError::AuthenticationFailed));
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn signature_by_another_key_fails() {
        let (_, record, hash, mut proof) = setup();
        let intruder = Secp256k1Signer::random();
        let sig = intruder.sign_prehash(&hash).unwrap();
        proof.recovery_id = sig.recovery_id;
        proof.compact_signature = sig.compact;
        assert_eq!(verify(&proof, &hash, &record), Err(RelayError::AuthenticationFailed));
    }

    #[test]
    #[cfg(not(feature = "simulation"))]
    fn registration_key_must_be_proven() {
        let (_, _, hash, mut proof) = setup();
        proof.claimed_public_key = Secp256k1Signer::random().public_key();
        assert_eq!(
            authenticate_key(&proof, &hash),
            Err(RelayError::AuthenticationFailed)
        );
    }

    #[test]
    #[cfg(feature = "simulation")]
    fn simulation_accepts_unsigned_proofs() {
        let (_, record, hash, mut proof) = setup();
        proof.compact_signature = [0u8; 64];
        assert_eq!(verify(&proof, &hash, &record), Ok(()));

        let claimed = Secp256k1Signer::random().public_key();
        proof.claimed_public_key = claimed;
        assert_eq!(authenticate_key(&proof, &hash), Ok(claimed));
    }
}
