//! Off-ledger helpers for the wallet key holder and the relay submitter.

use crypto_utils::Secp256k1Signer;
use host_ledger::Address;

use crate::codec::ActionEnvelope;
use crate::error::RelayError;
use crate::registry::{self, WalletSeed};
use crate::verifier::AuthorizationProof;

/// Sign `envelope` for the wallet registered under `seed`.
pub fn sign_envelope(
    signer: &Secp256k1Signer,
    seed: WalletSeed,
    envelope: &ActionEnvelope,
) -> Result<AuthorizationProof, RelayError> {
    let hash = envelope.message_hash()?;
    sign_hash(signer, seed, &hash)
}

/// Sign the registration message for `seed`.
pub fn sign_seed(
    signer: &Secp256k1Signer,
    seed: WalletSeed,
) -> Result<AuthorizationProof, RelayError> {
    sign_hash(signer, seed, &seed.message_hash())
}

/// The address `seed`'s wallet has under `program_id`.
pub fn wallet_address(program_id: &Address, seed: &WalletSeed) -> Result<Address, RelayError> {
    registry::wallet_address(program_id, seed).map(|(address, _)| address)
}

fn sign_hash(
    signer: &Secp256k1Signer,
    seed: WalletSeed,
    hash: &[u8; 32],
) -> Result<AuthorizationProof, RelayError> {
    let signature = signer
        .sign_prehash(hash)
        .map_err(|e| RelayError::InvalidInput(e.to_string()))?;
    Ok(AuthorizationProof::new(signature, signer.public_key(), seed))
}
