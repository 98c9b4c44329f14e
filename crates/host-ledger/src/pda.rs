//! Program-derived addresses.
//!
//! A PDA is `SHA-256(seed_0 || ... || seed_n || program_id || "ProgramDerivedAddress")`
//! constrained to fall OFF the Ed25519 curve, so no private key can exist for
//! it. Only the owning program can assert its authority, by presenting the
//! seeds to the host.

use sha2::{Digest, Sha256};

use crate::address::Address;
use crate::error::LedgerError;

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Maximum number of seeds, bump included.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed.
pub const MAX_SEED_LEN: usize = 32;

/// Find a valid PDA for the given seeds and program.
///
/// Iterates bump seeds from 255 down to 0, appending the bump as a final
/// one-byte seed, and returns the first result that is NOT a valid Ed25519
/// point.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<(Address, u8), LedgerError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(LedgerError::InvalidSeeds(format!(
            "at most {} seeds leave room for the bump, got {}",
            MAX_SEEDS - 1,
            seeds.len()
        )));
    }

    for bump in (0u8..=255).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        with_bump.extend_from_slice(seeds);
        with_bump.push(&bump_seed);

        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(LedgerError::OnCurve) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(LedgerError::InvalidSeeds(
        "could not find valid PDA bump seed".into(),
    ))
}

/// Create a PDA from the exact seeds given (bump included, if any).
///
/// Fails with [`LedgerError::OnCurve`] when the hash is a valid Ed25519 point.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<Address, LedgerError> {
    if seeds.len() > MAX_SEEDS {
        return Err(LedgerError::InvalidSeeds(format!(
            "at most {MAX_SEEDS} seeds, got {}",
            seeds.len()
        )));
    }
    if let Some(long) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(LedgerError::InvalidSeeds(format!(
            "seed of {} bytes exceeds {MAX_SEED_LEN}",
            long.len()
        )));
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(LedgerError::OnCurve);
    }

    Ok(Address(hash))
}

/// Check if 32 bytes represent a valid Ed25519 curve point.
///
/// Uses `curve25519-dalek` to attempt decompression. If it succeeds, the
/// point is on the curve.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

    fn program() -> Address {
        ASSOCIATED_TOKEN_PROGRAM.parse().unwrap()
    }

    #[test]
    fn pda_is_not_on_curve() {
        let (pda, _bump) = find_program_address(&[b"wallet", &[0xAA; 32]], &program()).unwrap();
        assert!(!is_on_curve(pda.as_bytes()), "PDA must NOT be on the Ed25519 curve");
    }

    #[test]
    fn pda_derivation_is_deterministic() {
        let a = find_program_address(&[b"wallet", &[0x11; 32]], &program()).unwrap();
        let b = find_program_address(&[b"wallet", &[0x11; 32]], &program()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn found_bump_recreates_address() {
        let seed = [0x22u8; 32];
        let (pda, bump) = find_program_address(&[b"wallet", &seed], &program()).unwrap();
        let again = create_program_address(&[b"wallet", &seed, &[bump]], &program()).unwrap();
        assert_eq!(pda, again);
    }

    #[test]
    fn different_seeds_give_different_addresses() {
        let (a, _) = find_program_address(&[b"wallet", &[0x01]], &program()).unwrap();
        let (b, _) = find_program_address(&[b"wallet", &[0x02]], &program()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn different_programs_give_different_addresses() {
        let other = Address::new([0x07; 32]);
        let (a, _) = find_program_address(&[b"wallet", &[0x01]], &program()).unwrap();
        let (b, _) = find_program_address(&[b"wallet", &[0x01]], &other).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn seed_longer_than_32_bytes_rejected() {
        let long = [0u8; 33];
        let result = create_program_address(&[&long], &program());
        assert!(matches!(result, Err(LedgerError::InvalidSeeds(_))));
    }

    #[test]
    fn too_many_seeds_rejected() {
        let seed: &[u8] = b"s";
        let seeds = vec![seed; MAX_SEEDS];
        assert!(find_program_address(&seeds, &program()).is_err());
    }

    #[test]
    fn is_on_curve_accepts_basepoint() {
        // The Ed25519 basepoint (compressed form).
        let basepoint: [u8; 32] = [
            0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
            0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
            0x66, 0x66, 0x66, 0x66,
        ];
        assert!(is_on_curve(&basepoint));
    }

    #[test]
    fn is_on_curve_rejects_off_curve_bytes() {
        // y = 0x0202...02 has no matching x on the curve.
        assert!(!is_on_curve(&[0x02; 32]));
    }
}
