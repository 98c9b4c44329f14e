//! Delegated signing authority.
//!
//! A program-derived address has no private key. Its owning program asserts
//! the address's signature by handing the host a [`DelegatedAuthority`]: the
//! seeds and bump the address was derived from. The host re-derives the
//! address under the *calling* program's id, so a token minted by one program
//! is worthless to another.

use crate::address::Address;
use crate::error::LedgerError;
use crate::pda::create_program_address;

/// Capability to sign as `address` during one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedAuthority {
    address: Address,
    seeds: Vec<Vec<u8>>,
    bump: u8,
}

impl DelegatedAuthority {
    pub fn new(address: Address, seeds: Vec<Vec<u8>>, bump: u8) -> Self {
        Self {
            address,
            seeds,
            bump,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Confirm the token derives `address` under `caller`.
    pub fn verify(&self, caller: &Address) -> Result<(), LedgerError> {
        let bump = [self.bump];
        let mut seeds: Vec<&[u8]> = self.seeds.iter().map(Vec::as_slice).collect();
        seeds.push(&bump);

        match create_program_address(&seeds, caller) {
            Ok(derived) if derived == self.address => Ok(()),
            _ => Err(LedgerError::InvalidDelegation(self.address)),
        }
    }
}
